//! # Video Module
//!
//! Frame type plus the FFmpeg-backed compositor that turns numbered frames
//! and the source song into an MP4.

pub mod compositor;
pub mod types;

pub use compositor::{EncodedVideo, VideoCompositor};
pub use types::{Frame, VideoParams};
