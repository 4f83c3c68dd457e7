use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::{
    audio::{AudioLoader, SpectralAnalyzer, SpectralFrames},
    config::Config,
    error::{Result, VisualizerError},
    latent::LatentTrajectory,
    prompt::{HashingEncoder, PromptEncoder, PromptParams, PromptSchedule},
    render::{FrameGenerator, LatentPreviewGenerator, Renderer},
    video::{EncodedVideo, VideoCompositor, VideoParams},
};

pub const DEFAULT_SEED: u64 = 133780085;
pub const DEFAULT_HOP_LENGTH: usize = 377;
pub const DEFAULT_DISTANCE: f32 = 0.3;
pub const DEFAULT_BASE_PROMPT: &str = "An octopus dancing with cigarettes";
pub const DEFAULT_TARGET_PROMPTS: [&str; 12] = [
    "what the dog doin.",
    "giant centipede.",
    "demon scary blood ",
    "man in a suit with juice",
    "massive hamburger yummmm",
    "“broooo thers a beautiful chair",
    "hairy toes hospital",
    "car leaking water flooded",
    "mirror beautiful woman",
    "stop the cap now with a large coffee",
    "turkish rug in a room",
    "horse",
];

/// Everything one end-to-end run needs
#[derive(Debug, Clone)]
pub struct RunParams {
    pub song: PathBuf,
    pub output: PathBuf,
    pub hop_length: usize,
    pub distance: f32,
    pub base_prompt: String,
    pub target_prompts: Vec<String>,
    pub guidance_scale: f32,
    pub prompt: PromptParams,
    pub keep_frames: bool,
}

impl RunParams {
    pub fn new<P: Into<PathBuf>, Q: Into<PathBuf>>(song: P, output: Q) -> Self {
        Self {
            song: song.into(),
            output: output.into(),
            hop_length: DEFAULT_HOP_LENGTH,
            distance: DEFAULT_DISTANCE,
            base_prompt: DEFAULT_BASE_PROMPT.to_string(),
            target_prompts: DEFAULT_TARGET_PROMPTS.iter().map(|s| s.to_string()).collect(),
            guidance_scale: 0.0,
            prompt: PromptParams::default(),
            keep_frames: false,
        }
    }
}

struct LoadedSong {
    path: PathBuf,
    spectral: SpectralFrames,
}

/// Drives the song-to-video pipeline.
///
/// The steps run in a fixed order, each consuming the previous one's output:
/// 1. [`load_song`](Self::load_song) - decode and analyse the audio
/// 2. [`spec_circle_latents`](Self::spec_circle_latents) - latent walk paced by the spectrum
/// 3. [`fps`](Self::fps) - frame rate implied by the hop length
/// 4. [`prompt_embeds`](Self::prompt_embeds) - chroma-steered prompt blend
/// 5. [`visuals`](Self::visuals) - render every frame
/// 6. [`create_mp4`](Self::create_mp4) - mux frames with the song
pub struct NoiseVisualizer {
    config: Config,
    seed: u64,
    encoder: Box<dyn PromptEncoder>,
    generator: Box<dyn FrameGenerator>,
    song: Option<LoadedSong>,
}

impl NoiseVisualizer {
    pub fn new(config: Config, seed: u64) -> Result<Self> {
        config.validate()?;
        let encoder = Box::new(HashingEncoder::new(&config.prompt));
        let generator = Box::new(LatentPreviewGenerator::new(config.render.scale));

        Ok(Self {
            config,
            seed,
            encoder,
            generator,
            song: None,
        })
    }

    /// Swap in a different prompt encoder
    pub fn with_encoder(mut self, encoder: Box<dyn PromptEncoder>) -> Self {
        self.encoder = encoder;
        self
    }

    /// Swap in a different frame generator
    pub fn with_generator(mut self, generator: Box<dyn FrameGenerator>) -> Self {
        self.generator = generator;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    // ==========================================
    // STEP 1: SONG
    // ==========================================

    /// Decode the song and split it into one spectral frame per hop
    pub async fn load_song<P: AsRef<Path>>(&mut self, path: P, hop_length: usize) -> Result<&SpectralFrames> {
        let path = path.as_ref();
        info!("🎵 Loading song {:?}", path);

        let audio = AudioLoader::load(path).await?;
        info!(
            "   Loaded: {:.1}s, {} Hz, {} channel(s)",
            audio.duration, audio.sample_rate, audio.channels
        );

        let spectral = SpectralAnalyzer::new(self.config.audio.clone()).analyze(&audio, hop_length)?;
        info!("   {} frames at {:.3} fps", spectral.len(), spectral.fps());

        let song = self.song.insert(LoadedSong {
            path: path.to_path_buf(),
            spectral,
        });
        Ok(&song.spectral)
    }

    fn loaded(&self, step: &str) -> Result<&LoadedSong> {
        self.song
            .as_ref()
            .ok_or_else(|| VisualizerError::not_ready(step, "a loaded song"))
    }

    // ==========================================
    // STEP 2: LATENTS
    // ==========================================

    /// Walk the latent circle, one step per spectral frame
    pub fn spec_circle_latents(&self, distance: f32) -> Result<LatentTrajectory> {
        let song = self.loaded("spec_circle_latents")?;
        info!("🌀 Walking latent space (distance {:.2})", distance);
        LatentTrajectory::new(&song.spectral, &self.config.latent, self.seed, distance)
    }

    // ==========================================
    // STEP 3: FRAME RATE
    // ==========================================

    pub fn fps(&self) -> Result<f64> {
        Ok(self.loaded("fps")?.spectral.fps())
    }

    // ==========================================
    // STEP 4: PROMPTS
    // ==========================================

    /// Encode the prompts and schedule their blend against the song's chroma
    pub fn prompt_embeds<S: AsRef<str>>(
        &self,
        base_prompt: &str,
        target_prompts: &[S],
        params: PromptParams,
    ) -> Result<PromptSchedule> {
        let song = self.loaded("prompt_embeds")?;
        info!(
            "💬 Encoding {} target prompt(s) with the {} encoder",
            target_prompts.len(),
            self.encoder.name()
        );

        let base = self.encoder.encode(base_prompt)?;
        debug!("   base: {:?}", base_prompt);
        let targets = target_prompts
            .iter()
            .map(|p| {
                debug!("   target: {:?}", p.as_ref());
                self.encoder.encode(p.as_ref())
            })
            .collect::<Result<Vec<_>>>()?;

        PromptSchedule::build(base, targets, &song.spectral, params)
    }

    // ==========================================
    // STEP 5: FRAMES
    // ==========================================

    /// Render every frame and hand it to the compositor's frame directory
    pub fn visuals(
        &self,
        latents: &LatentTrajectory,
        prompts: &PromptSchedule,
        guidance_scale: f32,
        compositor: &mut VideoCompositor,
    ) -> Result<usize> {
        info!(
            "🎨 Rendering frames with {} (guidance scale {:.2})",
            self.generator.name(),
            guidance_scale
        );

        let renderer = Renderer::new(
            self.generator.as_ref(),
            self.config.render.batch_size,
            self.config.render.threads,
        )
        .map_err(|e| {
            warn!("Could not start renderer: {}", e);
            e
        })?;

        renderer.render(latents, prompts, guidance_scale, |start, frames| {
            compositor.write_frames(start, &frames)
        })
    }

    // ==========================================
    // STEP 6: OUTPUT
    // ==========================================

    /// Mux the rendered frames with the loaded song
    pub async fn create_mp4<P: AsRef<Path>>(&self, compositor: &mut VideoCompositor, output: P) -> Result<EncodedVideo> {
        let song = self.loaded("create_mp4")?;
        info!("📼 Writing {:?}", output.as_ref());
        compositor.compose(&song.path, output).await
    }

    pub fn video_params(&self) -> Result<VideoParams> {
        Ok(VideoParams {
            fps: self.fps()?,
            codec: self.config.video.codec.clone(),
            quality: self.config.video.quality,
        })
    }

    /// Run every step in order
    pub async fn run(&mut self, params: &RunParams) -> Result<EncodedVideo> {
        self.load_song(&params.song, params.hop_length).await?;

        let latents = self.spec_circle_latents(params.distance)?;
        let fps = self.fps()?;
        let prompts = self.prompt_embeds(&params.base_prompt, params.target_prompts.as_slice(), params.prompt)?;

        println!("{}", latents.shape());

        let mut compositor = VideoCompositor::new(self.video_params()?).keep_frames(params.keep_frames);
        let frames = self.visuals(&latents, &prompts, params.guidance_scale, &mut compositor)?;
        debug!("{} frames ready for {:.3} fps encode", frames, fps);

        self.create_mp4(&mut compositor, &params.output).await
    }
}
