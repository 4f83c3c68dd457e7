use anyhow::Result;
use clap::Parser;
use tracing::{error, info, Level};

use noise_visualizer::{cli::Cli, Config, NoiseVisualizer};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    tracing_subscriber::fmt()
        .with_max_level(log_level)
        .init();

    info!("Starting noise-visualizer v{}", env!("CARGO_PKG_VERSION"));
    info!("Song: {:?}", cli.song);
    info!("Output: {:?}", cli.output);
    info!("Seed: {}", cli.seed);

    // Load configuration
    let config = match &cli.config {
        Some(config_path) => {
            info!("Loading configuration from {:?}", config_path);
            Config::from_file(config_path)?
        }
        None => {
            info!("Using default configuration");
            Config::default()
        }
    };

    let params = cli.run_params(config.prompt.method);
    let mut visualizer = NoiseVisualizer::new(config, cli.seed)?;

    match visualizer.run(&params).await {
        Ok(video) => {
            info!(
                "Done! {} frames ({:.1}s) saved to {:?}",
                video.frame_count, video.duration, video.path
            );
            Ok(())
        }
        Err(e) => {
            error!("{}", e.user_message());
            Err(e.into())
        }
    }
}
