//! Stepclip CLI: inspect clip timing and simulate transport control.
//!
//! Usage:
//!   stepclip inspect [CLIP OPTIONS]              Show the step/frame/time table
//!   stepclip simulate [CLIP OPTIONS] --script S  Drive a controller over an in-memory source
//!   stepclip config                              Show the resolved configuration

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use stepclip_clip_model::ClipParameters;
use stepclip_common::config::AppConfig;
use stepclip_playback_core::MemoryVideoSource;

mod commands;
mod script;

#[derive(Parser)]
#[command(
    name = "stepclip",
    about = "Strided clip timing and playback control over a video timeline",
    version,
    author
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Load configuration from this file instead of the standard location
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Clip and synthetic source description shared by subcommands.
#[derive(Args, Debug, Clone)]
pub struct ClipArgs {
    /// First frame of the clip
    #[arg(long, default_value = "0")]
    start: i64,

    /// Frames between consecutive steps
    #[arg(long, default_value = "1")]
    stride: i64,

    /// Number of steps; defaults to as many as fit the source
    #[arg(long)]
    steps: Option<i64>,

    /// Frames in the synthetic source
    #[arg(long, default_value = "100")]
    frames: usize,

    /// Frame rate of the synthetic source
    #[arg(long, default_value = "30")]
    fps: f64,
}

impl ClipArgs {
    pub fn clip(&self) -> anyhow::Result<ClipParameters> {
        let clip = match self.steps {
            Some(steps) => ClipParameters::new(self.start, self.stride, steps)?,
            None => ClipParameters::spanning(self.start, self.stride, self.frames)?,
        };
        Ok(clip)
    }

    pub fn source(&self) -> anyhow::Result<MemoryVideoSource> {
        if !(self.fps.is_finite() && self.fps > 0.0) {
            anyhow::bail!("--fps must be positive, got {}", self.fps);
        }
        Ok(MemoryVideoSource::with_frame_rate(self.frames, self.fps))
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Show the step -> frame -> time table for a clip
    Inspect {
        #[command(flatten)]
        clip: ClipArgs,

        /// Calibrate the mean step duration (ms) before printing
        #[arg(long)]
        frame_duration: Option<f64>,
    },

    /// Run a transport script against an in-memory source
    Simulate {
        #[command(flatten)]
        clip: ClipArgs,

        /// Comma-separated actions, e.g. "step,step,goto:4,rate:2,play:500,stop"
        #[arg(short, long)]
        script: String,

        /// Print events and the final state as JSON lines
        #[arg(long)]
        json: bool,

        /// Pace `play:MS` actions against the wall clock
        #[arg(long)]
        realtime: bool,
    },

    /// Show the resolved configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match cli.config.as_ref() {
        Some(path) => AppConfig::load_from(path)
            .map_err(|e| anyhow::anyhow!("Failed to load config {}: {e}", path.display()))?,
        None => AppConfig::load(),
    };

    // Initialize logging
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    stepclip_common::logging::init_logging(&config.logging);

    match cli.command {
        Commands::Inspect {
            clip,
            frame_duration,
        } => commands::inspect::run(clip, frame_duration, &config),
        Commands::Simulate {
            clip,
            script,
            json,
            realtime,
        } => commands::simulate::run(clip, script, json, realtime, &config).await,
        Commands::Config => commands::config::run(&config),
    }
}
