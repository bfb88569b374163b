//! Print the step/frame/time table of a clip.

use std::sync::Arc;

use stepclip_common::config::AppConfig;
use stepclip_playback_core::{PlaybackController, VideoSource};

use crate::ClipArgs;

pub fn run(args: ClipArgs, frame_duration: Option<f64>, config: &AppConfig) -> anyhow::Result<()> {
    let clip = args.clip()?;
    let source = Arc::new(args.source()?);
    let mut controller = PlaybackController::with_defaults(clip, source.clone(), &config.playback)
        .map_err(|e| anyhow::anyhow!("Failed to bind clip: {e}"))?;
    if let Some(ms) = frame_duration {
        controller.set_frame_duration(ms);
    }

    println!(
        "Source: {} frames @ {}fps ({:.1} ms)",
        source.frame_count(),
        args.fps,
        source.total_duration_ms()
    );
    println!(
        "Clip: start={} stride={} steps={} (frames {}..={})",
        clip.start_frame(),
        clip.stride(),
        clip.step_count(),
        clip.start_frame(),
        clip.end_frame()
    );
    println!("  Time stretch: {:.6}", controller.time_stretch());
    println!(
        "  Mean frame duration: {:.3} ms",
        controller.mean_frame_duration_ms()
    );
    println!();

    println!("{:>6}  {:>7}  {:>12}  {:>12}", "step", "frame", "native ms", "clip ms");
    let mapping = controller.mapping();
    for step in 0..clip.step_count() {
        let frame = mapping.frame_of(step);
        let native = source.frame_timestamp_ms(frame).unwrap_or(0.0);
        println!(
            "{:>6}  {:>7}  {:>12.3}  {:>12.3}",
            step,
            frame,
            native,
            controller.step_time_ms(step)
        );
    }

    Ok(())
}
