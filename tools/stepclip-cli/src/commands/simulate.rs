//! Drive a playback controller over an in-memory source.

use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use stepclip_common::clock::{PlaybackClock, TickPacer};
use stepclip_common::config::AppConfig;
use stepclip_playback_core::{
    MemoryVideoSource, PlaybackController, PlaybackEvent, PlaybackState,
};

use crate::script::{parse_script, Action};
use crate::ClipArgs;

struct Session {
    source: Arc<MemoryVideoSource>,
    controller: PlaybackController,
    events: Receiver<PlaybackEvent>,
    json: bool,
}

#[derive(Serialize)]
struct EventLine<'a> {
    action: &'a str,
    event: PlaybackEvent,
}

#[derive(Serialize)]
struct Summary {
    state: PlaybackState,
    step_number: i64,
    frame_number: i64,
    time_ms: f64,
    playing: bool,
    mean_frame_duration_ms: f64,
}

pub async fn run(
    args: ClipArgs,
    script: String,
    json: bool,
    realtime: bool,
    config: &AppConfig,
) -> anyhow::Result<()> {
    let actions = parse_script(&script)?;
    let clip = args.clip()?;
    let source = Arc::new(args.source()?);
    source.set_play_range(clip.start_frame(), clip.end_frame());

    let mut controller = PlaybackController::with_defaults(clip, source.clone(), &config.playback)
        .map_err(|e| anyhow::anyhow!("Failed to bind clip: {e}"))?;
    let (_, events) = controller.subscribe_channel();

    let mut session = Session {
        source,
        controller,
        events,
        json,
    };
    session.settle("bind");

    if !json {
        let clock = PlaybackClock::start();
        println!("Simulation started at {}", clock.epoch_wall());
        println!(
            "  Clip: start={} stride={} steps={}",
            clip.start_frame(),
            clip.stride(),
            clip.step_count()
        );
        println!("  Actions: {}", actions.len());
    }

    for action in actions {
        let label = action.to_string();
        tracing::debug!(action = %label, "applying");
        if !json {
            println!("> {label}");
        }
        match action {
            Action::Step => session.controller.step(),
            Action::Back => session.controller.back(),
            Action::Stop => session.controller.stop(),
            Action::Goto(n) => session.controller.set_step_number(n),
            Action::Rate(r) => session.controller.set_rate(r),
            Action::Looping(on) => session.controller.set_looping(on),
            Action::FrameDuration(ms) => session.controller.set_frame_duration(ms),
            Action::Play { ms } => {
                session.controller.play();
                session.settle(&label);
                if realtime {
                    session.play_realtime(&label, ms, config.playback.tick_hz).await;
                } else {
                    session.play_simulated(&label, ms, config.playback.tick_hz);
                }
            }
        }
        session.settle(&label);
    }

    session.print_summary()?;
    Ok(())
}

impl Session {
    fn settle(&mut self, action: &str) {
        self.source.settle();
        self.controller.poll_source_events();
        self.print_events(action);
    }

    fn play_simulated(&mut self, action: &str, ms: f64, tick_hz: u32) {
        let interval = TickPacer::new(tick_hz).interval_ms();
        let mut elapsed = 0.0;
        while elapsed < ms && self.controller.is_playing() {
            let dt = interval.min(ms - elapsed);
            self.tick(action, dt);
            elapsed += dt;
        }
    }

    async fn play_realtime(&mut self, action: &str, ms: f64, tick_hz: u32) {
        let clock = PlaybackClock::start();
        let mut pacer = TickPacer::new(tick_hz);
        let mut last = 0.0;
        loop {
            let now = clock.elapsed_ms().min(ms);
            if pacer.should_tick(now) || now >= ms {
                self.tick(action, now - last);
                last = now;
            }
            if now >= ms || !self.controller.is_playing() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    }

    fn tick(&mut self, action: &str, elapsed_ms: f64) {
        self.source.advance(elapsed_ms);
        self.controller.poll_source_events();
        self.print_events(action);
    }

    fn print_events(&self, action: &str) {
        for event in self.events.try_iter() {
            if self.json {
                match serde_json::to_string(&EventLine { action, event }) {
                    Ok(line) => println!("{line}"),
                    Err(e) => tracing::warn!("Failed to encode event: {e}"),
                }
            } else {
                println!("  {}", describe(&event));
            }
        }
    }

    fn print_summary(&self) -> anyhow::Result<()> {
        let c = &self.controller;
        let summary = Summary {
            state: c.snapshot(),
            step_number: c.step_number(),
            frame_number: c.frame_number(),
            time_ms: c.time_ms(),
            playing: c.is_playing(),
            mean_frame_duration_ms: c.mean_frame_duration_ms(),
        };

        if self.json {
            println!("{}", serde_json::to_string(&summary)?);
            return Ok(());
        }

        println!();
        println!("Final state:");
        println!("  Step: {} (frame {})", summary.step_number, summary.frame_number);
        println!("  Time: {:.3} ms", summary.time_ms);
        println!("  Playing: {}", summary.playing);
        println!("  Looping: {}", summary.state.looping);
        println!("  Rate: {}", summary.state.rate);
        println!("  Time stretch: {:.6}", summary.state.time_stretch);
        println!(
            "  Mean frame duration: {:.3} ms",
            summary.mean_frame_duration_ms
        );
        Ok(())
    }
}

fn describe(event: &PlaybackEvent) -> String {
    match event {
        PlaybackEvent::StepNumberChanged { old, new } => {
            format!("[{}] {old} -> {new}", event.name())
        }
        PlaybackEvent::FrameDurationChanged { old, new } => {
            format!("[{}] {old:.3} ms -> {new:.3} ms", event.name())
        }
        PlaybackEvent::RateChanged { old, new } => format!("[{}] {old} -> {new}", event.name()),
        PlaybackEvent::PlayingChanged { playing } => format!("[{}] {playing}", event.name()),
        PlaybackEvent::LoopingChanged { looping } => format!("[{}] {looping}", event.name()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe_step_change() {
        let event = PlaybackEvent::StepNumberChanged { old: 1, new: 2 };
        assert_eq!(describe(&event), "[step_number_changed] 1 -> 2");
    }
}
