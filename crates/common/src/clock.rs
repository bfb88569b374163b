//! Clock and tick pacing for simulated playback.
//!
//! The playback core itself is purely notification-driven. These helpers
//! exist for drivers that need to push time into a source, such as the
//! CLI simulator advancing an in-memory video source.

use std::time::Instant;

/// A monotonic clock anchored at the moment a playback session began.
#[derive(Debug, Clone)]
pub struct PlaybackClock {
    epoch: Instant,

    /// Wall-clock time at epoch (RFC 3339 string).
    epoch_wall: String,
}

impl PlaybackClock {
    /// Create a new clock anchored to now.
    pub fn start() -> Self {
        Self {
            epoch: Instant::now(),
            epoch_wall: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Milliseconds elapsed since the clock started.
    pub fn elapsed_ms(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64() * 1000.0
    }

    /// Wall-clock time at start.
    pub fn epoch_wall(&self) -> &str {
        &self.epoch_wall
    }
}

/// Fixed-rate tick gate used to pace simulated playback.
#[derive(Debug)]
pub struct TickPacer {
    interval_ms: f64,
    last_tick_ms: Option<f64>,
}

impl TickPacer {
    /// Create a pacer targeting the given Hz rate. Zero is treated as 1 Hz.
    pub fn new(target_hz: u32) -> Self {
        Self {
            interval_ms: 1000.0 / target_hz.max(1) as f64,
            last_tick_ms: None,
        }
    }

    /// Returns true and records the tick if a full interval has passed.
    /// The first call always returns true.
    pub fn should_tick(&mut self, now_ms: f64) -> bool {
        match self.last_tick_ms {
            None => {
                self.last_tick_ms = Some(now_ms);
                true
            }
            Some(last) if now_ms >= last + self.interval_ms => {
                self.last_tick_ms = Some(now_ms);
                true
            }
            _ => false,
        }
    }

    /// Tick interval in milliseconds.
    pub fn interval_ms(&self) -> f64 {
        self.interval_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clock_elapsed() {
        let clock = PlaybackClock::start();
        assert!(clock.elapsed_ms() < 1000.0);
        assert!(!clock.epoch_wall().is_empty());
    }

    #[test]
    fn test_tick_pacer() {
        let mut pacer = TickPacer::new(60);
        assert!(pacer.should_tick(0.0));
        assert!(!pacer.should_tick(1.0));
        assert!(pacer.should_tick(17.0));
        assert!((pacer.interval_ms() - 1000.0 / 60.0).abs() < 1e-9);
    }

    #[test]
    fn test_tick_pacer_zero_hz() {
        let pacer = TickPacer::new(0);
        assert!((pacer.interval_ms() - 1000.0).abs() < 1e-9);
    }
}
