//! Playback events published to controller subscribers.

use serde::{Deserialize, Serialize};
use stepclip_clip_model::StepNumber;

/// A change in observable playback state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlaybackEvent {
    /// The controller's step number changed.
    StepNumberChanged { old: StepNumber, new: StepNumber },

    /// The mean frame duration changed after a time-stretch calibration.
    FrameDurationChanged { old: f64, new: f64 },

    /// The source reported a new playback rate.
    RateChanged { old: f64, new: f64 },

    /// The source started or stopped playing.
    PlayingChanged { playing: bool },

    /// The source switched looping on or off.
    LoopingChanged { looping: bool },
}

impl PlaybackEvent {
    /// Stable event name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::StepNumberChanged { .. } => "step_number_changed",
            Self::FrameDurationChanged { .. } => "frame_duration_changed",
            Self::RateChanged { .. } => "rate_changed",
            Self::PlayingChanged { .. } => "playing_changed",
            Self::LoopingChanged { .. } => "looping_changed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_match_serde_tags() {
        let events = [
            PlaybackEvent::StepNumberChanged { old: 0, new: 1 },
            PlaybackEvent::FrameDurationChanged { old: 40.0, new: 50.0 },
            PlaybackEvent::RateChanged { old: 1.0, new: 2.0 },
            PlaybackEvent::PlayingChanged { playing: true },
            PlaybackEvent::LoopingChanged { looping: false },
        ];
        for event in events {
            let value = serde_json::to_value(event).unwrap();
            assert_eq!(value["type"], event.name());
        }
    }
}
