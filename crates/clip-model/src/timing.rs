//! Clip time model.
//!
//! Clip time is native elapsed time since the clip's start frame, scaled by
//! a calibratable time stretch:
//!
//! ```text
//! clip_time(frame) = (native(frame) - native(start_frame)) * time_stretch
//! ```

use serde::{Deserialize, Serialize};

use crate::clip::FrameNumber;

/// A frame number paired with its native timestamp, as reported by a
/// video source for a single query.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameSample {
    pub frame_number: FrameNumber,
    pub native_timestamp_ms: f64,
}

impl FrameSample {
    pub fn new(frame_number: FrameNumber, native_timestamp_ms: f64) -> Self {
        Self {
            frame_number,
            native_timestamp_ms,
        }
    }
}

/// Converts native timestamps into clip-relative time.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeModel {
    time_stretch: f64,
}

impl Default for TimeModel {
    fn default() -> Self {
        Self { time_stretch: 1.0 }
    }
}

impl TimeModel {
    /// Create a model with the given stretch. Non-finite or non-positive
    /// values fall back to 1.0.
    pub fn new(time_stretch: f64) -> Self {
        if time_stretch.is_finite() && time_stretch > 0.0 {
            Self { time_stretch }
        } else {
            Self::default()
        }
    }

    pub fn time_stretch(&self) -> f64 {
        self.time_stretch
    }

    /// Clip-relative time of `sample` given the clip start's sample.
    pub fn clip_time_ms(&self, sample: FrameSample, start: FrameSample) -> f64 {
        (sample.native_timestamp_ms - start.native_timestamp_ms) * self.time_stretch
    }

    /// Time stretch that makes the mean step duration over the clip equal
    /// `duration_ms`.
    ///
    /// Returns `None` when the calibration is degenerate: a single-step
    /// clip, a zero or negative native span, or a non-positive duration.
    pub fn calibrated_stretch(
        duration_ms: f64,
        step_count: i64,
        first: FrameSample,
        last: FrameSample,
    ) -> Option<f64> {
        if step_count < 2 || !duration_ms.is_finite() || duration_ms <= 0.0 {
            return None;
        }
        let span_ms = last.native_timestamp_ms - first.native_timestamp_ms;
        if !span_ms.is_finite() || span_ms <= 0.0 {
            return None;
        }
        let stretch = duration_ms * (step_count - 1) as f64 / span_ms;
        (stretch.is_finite() && stretch > 0.0).then_some(stretch)
    }

    /// Mean duration of one native frame within the clip, in clip time.
    ///
    /// Uses the clip's own span when it covers more than one frame and
    /// otherwise the source-wide average, so the result is always defined.
    pub fn mean_frame_duration_ms(
        &self,
        start: FrameSample,
        end: FrameSample,
        source_duration_ms: f64,
        source_frame_count: usize,
    ) -> f64 {
        let frame_span = end.frame_number - start.frame_number;
        if frame_span > 0 {
            return self.time_stretch * (end.native_timestamp_ms - start.native_timestamp_ms)
                / frame_span as f64;
        }
        if source_frame_count == 0 {
            return 0.0;
        }
        self.time_stretch * source_duration_ms / source_frame_count as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_stretch_falls_back() {
        assert_eq!(TimeModel::new(0.0).time_stretch(), 1.0);
        assert_eq!(TimeModel::new(-2.0).time_stretch(), 1.0);
        assert_eq!(TimeModel::new(f64::NAN).time_stretch(), 1.0);
        assert_eq!(TimeModel::new(0.5).time_stretch(), 0.5);
    }

    #[test]
    fn test_clip_time_subtracts_start_and_stretches() {
        let model = TimeModel::new(2.0);
        let start = FrameSample::new(10, 400.0);
        let sample = FrameSample::new(15, 600.0);
        assert!((model.clip_time_ms(sample, start) - 400.0).abs() < 1e-9);
        assert_eq!(model.clip_time_ms(start, start), 0.0);
    }

    #[test]
    fn test_calibration_matches_mean_duration() {
        let first = FrameSample::new(0, 0.0);
        let last = FrameSample::new(4, 1000.0);
        let stretch = TimeModel::calibrated_stretch(50.0, 5, first, last).unwrap();
        assert!((stretch - 0.2).abs() < 1e-12);

        let model = TimeModel::new(stretch);
        let mean = model.mean_frame_duration_ms(first, last, 1000.0, 5);
        assert!((mean - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_calibration_rejects_degenerate_input() {
        let first = FrameSample::new(0, 0.0);
        let last = FrameSample::new(4, 1000.0);
        assert!(TimeModel::calibrated_stretch(50.0, 1, first, last).is_none());
        assert!(TimeModel::calibrated_stretch(0.0, 5, first, last).is_none());
        assert!(TimeModel::calibrated_stretch(50.0, 5, first, first).is_none());
        assert!(TimeModel::calibrated_stretch(f64::INFINITY, 5, first, last).is_none());
    }

    #[test]
    fn test_mean_duration_falls_back_to_source_average() {
        let model = TimeModel::new(1.5);
        let only = FrameSample::new(3, 100.0);
        let mean = model.mean_frame_duration_ms(only, only, 2000.0, 50);
        assert!((mean - 60.0).abs() < 1e-9);
        assert_eq!(model.mean_frame_duration_ms(only, only, 2000.0, 0), 0.0);
    }
}
