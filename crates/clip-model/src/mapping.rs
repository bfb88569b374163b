//! Step <-> frame mapping.

use crate::clip::{ClipParameters, FrameNumber, StepNumber};

/// Pure mapping between clip steps and native frame numbers.
///
/// Neither direction clamps; use [`ClipMapping::clamp_step`] on the result
/// when a valid step is required.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClipMapping {
    start_frame: FrameNumber,
    stride: i64,
    step_count: i64,
}

impl ClipMapping {
    pub fn new(clip: &ClipParameters) -> Self {
        Self {
            start_frame: clip.start_frame(),
            stride: clip.stride(),
            step_count: clip.step_count(),
        }
    }

    /// Frame addressed by `step`, saturating at the `i64` range.
    pub fn frame_of(&self, step: StepNumber) -> FrameNumber {
        self.start_frame.saturating_add(step.saturating_mul(self.stride))
    }

    /// Step whose frame is the nearest at or before `frame`.
    ///
    /// Total over all integers: frames before the clip start map to
    /// negative steps, frames between steps floor to the earlier one.
    /// Steps beyond the `i64` range saturate.
    pub fn step_of(&self, frame: FrameNumber) -> StepNumber {
        let offset = i128::from(frame) - i128::from(self.start_frame);
        let step = offset.div_euclid(i128::from(self.stride));
        step.clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as StepNumber
    }

    /// Clamp a step into `[0, step_count)`.
    pub fn clamp_step(&self, step: StepNumber) -> StepNumber {
        step.clamp(0, self.step_count - 1)
    }

    /// `step_of` followed by `clamp_step`.
    pub fn clamped_step_of(&self, frame: FrameNumber) -> StepNumber {
        self.clamp_step(self.step_of(frame))
    }

    pub fn step_count(&self) -> i64 {
        self.step_count
    }

    pub fn start_frame(&self) -> FrameNumber {
        self.start_frame
    }

    pub fn end_frame(&self) -> FrameNumber {
        self.frame_of(self.step_count - 1)
    }
}
