//! Clip parameters.

use serde::Serialize;
use stepclip_common::error::{StepclipError, StepclipResult};

use crate::mapping::ClipMapping;

/// Frame number on the native video timeline. Signed because a source may
/// transiently report negative values before it is ready.
pub type FrameNumber = i64;

/// Logical step index within a clip.
pub type StepNumber = i64;

/// A strided, offset subsequence of a video's frames.
///
/// Step `s` addresses frame `start_frame + s * stride`. Values are checked
/// once in [`ClipParameters::new`] and are immutable afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ClipParameters {
    start_frame: FrameNumber,
    stride: i64,
    step_count: i64,
}

impl ClipParameters {
    /// Create validated clip parameters.
    pub fn new(start_frame: FrameNumber, stride: i64, step_count: i64) -> StepclipResult<Self> {
        if start_frame < 0 {
            return Err(StepclipError::invalid_parameter(format!(
                "start frame must be >= 0, got {start_frame}"
            )));
        }
        if stride < 1 {
            return Err(StepclipError::invalid_parameter(format!(
                "stride must be >= 1, got {stride}"
            )));
        }
        if step_count < 1 {
            return Err(StepclipError::invalid_parameter(format!(
                "step count must be >= 1, got {step_count}"
            )));
        }
        if (step_count - 1)
            .checked_mul(stride)
            .and_then(|span| span.checked_add(start_frame))
            .is_none()
        {
            return Err(StepclipError::invalid_parameter(
                "clip end frame overflows the frame number range",
            ));
        }
        Ok(Self {
            start_frame,
            stride,
            step_count,
        })
    }

    /// Build the largest clip with the given start and stride that fits a
    /// source of `frame_count` frames.
    pub fn spanning(
        start_frame: FrameNumber,
        stride: i64,
        frame_count: usize,
    ) -> StepclipResult<Self> {
        let available = frame_count as i64 - start_frame;
        if available < 1 {
            return Err(StepclipError::invalid_parameter(format!(
                "start frame {start_frame} is beyond a source of {frame_count} frames"
            )));
        }
        if stride < 1 {
            return Err(StepclipError::invalid_parameter(format!(
                "stride must be >= 1, got {stride}"
            )));
        }
        Self::new(start_frame, stride, (available - 1) / stride + 1)
    }

    pub fn start_frame(&self) -> FrameNumber {
        self.start_frame
    }

    pub fn stride(&self) -> i64 {
        self.stride
    }

    pub fn step_count(&self) -> i64 {
        self.step_count
    }

    /// Frame addressed by the last step.
    pub fn end_frame(&self) -> FrameNumber {
        self.start_frame + (self.step_count - 1) * self.stride
    }

    /// Step/frame mapping for these parameters.
    pub fn mapping(&self) -> ClipMapping {
        ClipMapping::new(self)
    }

    /// Check that every step addresses an existing frame of a source with
    /// `frame_count` frames.
    pub fn validate_against(&self, frame_count: usize) -> StepclipResult<()> {
        if self.end_frame() >= frame_count as i64 {
            return Err(StepclipError::invalid_parameter(format!(
                "clip end frame {} is beyond a source of {} frames",
                self.end_frame(),
                frame_count
            )));
        }
        Ok(())
    }
}
