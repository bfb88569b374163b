//! Stepclip Clip Model
//!
//! Defines the pure data contracts of a strided clip over a video source:
//! - **Clip:** start frame, stride, and step count, validated at construction
//! - **Mapping:** step numbers to frame numbers and back
//! - **Timing:** native frame timestamps to clip-relative elapsed time
//!
//! Nothing here talks to a video source; callers supply frame numbers and
//! timestamps.

pub mod clip;
pub mod mapping;
pub mod timing;

pub use clip::*;
pub use mapping::*;
pub use timing::*;
