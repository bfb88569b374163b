//! Stepclip Playback Core
//!
//! Transport control for a strided clip over an external video source:
//! - **Source:** the `VideoSource` contract and its ordered notification channel
//! - **Controller:** step/frame state machine with play, stop, step, rate and loop
//! - **Notifier:** ordered delivery of playback events to subscribers
//! - **Memory source:** an in-process source with deferred command completion
//!
//! Source commands are fire-and-forget. Their effects are observed later
//! through `SourceEvent`s, which the controller reconciles in
//! `PlaybackController::poll_source_events`.

pub mod controller;
pub mod event;
pub mod memory_source;
pub mod notifier;
pub mod source;

pub use controller::*;
pub use event::*;
pub use memory_source::*;
pub use notifier::*;
pub use source::*;
