//! Video source contract.

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

use serde::{Deserialize, Serialize};
use stepclip_clip_model::FrameNumber;

/// Notification emitted by a video source.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceEvent {
    /// The presented frame changed, either autonomously during playback or
    /// because a commanded seek completed.
    FrameNumberChanged { frame: FrameNumber },

    /// Playback rate changed.
    RateChanged { old: f64, new: f64 },

    /// Playback started or stopped.
    PlayingChanged { playing: bool },

    /// Looping was switched on or off.
    LoopingChanged { looping: bool },

    /// The source (re)loaded its media; frame bookkeeping must be redone.
    Reloaded,
}

impl SourceEvent {
    /// Stable event name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::FrameNumberChanged { .. } => "frame_number_changed",
            Self::RateChanged { .. } => "rate_changed",
            Self::PlayingChanged { .. } => "playing_changed",
            Self::LoopingChanged { .. } => "looping_changed",
            Self::Reloaded => "reloaded",
        }
    }
}

/// Receiving end of a source's notification channel.
///
/// Delivery is ordered and single-consumer. Dropping the subscription
/// detaches it; the source prunes it on its next publish.
#[derive(Debug)]
pub struct SourceSubscription {
    receiver: Receiver<SourceEvent>,
}

impl SourceSubscription {
    /// Take the next pending notification without blocking.
    pub fn try_recv(&self) -> Result<SourceEvent, TryRecvError> {
        self.receiver.try_recv()
    }
}

/// Fan-out of source notifications to subscriptions, for source
/// implementations.
#[derive(Debug, Default)]
pub struct SourceEventHub {
    senders: Vec<Sender<SourceEvent>>,
}

impl SourceEventHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new subscription.
    pub fn subscribe(&mut self) -> SourceSubscription {
        let (tx, rx) = mpsc::channel();
        self.senders.push(tx);
        SourceSubscription { receiver: rx }
    }

    /// Deliver `event` to every live subscription, dropping detached ones.
    pub fn publish(&mut self, event: SourceEvent) {
        self.senders.retain(|tx| tx.send(event).is_ok());
    }

    /// Number of live subscriptions as of the last publish.
    pub fn subscriber_count(&self) -> usize {
        self.senders.len()
    }
}

/// An external video source driven by a playback controller.
///
/// Methods take `&self` so one source can be shared between its driver and
/// the controller bound to it. Commands (`play`, `stop`, `set_frame_number`,
/// `set_rate`, `set_looping`) may complete after the call returns; completion
/// is reported through the channel returned by [`VideoSource::subscribe`].
pub trait VideoSource: Send + Sync {
    /// Whether media is loaded and frame queries are meaningful.
    fn is_ready(&self) -> bool;

    fn play(&self);

    fn stop(&self);

    fn is_playing(&self) -> bool;

    /// Currently presented frame. May be negative while not ready.
    fn current_frame_number(&self) -> FrameNumber;

    /// Request presentation of `frame`.
    fn set_frame_number(&self, frame: FrameNumber);

    /// Native timestamp of `frame` in milliseconds, or `None` if the frame
    /// does not exist or the source is not ready.
    fn frame_timestamp_ms(&self, frame: FrameNumber) -> Option<f64>;

    fn rate(&self) -> f64;

    fn set_rate(&self, rate: f64);

    fn is_looping(&self) -> bool;

    fn set_looping(&self, looping: bool);

    /// First frame of the source's play range.
    fn start_frame_number(&self) -> FrameNumber;

    /// Last frame of the source's play range.
    fn end_frame_number(&self) -> FrameNumber;

    fn frame_count(&self) -> usize;

    /// Total native duration in milliseconds.
    fn total_duration_ms(&self) -> f64;

    /// Open an ordered notification channel.
    fn subscribe(&self) -> SourceSubscription;
}
