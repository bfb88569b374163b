//! Ordered delivery of playback events.
//!
//! Subscribers never influence the controller: a failing or panicking
//! callback is logged and skipped, and the state transition that produced
//! the event has already been applied.

use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, Sender};

use crate::event::PlaybackEvent;

/// Error a callback subscriber may return.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("subscriber failed: {message}")]
pub struct SubscriberError {
    pub message: String,
}

impl SubscriberError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Handle used to remove a subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback = Box<dyn FnMut(&PlaybackEvent) -> Result<(), SubscriberError> + Send>;

enum Subscriber {
    Callback(Callback),
    Channel(Sender<PlaybackEvent>),
}

/// Delivers events to subscribers in registration order.
#[derive(Default)]
pub struct ChangeNotifier {
    next_id: u64,
    subscribers: Vec<(SubscriptionId, Subscriber)>,
}

impl std::fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback subscriber.
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&PlaybackEvent) -> Result<(), SubscriberError> + Send + 'static,
    {
        self.register(Subscriber::Callback(Box::new(callback)))
    }

    /// Register a channel subscriber. Events arrive in publish order; the
    /// subscriber is dropped once the receiver is.
    pub fn subscribe_channel(&mut self) -> (SubscriptionId, Receiver<PlaybackEvent>) {
        let (tx, rx) = mpsc::channel();
        (self.register(Subscriber::Channel(tx)), rx)
    }

    /// Remove a subscriber. Returns false if it was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|(sid, _)| *sid != id);
        self.subscribers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Deliver `event` to every subscriber.
    pub fn notify(&mut self, event: &PlaybackEvent) {
        self.subscribers.retain_mut(|(id, subscriber)| match subscriber {
            Subscriber::Callback(callback) => {
                match panic::catch_unwind(AssertUnwindSafe(|| callback(event))) {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        tracing::warn!(subscriber = id.0, event = event.name(), "{e}");
                    }
                    Err(_) => {
                        tracing::warn!(
                            subscriber = id.0,
                            event = event.name(),
                            "subscriber panicked"
                        );
                    }
                }
                true
            }
            Subscriber::Channel(tx) => {
                let alive = tx.send(*event).is_ok();
                if !alive {
                    tracing::debug!(subscriber = id.0, "dropping disconnected channel subscriber");
                }
                alive
            }
        });
    }

    fn register(&mut self, subscriber: Subscriber) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push((id, subscriber));
        id
    }
}
