//! Clip playback controller.
//!
//! The controller keeps one stored step number: the position it last
//! commanded or reconciled. The observed position is always derived from
//! the source's frame pointer. Once every pending source notification has
//! been polled, both agree:
//!
//! ```text
//! intended_step_number() == step_number()
//! ```

use std::sync::mpsc::{Receiver, TryRecvError};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use stepclip_clip_model::{
    ClipMapping, ClipParameters, FrameNumber, FrameSample, StepNumber, TimeModel,
};
use stepclip_common::config::PlaybackDefaults;
use stepclip_common::error::{StepclipError, StepclipResult};

use crate::event::PlaybackEvent;
use crate::notifier::{ChangeNotifier, SubscriberError, SubscriptionId};
use crate::source::{SourceEvent, SourceSubscription, VideoSource};

/// Transport state owned by a controller.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaybackState {
    /// Last commanded or reconciled step, always in `[0, step_count)`.
    pub step_number: StepNumber,

    /// Absolute playback rate, always > 0.
    pub rate: f64,

    pub looping: bool,

    /// Last commanded or reported transport state.
    pub playing: bool,

    /// Native-to-clip time scale, always > 0.
    pub time_stretch: f64,
}

/// Drives a video source through a strided clip.
pub struct PlaybackController {
    clip: ClipParameters,
    mapping: ClipMapping,
    source: Arc<dyn VideoSource>,
    subscription: Option<SourceSubscription>,
    state: PlaybackState,
    notifier: ChangeNotifier,
}

impl std::fmt::Debug for PlaybackController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackController")
            .field("clip", &self.clip)
            .field("state", &self.state)
            .field("attached", &self.subscription.is_some())
            .finish()
    }
}

impl PlaybackController {
    /// Bind a controller to `clip` over `source`.
    ///
    /// When the source is ready it must hold frames and the clip must fit
    /// inside it. The controller starts at the step nearest the source's
    /// current frame and seeks the source onto that step's frame if it is
    /// not already there.
    pub fn new(clip: ClipParameters, source: Arc<dyn VideoSource>) -> StepclipResult<Self> {
        if source.is_ready() {
            if source.frame_count() == 0 {
                return Err(StepclipError::source_unavailable(
                    "source reports ready but holds no frames",
                ));
            }
            clip.validate_against(source.frame_count())?;
        }

        let mapping = clip.mapping();
        let subscription = source.subscribe();
        let source_rate = source.rate().abs();
        let rate = if source_rate.is_finite() && source_rate > 0.0 {
            source_rate
        } else {
            1.0
        };

        let mut controller = Self {
            clip,
            mapping,
            subscription: Some(subscription),
            state: PlaybackState {
                step_number: 0,
                rate,
                looping: source.is_looping(),
                playing: source.is_playing(),
                time_stretch: 1.0,
            },
            notifier: ChangeNotifier::new(),
            source,
        };

        if let Some(frame) = controller.observed_frame() {
            let step = controller.mapping.clamped_step_of(frame);
            controller.state.step_number = step;
            let target = controller.mapping.frame_of(step);
            if frame != target {
                controller.source.set_frame_number(target);
            }
        }

        tracing::info!(
            start_frame = clip.start_frame(),
            stride = clip.stride(),
            step_count = clip.step_count(),
            step = controller.state.step_number,
            "Playback controller bound"
        );

        Ok(controller)
    }

    /// Bind a controller and apply configured transport defaults.
    pub fn with_defaults(
        clip: ClipParameters,
        source: Arc<dyn VideoSource>,
        defaults: &PlaybackDefaults,
    ) -> StepclipResult<Self> {
        let mut controller = Self::new(clip, source)?;
        controller.set_rate(defaults.rate);
        controller.set_looping(defaults.looping);
        if let Some(ms) = defaults.frame_duration_ms {
            controller.set_frame_duration(ms);
        }
        Ok(controller)
    }

    pub fn clip(&self) -> &ClipParameters {
        &self.clip
    }

    pub fn mapping(&self) -> &ClipMapping {
        &self.mapping
    }

    /// Copy of the current transport state.
    pub fn snapshot(&self) -> PlaybackState {
        self.state
    }

    /// Register a callback for playback events.
    pub fn subscribe<F>(&mut self, callback: F) -> SubscriptionId
    where
        F: FnMut(&PlaybackEvent) -> Result<(), SubscriberError> + Send + 'static,
    {
        self.notifier.subscribe(callback)
    }

    /// Register an ordered channel for playback events.
    pub fn subscribe_channel(&mut self) -> (SubscriptionId, Receiver<PlaybackEvent>) {
        self.notifier.subscribe_channel()
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.notifier.unsubscribe(id)
    }

    /// Stop listening to the source. Later source notifications are ignored.
    pub fn detach(&mut self) {
        if self.subscription.take().is_some() {
            tracing::info!("Playback controller detached from source");
        }
    }

    pub fn is_attached(&self) -> bool {
        self.subscription.is_some()
    }

    /// Start playback at the current rate. No-op while playing.
    ///
    /// The step number is left alone; where playback starts from is up to
    /// the source and is picked up through reconciliation.
    pub fn play(&mut self) {
        self.poll_source_events();
        if self.state.playing {
            tracing::debug!("play ignored: already playing");
            return;
        }
        self.state.playing = true;
        self.source.play();
    }

    /// Stop playback. No-op while stopped.
    ///
    /// Decided on the commanded state after draining pending notifications,
    /// so it also cancels a play that has not landed yet.
    pub fn stop(&mut self) {
        self.poll_source_events();
        if !self.state.playing {
            tracing::debug!("stop ignored: not playing");
            return;
        }
        self.state.playing = false;
        self.source.stop();
    }

    /// Stop and move one step forward.
    pub fn step(&mut self) {
        self.stop();
        self.set_step_number(self.state.step_number + 1);
    }

    /// Stop and move one step back.
    pub fn back(&mut self) {
        self.stop();
        self.set_step_number(self.state.step_number - 1);
    }

    /// Move to step `n`, clamped into the clip.
    ///
    /// The stored step updates immediately; the source seek completes
    /// asynchronously. Repeating a request for the step the source already
    /// shows does nothing.
    pub fn set_step_number(&mut self, n: StepNumber) {
        let target = self.mapping.clamp_step(n);
        let target_frame = self.mapping.frame_of(target);

        if target == self.state.step_number && self.observed_frame() == Some(target_frame) {
            tracing::debug!(step = target, "set_step_number short-circuited");
            return;
        }

        let old = self.state.step_number;
        self.state.step_number = target;
        self.source.set_frame_number(target_frame);

        if old != target {
            tracing::debug!(old, new = target, frame = target_frame, "step number set");
            self.notifier
                .notify(&PlaybackEvent::StepNumberChanged { old, new: target });
        }
    }

    /// Set the playback rate. Zero and non-finite values are ignored and
    /// the sign is dropped.
    pub fn set_rate(&mut self, rate: f64) {
        if rate == 0.0 || !rate.is_finite() {
            tracing::debug!(rate, "set_rate ignored");
            return;
        }
        let rate = rate.abs();
        if rate == self.state.rate {
            return;
        }
        self.state.rate = rate;
        self.source.set_rate(rate);
    }

    pub fn set_looping(&mut self, looping: bool) {
        if looping == self.state.looping {
            return;
        }
        self.state.looping = looping;
        self.source.set_looping(looping);
    }

    /// Calibrate the time stretch so the mean step duration across the clip
    /// equals `duration_ms`.
    ///
    /// Degenerate requests (single-step clip, zero native span, non-positive
    /// duration, source not ready) leave the stretch unchanged.
    pub fn set_frame_duration(&mut self, duration_ms: f64) {
        let (Some(first), Some(last)) = (
            self.sample(self.clip.start_frame()),
            self.sample(self.clip.end_frame()),
        ) else {
            tracing::debug!(duration_ms, "frame duration ignored: source unavailable");
            return;
        };

        let Some(stretch) =
            TimeModel::calibrated_stretch(duration_ms, self.clip.step_count(), first, last)
        else {
            tracing::debug!(duration_ms, "frame duration ignored: degenerate calibration");
            return;
        };

        if stretch == self.state.time_stretch {
            return;
        }
        let old = self.mean_frame_duration_ms();
        self.state.time_stretch = stretch;
        let new = self.mean_frame_duration_ms();
        tracing::debug!(time_stretch = stretch, "time stretch calibrated");
        self.notifier
            .notify(&PlaybackEvent::FrameDurationChanged { old, new });
    }

    /// Observed step, derived from the source's frame pointer. Falls back to
    /// the stored step while the source is unavailable.
    pub fn step_number(&self) -> StepNumber {
        self.observed_frame()
            .map(|frame| self.mapping.clamped_step_of(frame))
            .unwrap_or(self.state.step_number)
    }

    /// Last commanded or reconciled step.
    pub fn intended_step_number(&self) -> StepNumber {
        self.state.step_number
    }

    /// Observed source frame, floored at zero.
    pub fn frame_number(&self) -> FrameNumber {
        self.observed_frame()
            .unwrap_or_else(|| self.intended_frame_number())
    }

    pub fn intended_frame_number(&self) -> FrameNumber {
        self.mapping.frame_of(self.state.step_number)
    }

    /// Clip time of the observed frame in milliseconds; 0 when unavailable.
    pub fn time_ms(&self) -> f64 {
        self.observed_frame()
            .and_then(|frame| self.clip_time_ms(frame))
            .unwrap_or(0.0)
    }

    /// Clip time of `step` (clamped) in milliseconds; 0 when unavailable.
    pub fn step_time_ms(&self, step: StepNumber) -> f64 {
        let frame = self.mapping.frame_of(self.mapping.clamp_step(step));
        self.clip_time_ms(frame).unwrap_or(0.0)
    }

    pub fn rate(&self) -> f64 {
        self.state.rate
    }

    pub fn is_looping(&self) -> bool {
        self.state.looping
    }

    /// Commanded transport state, reconciled from the source.
    pub fn is_playing(&self) -> bool {
        self.state.playing
    }

    pub fn time_stretch(&self) -> f64 {
        self.state.time_stretch
    }

    /// Mean clip-time duration of one native frame across the clip, or the
    /// source-wide average when the clip covers a single frame.
    pub fn mean_frame_duration_ms(&self) -> f64 {
        let model = self.time_model();
        let source_duration = self.source.total_duration_ms();
        let source_frames = self.source.frame_count();
        match (
            self.sample(self.clip.start_frame()),
            self.sample(self.clip.end_frame()),
        ) {
            (Some(start), Some(end)) => {
                model.mean_frame_duration_ms(start, end, source_duration, source_frames)
            }
            _ => {
                let only = FrameSample::new(self.clip.start_frame(), 0.0);
                model.mean_frame_duration_ms(only, only, source_duration, source_frames)
            }
        }
    }

    /// Handle every pending source notification in order. Returns how many
    /// were handled.
    pub fn poll_source_events(&mut self) -> usize {
        let mut handled = 0;
        loop {
            let next = match self.subscription.as_ref() {
                Some(subscription) => subscription.try_recv(),
                None => break,
            };
            match next {
                Ok(event) => {
                    self.handle_source_event(event);
                    handled += 1;
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    tracing::debug!("source notification channel closed");
                    self.subscription = None;
                    break;
                }
            }
        }
        handled
    }

    /// Apply one source notification.
    pub fn handle_source_event(&mut self, event: SourceEvent) {
        match event {
            SourceEvent::FrameNumberChanged { frame } => self.reconcile_frame(frame),
            SourceEvent::RateChanged { old, new } => {
                let rate = new.abs();
                if rate.is_finite() && rate > 0.0 {
                    self.state.rate = rate;
                }
                self.notifier
                    .notify(&PlaybackEvent::RateChanged { old, new });
            }
            SourceEvent::PlayingChanged { playing } => {
                self.state.playing = playing;
                self.notifier
                    .notify(&PlaybackEvent::PlayingChanged { playing });
            }
            SourceEvent::LoopingChanged { looping } => {
                self.state.looping = looping;
                self.notifier
                    .notify(&PlaybackEvent::LoopingChanged { looping });
            }
            other => self.handle_base_event(other),
        }
    }

    fn reconcile_frame(&mut self, frame: FrameNumber) {
        let step = self.mapping.clamped_step_of(frame.max(0));
        if step == self.state.step_number {
            return;
        }
        let old = self.state.step_number;
        self.state.step_number = step;
        tracing::debug!(frame, old, new = step, "step reconciled from source");
        self.notifier
            .notify(&PlaybackEvent::StepNumberChanged { old, new: step });
    }

    fn handle_base_event(&mut self, event: SourceEvent) {
        tracing::debug!(event = event.name(), "source state reset");
        if !self.source.is_ready() {
            return;
        }
        self.state.playing = self.source.is_playing();
        if let Err(e) = self.clip.validate_against(self.source.frame_count()) {
            tracing::warn!("Reloaded source no longer covers the clip: {e}");
        }
        if let Some(frame) = self.observed_frame() {
            self.reconcile_frame(frame);
        }
    }

    fn observed_frame(&self) -> Option<FrameNumber> {
        self.source
            .is_ready()
            .then(|| self.source.current_frame_number().max(0))
    }

    fn sample(&self, frame: FrameNumber) -> Option<FrameSample> {
        if !self.source.is_ready() {
            return None;
        }
        self.source
            .frame_timestamp_ms(frame)
            .map(|ms| FrameSample::new(frame, ms))
    }

    fn clip_time_ms(&self, frame: FrameNumber) -> Option<f64> {
        let start = self.sample(self.clip.start_frame())?;
        let sample = self.sample(frame)?;
        Some(self.time_model().clip_time_ms(sample, start))
    }

    fn time_model(&self) -> TimeModel {
        TimeModel::new(self.state.time_stretch)
    }
}
