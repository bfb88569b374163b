//! In-process video source with deferred command completion.
//!
//! Frames are only timestamps; nothing is decoded. Commands are queued and
//! take effect when the driver calls [`MemoryVideoSource::settle`], which is
//! when the matching notifications are published. While playing,
//! [`MemoryVideoSource::advance`] moves the frame pointer through the play
//! range as native time elapses.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use stepclip_clip_model::FrameNumber;

use crate::source::{SourceEvent, SourceEventHub, SourceSubscription, VideoSource};

/// Frame durations shorter than this are treated as this long while
/// advancing, so zero-length frames cannot stall playback.
const MIN_FRAME_MS: f64 = 1e-3;

/// A queued source command.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SourceCommand {
    Play,
    Stop,
    Seek(FrameNumber),
    SetRate(f64),
    SetLooping(bool),
}

#[derive(Debug)]
struct SourceInner {
    timestamps_ms: Vec<f64>,
    duration_ms: f64,
    ready: bool,
    current_frame: FrameNumber,
    playing: bool,
    looping: bool,
    rate: f64,
    range: (FrameNumber, FrameNumber),
    carry_ms: f64,
    pending: VecDeque<SourceCommand>,
    hub: SourceEventHub,
}

/// A [`VideoSource`] backed by a list of frame timestamps.
#[derive(Debug)]
pub struct MemoryVideoSource {
    inner: Mutex<SourceInner>,
}

impl MemoryVideoSource {
    /// Source with explicit per-frame timestamps in milliseconds.
    pub fn from_timestamps(timestamps_ms: Vec<f64>) -> Self {
        let duration_ms = duration_from_timestamps(&timestamps_ms);
        Self::build(timestamps_ms, duration_ms, true)
    }

    /// Source of `frame_count` evenly spaced frames at `fps`.
    pub fn with_frame_rate(frame_count: usize, fps: f64) -> Self {
        let frame_ms = if fps.is_finite() && fps > 0.0 {
            1000.0 / fps
        } else {
            0.0
        };
        let timestamps = (0..frame_count).map(|i| i as f64 * frame_ms).collect();
        Self::build(timestamps, frame_count as f64 * frame_ms, true)
    }

    /// Source with no media loaded yet.
    pub fn unloaded() -> Self {
        Self::build(Vec::new(), 0.0, false)
    }

    fn build(timestamps_ms: Vec<f64>, duration_ms: f64, ready: bool) -> Self {
        let last = timestamps_ms.len() as FrameNumber - 1;
        Self {
            inner: Mutex::new(SourceInner {
                timestamps_ms,
                duration_ms,
                ready,
                current_frame: 0,
                playing: false,
                looping: false,
                rate: 1.0,
                range: (0, last.max(0)),
                carry_ms: 0.0,
                pending: VecDeque::new(),
                hub: SourceEventHub::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SourceInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Replace the media, reset the frame pointer and play range, and
    /// publish [`SourceEvent::Reloaded`].
    pub fn load(&self, timestamps_ms: Vec<f64>) {
        let mut inner = self.lock();
        inner.duration_ms = duration_from_timestamps(&timestamps_ms);
        inner.range = (0, (timestamps_ms.len() as FrameNumber - 1).max(0));
        inner.timestamps_ms = timestamps_ms;
        inner.ready = true;
        inner.current_frame = 0;
        inner.playing = false;
        inner.carry_ms = 0.0;
        inner.pending.clear();
        inner.hub.publish(SourceEvent::Reloaded);
    }

    /// Simulate the media becoming unavailable or available again.
    pub fn set_ready(&self, ready: bool) {
        self.lock().ready = ready;
    }

    /// Restrict autonomous playback to `[start, end]`, clamped to the media.
    pub fn set_play_range(&self, start: FrameNumber, end: FrameNumber) {
        let mut inner = self.lock();
        let last = (inner.timestamps_ms.len() as FrameNumber - 1).max(0);
        let start = start.clamp(0, last);
        inner.range = (start, end.clamp(start, last));
    }

    /// Number of commands waiting for [`MemoryVideoSource::settle`].
    pub fn pending_commands(&self) -> usize {
        self.lock().pending.len()
    }

    /// Apply every queued command in order. Returns how many were applied.
    pub fn settle(&self) -> usize {
        let mut inner = self.lock();
        let mut applied = 0;
        while let Some(command) = inner.pending.pop_front() {
            inner.apply(command);
            applied += 1;
        }
        applied
    }

    /// Let `elapsed_ms` of native time pass at the current rate.
    pub fn advance(&self, elapsed_ms: f64) {
        let mut inner = self.lock();
        if !inner.ready || !inner.playing || elapsed_ms.is_nan() || elapsed_ms <= 0.0 {
            return;
        }
        inner.carry_ms += elapsed_ms * inner.rate;
        inner.run_playhead();
    }

    /// Move the frame pointer immediately, as an external seek would, and
    /// publish the change. Any value is accepted, including negative ones.
    pub fn report_frame(&self, frame: FrameNumber) {
        let mut inner = self.lock();
        inner.current_frame = frame;
        inner.carry_ms = 0.0;
        inner.hub.publish(SourceEvent::FrameNumberChanged { frame });
    }

    fn enqueue(&self, command: SourceCommand) {
        let mut inner = self.lock();
        if let SourceCommand::Seek(_) = command {
            inner
                .pending
                .retain(|queued| !matches!(queued, SourceCommand::Seek(_)));
        }
        inner.pending.push_back(command);
    }
}

impl SourceInner {
    fn last_frame(&self) -> FrameNumber {
        self.timestamps_ms.len() as FrameNumber - 1
    }

    fn apply(&mut self, command: SourceCommand) {
        match command {
            SourceCommand::Seek(frame) => {
                if self.timestamps_ms.is_empty() {
                    return;
                }
                self.carry_ms = 0.0;
                self.move_to(frame.clamp(0, self.last_frame()));
            }
            SourceCommand::Play => {
                if self.playing || self.timestamps_ms.is_empty() {
                    return;
                }
                if self.current_frame >= self.range.1 && !self.looping {
                    self.move_to(self.range.0);
                }
                self.playing = true;
                self.carry_ms = 0.0;
                self.hub.publish(SourceEvent::PlayingChanged { playing: true });
            }
            SourceCommand::Stop => self.halt(),
            SourceCommand::SetRate(rate) => {
                if rate == 0.0 || !rate.is_finite() || rate == self.rate {
                    return;
                }
                let old = self.rate;
                self.rate = rate;
                self.hub.publish(SourceEvent::RateChanged { old, new: rate });
            }
            SourceCommand::SetLooping(looping) => {
                if looping == self.looping {
                    return;
                }
                self.looping = looping;
                self.hub.publish(SourceEvent::LoopingChanged { looping });
            }
        }
    }

    fn run_playhead(&mut self) {
        let (start, end) = self.range;
        while self.playing {
            let dt = self.frame_duration_ms(self.current_frame);
            if self.carry_ms < dt {
                break;
            }
            self.carry_ms -= dt;
            if self.current_frame >= end {
                if self.looping {
                    self.move_to(start);
                } else {
                    self.halt();
                }
            } else {
                self.move_to(self.current_frame + 1);
            }
        }
    }

    fn frame_duration_ms(&self, frame: FrameNumber) -> f64 {
        let ts = &self.timestamps_ms;
        let next = usize::try_from(frame + 1).ok();
        let here = usize::try_from(frame).ok();
        let native = match (here.and_then(|i| ts.get(i)), next.and_then(|i| ts.get(i))) {
            (Some(a), Some(b)) => b - a,
            _ if !ts.is_empty() => self.duration_ms / ts.len() as f64,
            _ => 0.0,
        };
        native.max(MIN_FRAME_MS)
    }

    fn move_to(&mut self, frame: FrameNumber) {
        if frame == self.current_frame {
            return;
        }
        self.current_frame = frame;
        self.hub.publish(SourceEvent::FrameNumberChanged { frame });
    }

    fn halt(&mut self) {
        if !self.playing {
            return;
        }
        self.playing = false;
        self.carry_ms = 0.0;
        self.hub
            .publish(SourceEvent::PlayingChanged { playing: false });
    }
}

fn duration_from_timestamps(timestamps_ms: &[f64]) -> f64 {
    match (timestamps_ms.first(), timestamps_ms.last()) {
        (Some(first), Some(last)) if timestamps_ms.len() > 1 => {
            let span = last - first;
            span + span / (timestamps_ms.len() - 1) as f64
        }
        _ => 0.0,
    }
}

impl VideoSource for MemoryVideoSource {
    fn is_ready(&self) -> bool {
        self.lock().ready
    }

    fn play(&self) {
        self.enqueue(SourceCommand::Play);
    }

    fn stop(&self) {
        self.enqueue(SourceCommand::Stop);
    }

    fn is_playing(&self) -> bool {
        self.lock().playing
    }

    fn current_frame_number(&self) -> FrameNumber {
        let inner = self.lock();
        if inner.ready {
            inner.current_frame
        } else {
            -1
        }
    }

    fn set_frame_number(&self, frame: FrameNumber) {
        self.enqueue(SourceCommand::Seek(frame));
    }

    fn frame_timestamp_ms(&self, frame: FrameNumber) -> Option<f64> {
        let inner = self.lock();
        if !inner.ready {
            return None;
        }
        usize::try_from(frame)
            .ok()
            .and_then(|i| inner.timestamps_ms.get(i).copied())
    }

    fn rate(&self) -> f64 {
        self.lock().rate
    }

    fn set_rate(&self, rate: f64) {
        self.enqueue(SourceCommand::SetRate(rate));
    }

    fn is_looping(&self) -> bool {
        self.lock().looping
    }

    fn set_looping(&self, looping: bool) {
        self.enqueue(SourceCommand::SetLooping(looping));
    }

    fn start_frame_number(&self) -> FrameNumber {
        self.lock().range.0
    }

    fn end_frame_number(&self) -> FrameNumber {
        self.lock().range.1
    }

    fn frame_count(&self) -> usize {
        self.lock().timestamps_ms.len()
    }

    fn total_duration_ms(&self) -> f64 {
        self.lock().duration_ms
    }

    fn subscribe(&self) -> SourceSubscription {
        self.lock().hub.subscribe()
    }
}
