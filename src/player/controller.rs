//! Sink-side playback control.
//!
//! `Controller` is the single mid-stream control surface: a pause flag the
//! output mixer consults on every buffer pull under the sink's own lock.
//! Toggling never blocks on I/O.

use std::sync::Arc;
use std::sync::mpsc::SyncSender;
use std::time::Duration;

use rodio::{Sink, Source};

#[derive(Clone)]
pub struct Controller {
    sink: Arc<Sink>,
}

impl Controller {
    pub(super) fn new(sink: Arc<Sink>) -> Self {
        Self { sink }
    }

    /// Flip the paused flag; returns the new paused state.
    pub fn toggle(&self) -> bool {
        if self.sink.is_paused() {
            self.sink.play();
        } else {
            self.sink.pause();
        }
        self.sink.is_paused()
    }

    pub fn is_paused(&self) -> bool {
        self.sink.is_paused()
    }

    /// Current playback position as reported by the sink.
    pub fn position(&self) -> Duration {
        self.sink.get_pos()
    }

    pub(super) fn stop(&self) {
        self.sink.stop();
    }
}

/// Zero-length source appended after the decoded track. The mixer reaches
/// it exactly when the track runs out, so its first (and only) pull doubles
/// as the completion callback, running on the mixer thread.
pub(super) struct DoneSignal {
    tx: Option<SyncSender<()>>,
}

impl DoneSignal {
    pub(super) fn new(tx: SyncSender<()>) -> Self {
        Self { tx: Some(tx) }
    }
}

impl Iterator for DoneSignal {
    type Item = f32;

    fn next(&mut self) -> Option<f32> {
        // take() keeps the signal exactly-once even if the mixer polls again.
        if let Some(tx) = self.tx.take() {
            let _ = tx.try_send(());
        }
        None
    }
}

impl Source for DoneSignal {
    fn current_span_len(&self) -> Option<usize> {
        None
    }

    fn channels(&self) -> u16 {
        1
    }

    fn sample_rate(&self) -> u32 {
        44_100
    }

    fn total_duration(&self) -> Option<Duration> {
        Some(Duration::ZERO)
    }
}
