//! Streaming playback: one active track at a time, pulled over HTTP,
//! decoded and fed to the audio output, with a 1 Hz monitor publishing
//! progress snapshots.
//!
//! The player owns the whole session lifecycle. Errors that happen before
//! playback starts come back synchronously from [`Player::play`]; anything
//! later surfaces through the event channels in [`PlayerEvents`].

mod controller;
mod monitor;
mod output;

pub use controller::Controller;
pub use monitor::ProgressTracker;
pub use output::AudioOutput;

#[cfg(test)]
mod tests;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;
use std::time::Duration;

use rodio::{Decoder, Source};
use tracing::debug;

use crate::catalog::TrackRecord;
use crate::error::Error;
use crate::stream::{CancelToken, StreamHandle, StreamReader};

use controller::DoneSignal;

/// One progress snapshot, emitted once per monitor tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Status {
    /// Playback position within the track.
    pub current: Duration,
    /// Total duration, zero while unknown.
    pub total: Duration,
    pub playing: bool,
    /// Realtime-relative playback speed; diagnostic only.
    pub speed: f64,
    /// Consecutive ticks without position advancement while unpaused.
    pub stuck: u32,
}

/// Receiving ends of the player's outbound channels.
///
/// Progress updates are best-effort: the channel is bounded and the monitor
/// drops updates rather than block, so consumers must tolerate gaps. The
/// done signal fires exactly once per session, from the audio mixer thread.
pub struct PlayerEvents {
    pub progress: Receiver<Status>,
    pub done: Receiver<()>,
}

struct Session {
    controller: Controller,
    stream: StreamHandle,
    cancel: CancelToken,
    stop: Arc<AtomicBool>,
    monitor: Option<JoinHandle<()>>,
}

pub struct Player {
    output: AudioOutput,
    buffer_size: usize,
    session: Mutex<Option<Session>>,
    current: Mutex<Option<TrackRecord>>,
    progress_tx: Mutex<Option<SyncSender<Status>>>,
    done_tx: Mutex<Option<SyncSender<()>>>,
}

// Mutex poisoning only happens if a holder panicked; the guarded state is
// still usable for teardown, so recover instead of propagating the panic.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl Player {
    pub fn new(output: AudioOutput, buffer_size: usize) -> (Self, PlayerEvents) {
        let (progress_tx, progress_rx) = mpsc::sync_channel(1);
        let (done_tx, done_rx) = mpsc::sync_channel(1);

        let player = Self {
            output,
            buffer_size,
            session: Mutex::new(None),
            current: Mutex::new(None),
            progress_tx: Mutex::new(Some(progress_tx)),
            done_tx: Mutex::new(Some(done_tx)),
        };
        let events = PlayerEvents {
            progress: progress_rx,
            done: done_rx,
        };
        (player, events)
    }

    /// Start playing `track`, tearing down any active session first.
    ///
    /// Returns as soon as playback is registered with the output; the track
    /// snapshot is recorded before the network attempt, so
    /// [`Player::current_track`] is set even when `play` fails.
    pub fn play(&self, track: &TrackRecord) -> Result<(), Error> {
        let mut session = lock(&self.session);
        teardown(&mut session);

        let done_tx = lock(&self.done_tx).clone().ok_or(Error::Cancelled)?;

        *lock(&self.current) = Some(track.clone());

        let cancel = CancelToken::new();
        let reader = StreamReader::open(&track.url, self.buffer_size, &cancel)?;
        let stream = reader.handle();

        // A decode failure consumes and closes the reader.
        let decoder = Decoder::new(reader).map_err(|err| Error::Decode(err.to_string()))?;
        let total = decoder.total_duration();

        // The output device is opened once, on the first successful decode;
        // later sessions reuse it.
        let sink = Arc::new(self.output.connect_sink()?);
        sink.append(decoder);
        sink.append(DoneSignal::new(done_tx));
        sink.play();

        let controller = Controller::new(sink);
        let stop = Arc::new(AtomicBool::new(false));
        let monitor = lock(&self.progress_tx).clone().map(|progress| {
            monitor::spawn(controller.clone(), stop.clone(), progress, track.length, total)
        });

        debug!(id = track.id, url = %track.url, "playback started");

        *session = Some(Session {
            controller,
            stream,
            cancel,
            stop,
            monitor,
        });
        Ok(())
    }

    /// Toggle pause. A no-op when no session is active.
    pub fn pause(&self) {
        if let Some(session) = lock(&self.session).as_ref() {
            session.controller.toggle();
        }
    }

    /// Tear down the active session. Idempotent.
    pub fn stop(&self) {
        let mut session = lock(&self.session);
        teardown(&mut session);
        *lock(&self.current) = None;
    }

    /// Stop playback and release the outbound channels; consumers observe
    /// both receivers disconnecting.
    pub fn close(&self) {
        self.stop();
        *lock(&self.progress_tx) = None;
        *lock(&self.done_tx) = None;
    }

    /// Snapshot of the most recently played track, `None` when idle.
    pub fn current_track(&self) -> Option<TrackRecord> {
        lock(&self.current).clone()
    }

    pub fn is_playing(&self) -> bool {
        lock(&self.session)
            .as_ref()
            .map(|session| !session.controller.is_paused())
            .unwrap_or(false)
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        self.close();
    }
}

fn teardown(session: &mut Option<Session>) {
    let Some(mut session) = session.take() else {
        return;
    };
    session.stop.store(true, Ordering::SeqCst);
    session.cancel.cancel();
    session.controller.stop();
    if let Some(handle) = session.monitor.take() {
        let _ = handle.join();
    }
    debug!(
        stream_closed = session.stream.is_closed(),
        "session torn down"
    );
}
