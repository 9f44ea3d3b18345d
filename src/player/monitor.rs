//! The per-session progress monitor.
//!
//! Samples the sink once per second, feeds the pure `ProgressTracker` and
//! publishes a `Status` with a non-blocking send. Stall detection and the
//! speed ratio are advisory; nothing here ever aborts the stream.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::SyncSender;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::warn;

use super::{Controller, Status};

/// Derives stall counts, paused-time accounting and the speed ratio from a
/// stream of (position, paused) samples. Pure so it can be driven with
/// synthetic clocks in tests.
pub struct ProgressTracker {
    started: Instant,
    paused_accum: Duration,
    pause_started: Option<Instant>,
    last_pos_secs: u64,
    stuck: u32,
}

impl ProgressTracker {
    pub fn new(now: Instant) -> Self {
        Self {
            started: now,
            paused_accum: Duration::ZERO,
            pause_started: None,
            last_pos_secs: 0,
            stuck: 0,
        }
    }

    /// Record one sample; returns `(speed, stuck)`.
    pub fn tick(&mut self, now: Instant, position: Duration, paused: bool) -> (f64, u32) {
        // Pause bookkeeping happens on the transition edges.
        if paused && self.pause_started.is_none() {
            self.pause_started = Some(now);
        }
        if !paused {
            if let Some(started) = self.pause_started.take() {
                self.paused_accum += now.saturating_duration_since(started);
            }
        }

        // Whole-second granularity: sub-second jitter is not advancement.
        let pos_secs = position.as_secs();
        if paused {
            self.stuck = 0;
        } else if pos_secs == self.last_pos_secs {
            self.stuck += 1;
        } else {
            self.stuck = 0;
        }
        self.last_pos_secs = pos_secs;

        // Listening time excludes paused intervals, including the one in
        // progress.
        let mut elapsed = now
            .saturating_duration_since(self.started)
            .saturating_sub(self.paused_accum);
        if let Some(started) = self.pause_started {
            elapsed = elapsed.saturating_sub(now.saturating_duration_since(started));
        }

        let speed = if paused || elapsed.is_zero() {
            0.0
        } else {
            position.as_secs_f64() / elapsed.as_secs_f64()
        };

        (speed, self.stuck)
    }
}

pub(super) fn spawn(
    controller: Controller,
    stop: Arc<AtomicBool>,
    progress: SyncSender<Status>,
    track_length_secs: u64,
    decoder_total: Option<Duration>,
) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut tracker = ProgressTracker::new(Instant::now());
        loop {
            // 1 Hz cadence, checking for shutdown between short sleeps so
            // teardown never waits out a full tick.
            for _ in 0..10 {
                if stop.load(Ordering::SeqCst) {
                    return;
                }
                thread::sleep(Duration::from_millis(100));
            }

            let position = controller.position();
            let paused = controller.is_paused();
            let (speed, stuck) = tracker.tick(Instant::now(), position, paused);

            if stuck == 6 {
                warn!(position_secs = position.as_secs(), "stream position is not advancing");
            }

            // Catalog-stored length wins over what the decoder managed to
            // figure out from a headerless live stream.
            let total = if track_length_secs > 0 {
                Duration::from_secs(track_length_secs)
            } else {
                decoder_total.unwrap_or(Duration::ZERO)
            };

            let status = Status {
                current: position,
                total,
                playing: !paused,
                speed,
                stuck,
            };

            // Drop the update rather than block when the consumer is slow.
            let _ = progress.try_send(status);
        }
    })
}
