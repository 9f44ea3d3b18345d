//! `play`: stream a track to the speakers with a single-line ticker.
//!
//! The loop multiplexes three inputs: progress updates (blocking receive
//! with a timeout), the done signal and the raw-mode key reader. The
//! status line is rewritten in place with a carriage return and never
//! scrolls.

use std::io::{self, Write as _};
use std::sync::mpsc::{Receiver, RecvTimeoutError, TryRecvError};
use std::time::Duration;

use crate::catalog::Catalog;
use crate::config::Settings;
use crate::error::Error;
use crate::player::{AudioOutput, Player, PlayerEvents, Status};
use crate::stream::stream_health;
use crate::term::{KeyAction, RawModeGuard, spawn_key_reader};
use crate::util::{format_hms, format_hms_secs};

use super::parse_track_id;

enum Outcome {
    Finished,
    Stopped,
}

pub fn run(settings: &Settings, catalog: &Catalog, id_arg: &str) -> Result<(), Error> {
    let id = parse_track_id(id_arg)?;
    let track = catalog.track_by_id(id)?;
    if track.url.is_empty() {
        return Err(Error::Validation(format!(
            "track {id} has no streaming URL"
        )));
    }

    println!("Now playing track {}: {}", track.id, track.display());
    if !track.album.is_empty() {
        println!("  album:  {}", track.album);
    }
    if track.length > 0 {
        println!("  length: {}", format_hms_secs(track.length));
    } else {
        println!("  length: determined during playback");
    }
    println!();
    println!("Controls: [space/enter] pause/resume  [q] stop");
    println!();

    let buffer_size = settings.player.buffer_kib as usize * 1024;
    let (player, events) = Player::new(AudioOutput::new(), buffer_size);
    player.play(track)?;

    let outcome = {
        let _raw = RawModeGuard::new();
        let keys = spawn_key_reader();
        let outcome = ticker_loop(&player, &events, &keys);
        player.stop();
        outcome
        // raw mode restored here, before anything else is printed
    };

    print!("\r\x1b[K");
    match outcome {
        Outcome::Finished => println!("Playback finished"),
        Outcome::Stopped => println!("Playback stopped"),
    }
    Ok(())
}

fn ticker_loop(player: &Player, events: &PlayerEvents, keys: &Receiver<KeyAction>) -> Outcome {
    loop {
        match events.done.try_recv() {
            Ok(()) => return Outcome::Finished,
            Err(TryRecvError::Disconnected) => return Outcome::Stopped,
            Err(TryRecvError::Empty) => {}
        }

        loop {
            match keys.try_recv() {
                Ok(KeyAction::TogglePause) => player.pause(),
                Ok(KeyAction::Quit) => return Outcome::Stopped,
                Err(_) => break,
            }
        }

        match events.progress.recv_timeout(Duration::from_millis(250)) {
            Ok(status) => render_status_line(&status),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => return Outcome::Stopped,
        }
    }
}

fn render_status_line(status: &Status) {
    let mut line = String::new();

    if status.total > Duration::ZERO {
        let percent =
            status.current.as_secs_f64() / status.total.as_secs_f64().max(f64::EPSILON) * 100.0;
        line.push_str(&format!(
            "{:5.1}% | {} / {}",
            percent.min(100.0),
            format_hms(status.current),
            format_hms(status.total)
        ));
    } else {
        line.push_str(&format_hms(status.current));
    }

    if status.playing {
        line.push_str(&format!(
            " | {:.2}x | {}",
            status.speed,
            stream_health(status.stuck)
        ));
    } else {
        line.push_str(" | paused");
    }

    print!("\r\x1b[K{line}");
    let _ = io::stdout().flush();
}
