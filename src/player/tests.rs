use std::io::{Read as _, Write as _};
use std::net::TcpListener;
use std::sync::mpsc::TryRecvError;
use std::thread;
use std::time::{Duration, Instant};

use super::*;
use crate::stream::stream_health;

fn test_player() -> (Player, PlayerEvents) {
    Player::new(AudioOutput::new(), 8 * 1024)
}

fn test_track(url: &str) -> TrackRecord {
    TrackRecord {
        id: 1,
        artist: "Test Artist".to_string(),
        title: "Test Title".to_string(),
        album: "Test Album".to_string(),
        length: 180,
        file_size: 0,
        url: url.to_string(),
        source_url: "https://example.com/source".to_string(),
        playback_position: 0,
    }
}

fn spawn_http_server(response: &'static [u8]) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        if let Ok((mut socket, _)) = listener.accept() {
            let mut buf = [0u8; 2048];
            let _ = socket.read(&mut buf);
            let _ = socket.write_all(response);
        }
    });
    format!("http://{}/track.mp3", addr)
}

#[test]
fn pause_without_session_is_a_noop() {
    let (player, _events) = test_player();
    player.pause();
    player.pause();
    assert!(!player.is_playing());
    assert!(player.current_track().is_none());
}

#[test]
fn play_against_404_fails_upstream_but_records_track() {
    let url = spawn_http_server(b"HTTP/1.1 404 Not Found\r\ncontent-length: 0\r\n\r\n");
    let (player, _events) = test_player();

    let result = player.play(&test_track(&url));
    assert!(matches!(result, Err(Error::Upstream { status: 404 })));

    // The snapshot is recorded before the network attempt.
    let current = player.current_track().expect("track snapshot recorded");
    assert_eq!(current.id, 1);
    assert!(!player.is_playing());
}

#[test]
fn play_on_undecodable_body_fails_with_decode_error() {
    let url = spawn_http_server(
        b"HTTP/1.1 200 OK\r\ncontent-length: 14\r\nconnection: close\r\n\r\nnot mp3 at all",
    );
    let (player, _events) = test_player();

    let result = player.play(&test_track(&url));
    assert!(matches!(result, Err(Error::Decode(_))));
    assert!(!player.is_playing());

    // Teardown after a failed load degrades to a no-op.
    player.stop();
}

#[test]
fn stop_twice_reaches_the_same_idle_state() {
    let (player, _events) = test_player();
    player.stop();
    assert!(player.current_track().is_none());
    assert!(!player.is_playing());

    player.stop();
    assert!(player.current_track().is_none());
    assert!(!player.is_playing());
}

#[test]
fn close_disconnects_both_channels() {
    let (player, events) = test_player();
    player.close();

    assert!(matches!(
        events.progress.try_recv(),
        Err(TryRecvError::Disconnected)
    ));
    assert!(matches!(events.done.try_recv(), Err(TryRecvError::Disconnected)));
}

#[test]
fn play_after_close_is_refused() {
    let url = spawn_http_server(b"HTTP/1.1 200 OK\r\ncontent-length: 0\r\n\r\n");
    let (player, _events) = test_player();
    player.close();
    assert!(matches!(
        player.play(&test_track(&url)),
        Err(Error::Cancelled)
    ));
}

// ProgressTracker is driven with synthetic clocks below; one tick == 1 s.

#[test]
fn stall_counter_increases_while_position_is_frozen() {
    let t0 = Instant::now();
    let mut tracker = ProgressTracker::new(t0);
    let frozen = Duration::from_secs(12);

    let mut seen = Vec::new();
    for i in 1..=6u64 {
        let (_, stuck) = tracker.tick(t0 + Duration::from_secs(i), frozen, false);
        seen.push(stuck);
    }
    assert_eq!(seen, vec![1, 2, 3, 4, 5, 6]);

    assert_eq!(stream_health(seen[0]), "buffering...");
    assert_eq!(stream_health(seen[3]), "slow connection");
    assert_eq!(stream_health(seen[5]), "possible connection problem");
}

#[test]
fn stall_counter_resets_on_advancement_and_on_pause() {
    let t0 = Instant::now();
    let mut tracker = ProgressTracker::new(t0);

    let (_, stuck) = tracker.tick(t0 + Duration::from_secs(1), Duration::from_secs(5), false);
    assert_eq!(stuck, 0); // advanced from 0 to 5

    let (_, stuck) = tracker.tick(t0 + Duration::from_secs(2), Duration::from_secs(5), false);
    assert_eq!(stuck, 1);

    let (_, stuck) = tracker.tick(t0 + Duration::from_secs(3), Duration::from_secs(5), true);
    assert_eq!(stuck, 0); // paused resets the counter
}

#[test]
fn speed_is_zero_with_no_elapsed_time() {
    let t0 = Instant::now();
    let mut tracker = ProgressTracker::new(t0);
    let (speed, _) = tracker.tick(t0, Duration::ZERO, false);
    assert_eq!(speed, 0.0);
}

#[test]
fn speed_is_zero_while_paused() {
    let t0 = Instant::now();
    let mut tracker = ProgressTracker::new(t0);
    tracker.tick(t0 + Duration::from_secs(1), Duration::from_secs(1), false);
    let (speed, _) = tracker.tick(t0 + Duration::from_secs(2), Duration::from_secs(2), true);
    assert_eq!(speed, 0.0);
}

#[test]
fn paused_time_does_not_depress_the_speed_ratio() {
    let t0 = Instant::now();
    let mut tracker = ProgressTracker::new(t0);
    let sec = Duration::from_secs;

    // 5 s of real-time playback.
    for i in 1..=5u64 {
        let (speed, _) = tracker.tick(t0 + sec(i), sec(i), false);
        if i > 1 {
            assert!((speed - 1.0).abs() < 0.05, "speed was {speed}");
        }
    }

    // 5 s paused; position holds at 5 s.
    for i in 6..=10u64 {
        let (speed, stuck) = tracker.tick(t0 + sec(i), sec(5), true);
        assert_eq!(speed, 0.0);
        assert_eq!(stuck, 0);
    }

    // Resume: the paused interval must not count as listening time.
    let (speed, _) = tracker.tick(t0 + sec(11), sec(6), false);
    assert!((speed - 1.0).abs() < 0.05, "speed after resume was {speed}");
}
