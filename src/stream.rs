//! Buffered HTTP streaming for remote MP3s.
//!
//! `StreamReader` wraps a long-lived HTTP response body in a fixed-size
//! read-ahead buffer and exposes the blocking `Read` the audio decoder
//! expects. The connection has no overall deadline; long reads are ended
//! only by dropping the reader or cancelling the token that guards `open`.

use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::{Client, Response};
use tracing::debug;

use crate::error::Error;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(300);
const USER_AGENT: &str = concat!("trackstash/", env!("CARGO_PKG_VERSION"));

/// Cooperative cancellation flag shared between a caller and in-flight work.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Observer for a reader's lifetime; flips to closed when the reader is
/// dropped and the connection torn down.
#[derive(Debug, Clone)]
pub struct StreamHandle(Arc<AtomicBool>);

impl StreamHandle {
    pub fn is_closed(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// A buffered, sequential byte stream over a remote audio resource.
pub struct StreamReader {
    // Mutex only to satisfy the decoder's `Sync` bound; `read` goes through
    // `get_mut` and never contends.
    inner: Mutex<BufReader<Response>>,
    pos: u64,
    closed: Arc<AtomicBool>,
}

impl StreamReader {
    /// Open `url` for streaming with a read-ahead buffer of `buffer_size`
    /// bytes. Accepts 200/206 responses only. The request runs on a helper
    /// thread so a cancel during a hung connect returns promptly instead of
    /// waiting out the dial timeout.
    pub fn open(url: &str, buffer_size: usize, cancel: &CancelToken) -> Result<Self, Error> {
        let (tx, rx) = mpsc::channel();
        let request_url = url.to_string();
        thread::spawn(move || {
            let _ = tx.send(send_request(&request_url));
        });

        let response = loop {
            if cancel.is_cancelled() {
                return Err(Error::Cancelled);
            }
            match rx.recv_timeout(Duration::from_millis(50)) {
                Ok(result) => break result?,
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(Error::Connection("request thread terminated".to_string()));
                }
            }
        };

        let status = response.status();
        if status != StatusCode::OK && status != StatusCode::PARTIAL_CONTENT {
            return Err(Error::Upstream {
                status: status.as_u16(),
            });
        }

        debug!(url, buffer_size, status = status.as_u16(), "stream opened");

        Ok(Self {
            inner: Mutex::new(BufReader::with_capacity(buffer_size, response)),
            pos: 0,
            closed: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Handle that observes when this reader has been closed.
    pub fn handle(&self) -> StreamHandle {
        StreamHandle(self.closed.clone())
    }

    fn buffered(&mut self) -> io::Result<&mut BufReader<Response>> {
        self.inner
            .get_mut()
            .map_err(|_| io::Error::other("stream reader lock poisoned"))
    }

    // Forward-only skip used by the limited `Seek` implementation.
    fn skip(&mut self, n: u64) -> io::Result<u64> {
        let mut remaining = n;
        let mut scratch = [0u8; 8192];
        while remaining > 0 {
            let want = remaining.min(scratch.len() as u64) as usize;
            let read = self.buffered()?.read(&mut scratch[..want])?;
            if read == 0 {
                break;
            }
            self.pos += read as u64;
            remaining -= read as u64;
        }
        Ok(self.pos)
    }
}

impl Read for StreamReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "stream reader already closed",
            ));
        }
        let n = self.buffered()?.read(buf)?;
        self.pos += n as u64;
        Ok(n)
    }
}

/// The decoder wants `Seek`, but a live HTTP body has no random access.
/// Position queries and forward skips are supported; anything else fails
/// with `Unsupported`, which the decoder treats as "length unknown".
impl Seek for StreamReader {
    fn seek(&mut self, target: SeekFrom) -> io::Result<u64> {
        match target {
            SeekFrom::Current(0) => Ok(self.pos),
            SeekFrom::Current(n) if n > 0 => self.skip(n as u64),
            SeekFrom::Start(n) if n == self.pos => Ok(self.pos),
            SeekFrom::Start(n) if n > self.pos => self.skip(n - self.pos),
            _ => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "cannot seek backwards on a live stream",
            )),
        }
    }
}

impl Drop for StreamReader {
    fn drop(&mut self) {
        self.closed.store(true, Ordering::SeqCst);
        debug!(bytes = self.pos, "stream closed");
    }
}

fn send_request(url: &str) -> Result<Response, Error> {
    // No overall timeout: streaming reads are expected to run for the whole
    // track and must only be ended by explicit teardown.
    let client = Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .pool_idle_timeout(POOL_IDLE_TIMEOUT)
        .timeout(None)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|err| Error::Connection(err.to_string()))?;

    let response = client
        .get(url)
        .header(reqwest::header::ACCEPT_ENCODING, "identity")
        .header(reqwest::header::RANGE, "bytes=0-")
        .header(reqwest::header::CONNECTION, "keep-alive")
        .send()
        .map_err(|err| Error::Connection(err.to_string()))?;

    Ok(response)
}

/// Advisory description of stream health derived from the stall counter.
pub fn stream_health(stuck: u32) -> &'static str {
    match stuck {
        0 => "streaming",
        1..=3 => "buffering...",
        4..=5 => "slow connection",
        _ => "possible connection problem",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;
    use std::net::TcpListener;
    use std::time::Instant;

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
    fn open_rejects_non_success_status() {
        let url = spawn_http_server(b"HTTP/1.1 404 Not Found\r\ncontent-length: 0\r\n\r\n");
        let result = StreamReader::open(&url, 8 * 1024, &CancelToken::new());
        assert!(matches!(result, Err(Error::Upstream { status: 404 })));
    }

    #[test]
    fn open_reads_body_through_buffer() {
        let url = spawn_http_server(
            b"HTTP/1.1 200 OK\r\ncontent-length: 11\r\nconnection: close\r\n\r\nhello world",
        );
        let mut reader = StreamReader::open(&url, 4, &CancelToken::new()).unwrap();
        let mut body = Vec::new();
        reader.read_to_end(&mut body).unwrap();
        assert_eq!(body, b"hello world");
    }

    #[test]
    fn open_returns_promptly_when_cancelled() {
        // Accepts the connection but never sends response headers.
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            if let Ok((socket, _)) = listener.accept() {
                thread::sleep(Duration::from_secs(10));
                drop(socket);
            }
        });

        let cancel = CancelToken::new();
        let canceller = cancel.clone();
        thread::spawn(move || {
            thread::sleep(Duration::from_millis(300));
            canceller.cancel();
        });

        let started = Instant::now();
        let result = StreamReader::open(&format!("http://{}/hang", addr), 8 * 1024, &cancel);
        assert!(matches!(result, Err(Error::Cancelled)));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn drop_marks_handle_closed() {
        let url = spawn_http_server(
            b"HTTP/1.1 200 OK\r\ncontent-length: 2\r\nconnection: close\r\n\r\nok",
        );
        let reader = StreamReader::open(&url, 1024, &CancelToken::new()).unwrap();
        let handle = reader.handle();
        assert!(!handle.is_closed());
        drop(reader);
        assert!(handle.is_closed());
    }

    #[test]
    fn seek_supports_position_queries_and_forward_skips_only() {
        let url = spawn_http_server(
            b"HTTP/1.1 200 OK\r\ncontent-length: 10\r\nconnection: close\r\n\r\n0123456789",
        );
        let mut reader = StreamReader::open(&url, 1024, &CancelToken::new()).unwrap();

        assert_eq!(reader.seek(SeekFrom::Current(0)).unwrap(), 0);
        assert_eq!(reader.seek(SeekFrom::Start(4)).unwrap(), 4);

        let mut rest = Vec::new();
        reader.read_to_end(&mut rest).unwrap();
        assert_eq!(rest, b"456789");

        assert!(reader.seek(SeekFrom::Start(0)).is_err());
        assert!(reader.seek(SeekFrom::End(0)).is_err());
    }

    #[test]
    fn stream_health_bands() {
        assert_eq!(stream_health(0), "streaming");
        assert_eq!(stream_health(1), "buffering...");
        assert_eq!(stream_health(3), "buffering...");
        assert_eq!(stream_health(4), "slow connection");
        assert_eq!(stream_health(5), "slow connection");
        assert_eq!(stream_health(6), "possible connection problem");
    }
}
