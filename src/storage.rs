//! HTTP object-store client used by `add` and `delete`.
//!
//! The store is a plain key-value blob service: objects live at
//! `{endpoint}/{bucket}/{key}` and respond to PUT/DELETE with the
//! configured credentials passed through as basic auth.

use std::io::Read;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::{Body, Client};
use tracing::debug;

use crate::config::StorageSettings;
use crate::error::Error;
use crate::stream::CancelToken;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str = concat!("trackstash/", env!("CARGO_PKG_VERSION"));

pub struct Storage {
    client: Client,
    endpoint: String,
    bucket: String,
    access_key: String,
    secret_key: String,
}

impl Storage {
    pub fn new(settings: &StorageSettings) -> Result<Self, Error> {
        if settings.endpoint.trim().is_empty() || settings.bucket.trim().is_empty() {
            return Err(Error::Config(
                "storage.endpoint and storage.bucket must be configured".to_string(),
            ));
        }

        // Uploads of large files can legitimately take a long time; only the
        // connect phase is bounded.
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .timeout(None)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|err| Error::Connection(err.to_string()))?;

        Ok(Self {
            client,
            endpoint: settings.endpoint.trim_end_matches('/').to_string(),
            bucket: settings.bucket.clone(),
            access_key: settings.access_key.clone(),
            secret_key: settings.secret_key.clone(),
        })
    }

    /// Public URL of an object in the configured bucket.
    pub fn object_url(&self, key: &str) -> String {
        format!("{}/{}/{}", self.endpoint, self.bucket, key)
    }

    /// Upload `len` bytes from `reader` under `key` and return the object URL.
    pub fn put(
        &self,
        reader: impl Read + Send + 'static,
        len: u64,
        key: &str,
        cancel: &CancelToken,
    ) -> Result<String, Error> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let url = self.object_url(key);
        let response = self
            .client
            .put(&url)
            .basic_auth(&self.access_key, Some(&self.secret_key))
            .header(reqwest::header::CONTENT_TYPE, "audio/mpeg")
            .body(Body::sized(reader, len))
            .send()
            .map_err(|err| Error::Connection(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Upstream {
                status: status.as_u16(),
            });
        }

        debug!(key, len, "object uploaded");
        Ok(url)
    }

    /// Delete the object stored under `key`.
    pub fn delete(&self, key: &str, cancel: &CancelToken) -> Result<(), Error> {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let response = self
            .client
            .delete(self.object_url(key))
            .basic_auth(&self.access_key, Some(&self.secret_key))
            .send()
            .map_err(|err| Error::Connection(err.to_string()))?;

        let status = response.status();
        // Treat 404 as already gone so delete stays idempotent.
        if !status.is_success() && status != StatusCode::NOT_FOUND {
            return Err(Error::Upstream {
                status: status.as_u16(),
            });
        }

        debug!(key, "object deleted");
        Ok(())
    }

    /// Extract the object key from a stored track URL
    /// (`endpoint/bucket/key...` → `key...`).
    pub fn key_from_url(url: &str) -> Result<String, Error> {
        let parsed = reqwest::Url::parse(url)
            .map_err(|err| Error::Validation(format!("invalid object URL: {err}")))?;

        let path = parsed.path().trim_start_matches('/');
        match path.split_once('/') {
            Some((_bucket, key)) if !key.is_empty() => Ok(key.to_string()),
            _ => Err(Error::Validation(format!(
                "object URL has no bucket/key path: {url}"
            ))),
        }
    }
}

/// `Read` adapter that reports cumulative bytes read, used to drive the
/// upload progress line.
pub struct ProgressReader<R> {
    inner: R,
    bytes_read: u64,
    on_progress: Box<dyn FnMut(u64) + Send>,
}

impl<R: Read> ProgressReader<R> {
    pub fn new(inner: R, on_progress: impl FnMut(u64) + Send + 'static) -> Self {
        Self {
            inner,
            bytes_read: 0,
            on_progress: Box::new(on_progress),
        }
    }
}

impl<R: Read> Read for ProgressReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.bytes_read += n as u64;
        if n > 0 {
            (self.on_progress)(self.bytes_read);
        }
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU64, Ordering};

    fn settings() -> StorageSettings {
        StorageSettings {
            endpoint: "https://blobs.example.net/".to_string(),
            bucket: "music".to_string(),
            access_key: "ak".to_string(),
            secret_key: "sk".to_string(),
        }
    }

    #[test]
    fn new_requires_endpoint_and_bucket() {
        let mut incomplete = settings();
        incomplete.endpoint = String::new();
        assert!(matches!(Storage::new(&incomplete), Err(Error::Config(_))));

        let mut incomplete = settings();
        incomplete.bucket = "  ".to_string();
        assert!(matches!(Storage::new(&incomplete), Err(Error::Config(_))));
    }

    #[test]
    fn object_url_joins_endpoint_bucket_and_key() {
        let storage = Storage::new(&settings()).unwrap();
        assert_eq!(
            storage.object_url("album/track.mp3"),
            "https://blobs.example.net/music/album/track.mp3"
        );
    }

    #[test]
    fn key_from_url_strips_endpoint_and_bucket() {
        assert_eq!(
            Storage::key_from_url("https://blobs.example.net/music/album/track.mp3").unwrap(),
            "album/track.mp3"
        );
        assert!(Storage::key_from_url("https://blobs.example.net/onlybucket").is_err());
        assert!(Storage::key_from_url("not a url").is_err());
    }

    #[test]
    fn progress_reader_reports_cumulative_bytes() {
        let seen = Arc::new(AtomicU64::new(0));
        let seen_in_cb = seen.clone();
        let mut reader = ProgressReader::new(Cursor::new(vec![0u8; 10_000]), move |n| {
            seen_in_cb.store(n, Ordering::SeqCst);
        });

        let mut sink = Vec::new();
        std::io::copy(&mut reader, &mut sink).unwrap();
        assert_eq!(sink.len(), 10_000);
        assert_eq!(seen.load(Ordering::SeqCst), 10_000);
    }
}
