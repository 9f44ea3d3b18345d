//! Error taxonomy shared across the crate.
//!
//! Library code returns `Error`; the binary edge wraps it in `anyhow` for
//! display. Network failures at connect time map to `Connection`, non-success
//! HTTP statuses to `Upstream`, malformed audio to `Decode`.

use std::io;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Network-level failure (dial, TLS, reset). Retryable by replaying the command.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The remote answered with a non-success HTTP status. Not retried automatically.
    #[error("unexpected upstream status: {status}")]
    Upstream { status: u16 },

    /// Malformed or truncated audio data. Fatal for the session.
    #[error("audio decode failed: {0}")]
    Decode(String),

    /// Audio output device could not be opened or driven.
    #[error("audio output error: {0}")]
    Audio(String),

    /// Unknown track id.
    #[error("no track with id {0}")]
    NotFound(u64),

    /// Malformed or missing configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Bad user input (non-numeric id, unrecognized URL, ...).
    #[error("{0}")]
    Validation(String),

    /// The controlling cancel token fired while an operation was in flight.
    #[error("operation cancelled")]
    Cancelled,

    /// Catalog file could not be parsed or written.
    #[error("catalog error: {0}")]
    Catalog(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::Catalog(err.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            Error::Upstream {
                status: status.as_u16(),
            }
        } else {
            Error::Connection(err.to_string())
        }
    }
}
