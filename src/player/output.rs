//! The process-wide audio output resource.
//!
//! rodio wants the `OutputStream` kept alive for as long as anything plays
//! through it. `AudioOutput` owns it behind lazy one-time initialization so
//! the device is only opened once a track actually decodes, and every
//! session connects its own fresh `Sink` to the shared mixer.

use std::sync::Mutex;

use rodio::{OutputStream, OutputStreamBuilder, Sink};

use crate::error::Error;

pub struct AudioOutput {
    stream: Mutex<Option<OutputStream>>,
}

impl AudioOutput {
    pub fn new() -> Self {
        Self {
            stream: Mutex::new(None),
        }
    }

    pub(super) fn connect_sink(&self) -> Result<Sink, Error> {
        let mut guard = self
            .stream
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if guard.is_none() {
            let mut stream = OutputStreamBuilder::open_default_stream()
                .map_err(|err| Error::Audio(err.to_string()))?;
            // rodio logs to stderr when OutputStream is dropped. That's useful in
            // debugging, but noisy for an app that owns the terminal.
            stream.log_on_drop(false);
            *guard = Some(stream);
        }

        let Some(stream) = guard.as_ref() else {
            return Err(Error::Audio("audio output unavailable".to_string()));
        };
        Ok(Sink::connect_new(stream.mixer()))
    }
}

impl Default for AudioOutput {
    fn default() -> Self {
        Self::new()
    }
}
