use std::io::{ErrorKind, Read};

use bytes::BytesMut;
use tracing::{debug, trace};

use crate::codec::{decode_telemetry, Telemetry, DEFAULT_MAX_FRAME};
use crate::error::{Result, WireError};

const INITIAL_BUFFER_CAPACITY: usize = 8 * 1024;
const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Reads complete telemetry messages from any `Read` stream.
///
/// Handles partial reads internally; callers always get complete messages.
/// Recoverable decode errors leave the stream in sync; the caller decides
/// whether to keep reading (see [`WireError::is_recoverable`]).
pub struct TelemetryReader<T> {
    inner: T,
    buf: BytesMut,
    max_frame: usize,
}

impl<T: Read> TelemetryReader<T> {
    /// Create a reader with the default frame cap.
    pub fn new(inner: T) -> Self {
        Self::with_max_frame(inner, DEFAULT_MAX_FRAME)
    }

    /// Create a reader with an explicit maximum inbound frame size.
    pub fn with_max_frame(inner: T, max_frame: usize) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            max_frame,
        }
    }

    /// Read the next complete telemetry message (blocking).
    ///
    /// Returns `Err(WireError::ConnectionClosed)` when EOF is reached.
    pub fn read_message(&mut self) -> Result<Telemetry> {
        loop {
            match decode_telemetry(&mut self.buf, self.max_frame) {
                Ok(Some(message)) => {
                    trace!(buffered = self.buf.len(), "decoded telemetry message");
                    return Ok(message);
                }
                Ok(None) => {}
                Err(err) => {
                    debug!(error = %err, buffered = self.buf.len(), "telemetry decode failed");
                    return Err(err);
                }
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(WireError::Io(err)),
            };

            if read == 0 {
                return Err(WireError::ConnectionClosed);
            }

            self.buf.extend_from_slice(&chunk[..read]);
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}
