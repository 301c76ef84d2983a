/// Errors that can occur while encoding or decoding the robot link.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    /// The inbound stream carried a tag this decoder does not know.
    #[error("unknown telemetry tag {0}")]
    UnknownTag(i32),

    /// A status message carried bytes that are not valid UTF-8.
    #[error("status text is not valid UTF-8")]
    BadStatusText,

    /// A declared payload length exceeds the configured maximum.
    #[error("frame too large ({size} bytes, max {max})")]
    FrameTooLarge { size: usize, max: usize },

    /// An I/O error occurred while reading or writing the stream.
    #[error("wire I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The connection closed before a complete message was received.
    #[error("connection closed (incomplete message)")]
    ConnectionClosed,
}

impl WireError {
    /// True when the decoder consumed the offending bytes and the stream is
    /// still in sync, so the caller may keep reading. Stream-level failures
    /// (I/O, EOF, an implausible length) are not recoverable.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, WireError::UnknownTag(_) | WireError::BadStatusText)
    }
}

pub type Result<T> = std::result::Result<T, WireError>;
