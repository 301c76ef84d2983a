/// Errors that can occur in session operations.
///
/// None of these escape the session boundary as panics; they are either
/// returned to the caller or surfaced to the observer as messages.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The socket could not be opened (unreachable, refused, or timed out).
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        source: std::io::Error,
    },

    /// The telemetry receiver did not terminate cleanly.
    #[error("telemetry receiver did not stop cleanly: {0}")]
    ReceiverTermination(String),

    /// I/O error outside the wire protocol (socket setup, clone, shutdown).
    #[error("link I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, ClientError>;
