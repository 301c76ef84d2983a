use std::io::Read;
use std::sync::Arc;
use std::thread::JoinHandle;

use roverlink_wire::{Telemetry, TelemetryReader, WireError};
use tracing::{debug, warn};

use crate::error::ClientError;
use crate::observer::RobotObserver;

/// Background decoder for the inbound telemetry stream.
///
/// Lifecycle is one-way: spawned, running, terminated. A terminated
/// receiver is never restarted; each successful connect creates a fresh
/// one. The loop blocks on the socket's read half; the session unblocks it
/// by shutting the socket down, which the loop observes as a read error or
/// EOF and treats as a normal termination trigger.
pub struct TelemetryReceiver {
    handle: JoinHandle<()>,
}

impl TelemetryReceiver {
    /// Spawn the receive loop on a dedicated thread.
    pub fn spawn<R>(stream: R, observer: Arc<dyn RobotObserver>) -> std::io::Result<Self>
    where
        R: Read + Send + 'static,
    {
        let handle = std::thread::Builder::new()
            .name("roverlink-telemetry".to_string())
            .spawn(move || receive_loop(TelemetryReader::new(stream), observer))?;
        Ok(Self { handle })
    }

    /// Wait for the receive loop to terminate.
    ///
    /// The caller must have closed the socket first, or this blocks until
    /// the robot ends the stream. After this returns, no further observer
    /// callback fires from this receiver.
    pub fn stop(self) -> Result<(), ClientError> {
        self.handle.join().map_err(|panic| {
            let reason = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "receiver thread panicked".to_string());
            ClientError::ReceiverTermination(reason)
        })
    }
}

/// Decode-and-dispatch loop.
///
/// Dispatch is synchronous: the observer callback gates the next socket
/// read, bounding buffering to one in-flight message.
fn receive_loop<R: Read>(mut reader: TelemetryReader<R>, observer: Arc<dyn RobotObserver>) {
    loop {
        match reader.read_message() {
            Ok(Telemetry::Pose(pose)) => observer.update_map(pose),
            Ok(Telemetry::Status(text)) => observer.set_message(&text),
            Ok(Telemetry::Video(frame)) => observer.update_video(frame),
            Ok(Telemetry::Shutdown) => {
                debug!("robot ended telemetry stream");
                break;
            }
            Err(err) if err.is_recoverable() => {
                warn!(error = %err, "malformed telemetry message");
                observer.set_message(&format!("telemetry decode error: {err}"));
            }
            Err(WireError::ConnectionClosed) => {
                debug!("telemetry stream closed");
                break;
            }
            Err(err) => {
                warn!(error = %err, "telemetry stream failed");
                break;
            }
        }
    }
    observer.stream_ended();
}
