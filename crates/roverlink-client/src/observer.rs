use bytes::Bytes;
use roverlink_wire::Pose;

/// The presentation layer's view of the link.
///
/// Implemented externally (terminal UI, GUI, test recorder). Callbacks are
/// invoked synchronously from whichever thread produced the event: status
/// messages may arrive from both the caller's thread (command and connect
/// failures) and the telemetry thread. The telemetry loop does not read
/// ahead of the observer: a slow callback gates the next socket read.
pub trait RobotObserver: Send + Sync {
    /// A human-readable status or error line.
    fn set_message(&self, text: &str);

    /// The robot reported a new pose.
    fn update_map(&self, pose: Pose);

    /// The robot sent a camera frame.
    fn update_video(&self, frame: Bytes);

    /// The telemetry stream terminated: the robot signaled shutdown, the
    /// connection dropped, or the session disconnected. Fires exactly once
    /// per connect, as the last callback from the telemetry thread.
    fn stream_ended(&self) {}
}
