//! Robot control session management for roverlink.
//!
//! This is the "just works" layer: a [`Session`] owns the TCP link to the
//! robot, writes encoded commands on the caller's thread, and runs a
//! background [`TelemetryReceiver`] that decodes inbound telemetry and
//! dispatches it to a [`RobotObserver`].
//!
//! Commands are one-way and unacknowledged. The protocol favors low latency
//! for interactive control over delivery guarantees: a dropped "move"
//! self-corrects on the next input, so a failed write is reported to the
//! observer but does not tear the session down.

pub mod config;
pub mod error;
pub mod observer;
pub mod receiver;
pub mod session;

pub use config::{ConfigError, ConfigStore, JsonConfigStore, RobotConfig};
pub use error::{ClientError, Result};
pub use observer::RobotObserver;
pub use receiver::TelemetryReceiver;
pub use session::Session;

pub use roverlink_wire::{Command, Direction, Pose, Telemetry, Waypoint, WaypointPath};
