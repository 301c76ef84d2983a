//! Binary wire protocol for the roverlink robot control link.
//!
//! Two independent byte streams share one socket:
//! - Outbound: discrete operator commands (move, stop, path, config),
//!   encoded as fixed-width big-endian fields.
//! - Inbound: tagged telemetry messages (pose, status text, video frames).
//!
//! This crate is pure serialization plus blocking stream adapters. It owns
//! no sockets; [`CommandWriter`] and [`TelemetryReader`] work over any
//! `Write`/`Read`.

pub mod codec;
pub mod error;
pub mod path;
pub mod reader;
pub mod writer;

pub use codec::{
    decode_telemetry, encode_command, encode_telemetry, Command, Direction, Pose, Telemetry,
    DEFAULT_MAX_FRAME, STOP_CODE,
};
pub use error::{Result, WireError};
pub use path::{Waypoint, WaypointPath};
pub use reader::TelemetryReader;
pub use writer::CommandWriter;
