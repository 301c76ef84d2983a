use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{Result, WireError};
use crate::path::WaypointPath;

/// Outbound command code: stop all motion.
pub const STOP_CODE: i32 = 5;

/// Outbound command code: a waypoint path follows.
pub const PATH_TAG: i32 = 6;

/// Inbound telemetry tags.
pub const TAG_SHUTDOWN: i32 = 0;
pub const TAG_POSE: i32 = 1;
pub const TAG_STATUS: i32 = 2;
pub const TAG_VIDEO: i32 = 3;

/// Default maximum inbound frame payload: 16 MiB.
///
/// Video frames are the only variable-length inbound message of any size;
/// anything larger than this indicates a desynchronized stream.
pub const DEFAULT_MAX_FRAME: usize = 16 * 1024 * 1024;

/// A movement direction with a fixed signed 32-bit wire code.
///
/// The direction code doubles as the command tag on the wire, so the
/// encoding is total by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Backward,
    Left,
    Right,
}

impl Direction {
    /// The wire code for this direction.
    pub fn code(self) -> i32 {
        match self {
            Direction::Forward => 1,
            Direction::Backward => 2,
            Direction::Left => 3,
            Direction::Right => 4,
        }
    }
}

/// One discrete outbound instruction for the robot.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Drive in a direction until superseded or stopped.
    Move(Direction),
    /// Stop all motion.
    Stop,
    /// Hand the robot a waypoint path to follow.
    SendPath(WaypointPath),
    /// Push drive geometry (wheel diameter and track offset) to the robot.
    SendConfig { diameter: f64, offset: f64 },
}

/// A robot pose in the map frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub x: f32,
    pub y: f32,
    pub heading: f32,
}

/// One decoded inbound telemetry message.
#[derive(Debug, Clone, PartialEq)]
pub enum Telemetry {
    /// Position update.
    Pose(Pose),
    /// Human-readable status line from the robot.
    Status(String),
    /// One camera frame (opaque image bytes).
    Video(Bytes),
    /// Sentinel: the robot is ending the telemetry stream.
    Shutdown,
}

/// Encode a command into the wire format.
///
/// Wire format (all fields big-endian):
/// ```text
/// Move      → i32 direction code (1..=4)
/// Stop      → i32 5
/// SendPath  → i32 6, then the path's own encoding
/// SendConfig→ f64 diameter, f64 offset (no tag, exactly 16 bytes)
/// ```
///
/// Total and deterministic: every command value encodes, and equal
/// commands produce equal bytes.
pub fn encode_command(command: &Command, dst: &mut BytesMut) {
    match command {
        Command::Move(direction) => dst.put_i32(direction.code()),
        Command::Stop => dst.put_i32(STOP_CODE),
        Command::SendPath(path) => {
            dst.put_i32(PATH_TAG);
            path.encode_to(dst);
        }
        Command::SendConfig { diameter, offset } => {
            dst.put_f64(*diameter);
            dst.put_f64(*offset);
        }
    }
}

/// Encode a telemetry message into the wire format (the robot side of the
/// link; also used by test fixtures and simulators).
///
/// Wire format (all fields big-endian):
/// ```text
/// Shutdown → i32 0
/// Pose     → i32 1, f32 x, f32 y, f32 heading
/// Status   → i32 2, u16 byte length, UTF-8 text
/// Video    → i32 3, u32 byte length, raw frame bytes
/// ```
pub fn encode_telemetry(message: &Telemetry, dst: &mut BytesMut) -> Result<()> {
    match message {
        Telemetry::Shutdown => dst.put_i32(TAG_SHUTDOWN),
        Telemetry::Pose(pose) => {
            dst.put_i32(TAG_POSE);
            dst.put_f32(pose.x);
            dst.put_f32(pose.y);
            dst.put_f32(pose.heading);
        }
        Telemetry::Status(text) => {
            if text.len() > u16::MAX as usize {
                return Err(WireError::FrameTooLarge {
                    size: text.len(),
                    max: u16::MAX as usize,
                });
            }
            dst.put_i32(TAG_STATUS);
            dst.put_u16(text.len() as u16);
            dst.put_slice(text.as_bytes());
        }
        Telemetry::Video(frame) => {
            if frame.len() > u32::MAX as usize {
                return Err(WireError::FrameTooLarge {
                    size: frame.len(),
                    max: u32::MAX as usize,
                });
            }
            dst.put_i32(TAG_VIDEO);
            dst.put_u32(frame.len() as u32);
            dst.put_slice(frame);
        }
    }
    Ok(())
}

/// Decode one telemetry message from a buffer.
///
/// Returns `Ok(None)` if the buffer does not hold a complete message yet.
/// On success, consumes the message bytes from the buffer.
///
/// Recoverable failures (unknown tag, malformed status text) consume the
/// offending bytes so the stream stays in sync and decoding can continue;
/// see [`WireError::is_recoverable`].
pub fn decode_telemetry(src: &mut BytesMut, max_frame: usize) -> Result<Option<Telemetry>> {
    if src.len() < 4 {
        return Ok(None);
    }

    let tag = i32::from_be_bytes(src[0..4].try_into().expect("slice is 4 bytes"));
    match tag {
        TAG_SHUTDOWN => {
            src.advance(4);
            Ok(Some(Telemetry::Shutdown))
        }
        TAG_POSE => {
            if src.len() < 4 + 12 {
                return Ok(None);
            }
            src.advance(4);
            let x = src.get_f32();
            let y = src.get_f32();
            let heading = src.get_f32();
            Ok(Some(Telemetry::Pose(Pose { x, y, heading })))
        }
        TAG_STATUS => {
            if src.len() < 6 {
                return Ok(None);
            }
            let len = u16::from_be_bytes(src[4..6].try_into().expect("slice is 2 bytes")) as usize;
            if src.len() < 6 + len {
                return Ok(None);
            }
            src.advance(6);
            let raw = src.split_to(len);
            match std::str::from_utf8(raw.as_ref()) {
                Ok(text) => Ok(Some(Telemetry::Status(text.to_string()))),
                Err(_) => Err(WireError::BadStatusText),
            }
        }
        TAG_VIDEO => {
            if src.len() < 8 {
                return Ok(None);
            }
            let len = u32::from_be_bytes(src[4..8].try_into().expect("slice is 4 bytes")) as usize;
            if len > max_frame {
                return Err(WireError::FrameTooLarge {
                    size: len,
                    max: max_frame,
                });
            }
            if src.len() < 8 + len {
                return Ok(None);
            }
            src.advance(8);
            let frame = src.split_to(len).freeze();
            Ok(Some(Telemetry::Video(frame)))
        }
        other => {
            // Consume the bad tag so the caller can resynchronize.
            src.advance(4);
            Err(WireError::UnknownTag(other))
        }
    }
}
