//! Waypoint paths.
//!
//! A path is an opaque blob as far as the command encoder is concerned:
//! the encoder emits the path tag and the path writes its own bytes.

use bytes::{Buf, BufMut, BytesMut};
use serde::{Deserialize, Serialize};

/// One waypoint: a target pose in the map frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub x: f32,
    pub y: f32,
    pub heading: f32,
}

/// An ordered sequence of waypoints for the robot to follow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WaypointPath(Vec<Waypoint>);

impl WaypointPath {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn push(&mut self, waypoint: Waypoint) {
        self.0.push(waypoint);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.0
    }

    /// Encode the path: big-endian i32 waypoint count, then
    /// `f32 x, f32 y, f32 heading` per waypoint.
    pub fn encode_to(&self, dst: &mut BytesMut) {
        dst.put_i32(self.0.len() as i32);
        for waypoint in &self.0 {
            dst.put_f32(waypoint.x);
            dst.put_f32(waypoint.y);
            dst.put_f32(waypoint.heading);
        }
    }

    /// Decode a path from a buffer (the robot side of the link; also used
    /// by test fixtures). Returns `None` if the buffer is incomplete.
    pub fn decode(src: &mut BytesMut) -> Option<Self> {
        if src.len() < 4 {
            return None;
        }
        let count = i32::from_be_bytes(src[0..4].try_into().expect("slice is 4 bytes"));
        if count < 0 {
            return None;
        }
        let count = count as usize;
        if src.len() < 4 + count * 12 {
            return None;
        }

        src.advance(4);
        let mut waypoints = Vec::with_capacity(count);
        for _ in 0..count {
            waypoints.push(Waypoint {
                x: src.get_f32(),
                y: src.get_f32(),
                heading: src.get_f32(),
            });
        }
        Some(Self(waypoints))
    }
}

impl From<Vec<Waypoint>> for WaypointPath {
    fn from(waypoints: Vec<Waypoint>) -> Self {
        Self(waypoints)
    }
}
