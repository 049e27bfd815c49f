//! Radar detection records as delivered by a recorded sequence

use crate::sensor::get_mounting;
use crate::vertex::{Point3f, Vector3f};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A single radar detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RadarDetection {
    /// Measurement time in microseconds
    pub timestamp: u64,
    pub sensor_id: u8,
    /// Range in sensor coordinates (m)
    pub range_sc: f32,
    /// Azimuth in sensor coordinates (rad)
    pub azimuth_sc: f32,
    /// Radar cross-section (dBsm)
    pub rcs: f32,
    /// Raw radial velocity (m/s)
    pub vr: f32,
    /// Ego-motion compensated radial velocity (m/s)
    pub vr_compensated: f32,
    /// Position in car coordinates
    pub x_cc: f32,
    pub y_cc: f32,
    /// Position in sequence (world) coordinates
    pub x_seq: f32,
    pub y_seq: f32,
    pub uuid: String,
    pub track_id: String,
    pub label_id: i32,
}

impl Default for RadarDetection {
    fn default() -> Self {
        Self {
            timestamp: 0,
            sensor_id: 0,
            range_sc: 0.0,
            azimuth_sc: 0.0,
            rcs: 0.0,
            vr: 0.0,
            vr_compensated: 0.0,
            x_cc: 0.0,
            y_cc: 0.0,
            x_seq: 0.0,
            y_seq: 0.0,
            uuid: String::new(),
            track_id: String::new(),
            label_id: -1,
        }
    }
}

impl RadarDetection {
    /// Position in car coordinates, on the ground plane
    pub fn position(&self) -> Point3f {
        Point3f::new(self.x_cc, self.y_cc, 0.0)
    }

    /// Compensated radial velocity as a vector in car coordinates.
    ///
    /// Unknown sensors are treated as boresight-aligned with the car.
    pub fn velocity_vector(&self) -> Vector3f {
        let yaw = get_mounting(self.sensor_id).map(|m| m.yaw).unwrap_or(0.0);
        let angle = self.azimuth_sc + yaw;
        Vector3f::new(
            self.vr_compensated * angle.cos(),
            self.vr_compensated * angle.sin(),
            0.0,
        )
    }

    /// Multi-line description shown when the detection is selected
    pub fn info_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for RadarDetection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Timestamp: {}", self.timestamp)?;
        writeln!(f, "Sensor ID: {}", self.sensor_id)?;
        writeln!(f, "Range: {:.2} m", self.range_sc)?;
        writeln!(f, "Azimuth: {:.2} deg", self.azimuth_sc.to_degrees())?;
        writeln!(f, "RCS: {:.2} dBsm", self.rcs)?;
        writeln!(f, "Radial velocity: {:.2} m/s", self.vr)?;
        writeln!(f, "Compensated velocity: {:.2} m/s", self.vr_compensated)?;
        writeln!(f, "Car coordinates: ({:.2}, {:.2})", self.x_cc, self.y_cc)?;
        writeln!(f, "Sequence coordinates: ({:.2}, {:.2})", self.x_seq, self.y_seq)?;
        writeln!(f, "Label ID: {}", self.label_id)?;
        writeln!(f, "Track ID: {}", self.track_id)?;
        write!(f, "UUID: {}", self.uuid)
    }
}
