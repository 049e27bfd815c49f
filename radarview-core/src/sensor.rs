//! Radar sensor mounting positions on the test vehicle

use crate::vertex::Point3f;
use serde::{Deserialize, Serialize};

/// Position and orientation of a radar sensor in car coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SensorMounting {
    /// Longitudinal offset from the rear axle in meters
    pub x: f32,
    /// Lateral offset in meters, positive to the left
    pub y: f32,
    /// Boresight yaw in radians
    pub yaw: f32,
}

const MOUNTINGS: [(u8, SensorMounting); 4] = [
    (1, SensorMounting { x: 3.663, y: -0.873, yaw: -1.484_185_5 }),
    (2, SensorMounting { x: 3.86, y: -0.70, yaw: -0.436_185_66 }),
    (3, SensorMounting { x: 3.86, y: 0.70, yaw: 0.436 }),
    (4, SensorMounting { x: 3.663, y: 0.873, yaw: 1.484 }),
];

/// Mounting of the sensor with the given id, if known
pub fn get_mounting(sensor_id: u8) -> Option<SensorMounting> {
    MOUNTINGS
        .iter()
        .find(|(id, _)| *id == sensor_id)
        .map(|(_, mounting)| *mounting)
}

impl SensorMounting {
    /// Convert a polar measurement in sensor coordinates into car coordinates
    pub fn polar_to_car(&self, range: f32, azimuth: f32) -> Point3f {
        let angle = azimuth + self.yaw;
        Point3f::new(
            range * angle.cos() + self.x,
            range * angle.sin() + self.y,
            0.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_known_sensors() {
        for id in 1..=4 {
            assert!(get_mounting(id).is_some());
        }
        assert!(get_mounting(0).is_none());
        assert!(get_mounting(5).is_none());
    }

    #[test]
    fn test_polar_to_car_boresight() {
        let mounting = SensorMounting { x: 1.0, y: 2.0, yaw: 0.0 };
        let p = mounting.polar_to_car(10.0, 0.0);
        assert_relative_eq!(p.x, 11.0);
        assert_relative_eq!(p.y, 2.0);
    }
}
