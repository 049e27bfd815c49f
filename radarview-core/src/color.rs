//! Color palette and detection color mapping

use crate::detection::RadarDetection;
use crate::vertex::Color;
use serde::{Deserialize, Serialize};

/// Named palette colors as hex strings
pub struct Colors;

impl Colors {
    pub const RED: &'static str = "#f02b2b";
    pub const BLUE: &'static str = "#4763ff";
    pub const GREEN: &'static str = "#47ff69";
    pub const LIGHT_GREEN: &'static str = "#73ff98";
    pub const ORANGE: &'static str = "#ff962e";
    pub const VIOLET: &'static str = "#c561d4";
    pub const INDIGO: &'static str = "#8695e3";
    pub const GREY: &'static str = "#7f8c8d";
    pub const YELLOW: &'static str = "#ffff33";
    pub const PINK: &'static str = "#ff6eba";
    pub const LIGHT_GRAY: &'static str = "#dedede";

    /// Palette color of a radar sensor
    pub fn sensor_color(sensor_id: u8) -> &'static str {
        match sensor_id {
            1 => Self::RED,
            2 => Self::BLUE,
            3 => Self::GREEN,
            4 => Self::PINK,
            _ => Self::GREY,
        }
    }
}

/// Parse `#rrggbb` into an opaque RGBA color. Malformed input maps to opaque black.
pub fn hex_to_rgba(hex: &str) -> Color {
    let h = hex.trim_start_matches('#');
    let channel = |i: usize| {
        h.get(i..i + 2)
            .and_then(|s| u8::from_str_radix(s, 16).ok())
            .map(|v| v as f32 / 255.0)
            .unwrap_or(0.0)
    };
    [channel(0), channel(2), channel(4), 1.0]
}

/// Linear interpolation between two colors, `t` in `[0, 1]`
pub fn color_gradient(from: Color, to: Color, t: f32) -> Color {
    let mut out = [0.0; 4];
    for i in 0..4 {
        out[i] = from[i] + (to[i] - from[i]) * t;
    }
    out
}

/// Which attribute drives the color of a detection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorBy {
    #[default]
    Doppler,
    Rcs,
    SensorId,
    Uniform,
}

impl ColorBy {
    pub const ALL: [ColorBy; 4] = [ColorBy::Doppler, ColorBy::Rcs, ColorBy::SensorId, ColorBy::Uniform];

    /// Human readable label
    pub fn label(&self) -> &'static str {
        match self {
            ColorBy::Doppler => "Doppler Velocity",
            ColorBy::Rcs => "RCS",
            ColorBy::SensorId => "Sensor ID",
            ColorBy::Uniform => "Uniform",
        }
    }

    /// The next mode in display order, wrapping around
    pub fn next(self) -> Self {
        let i = Self::ALL.iter().position(|m| *m == self).unwrap_or(0);
        Self::ALL[(i + 1) % Self::ALL.len()]
    }
}

const UNIFORM_COLOR: Color = [0.95, 0.95, 1.0, 1.0];

/// Color of a detection under the given mode
pub fn detection_color(detection: &RadarDetection, mode: ColorBy) -> Color {
    match mode {
        ColorBy::Doppler => {
            let t = (detection.vr_compensated.clamp(-10.0, 10.0) + 10.0) / 20.0;
            color_gradient(hex_to_rgba(Colors::BLUE), hex_to_rgba(Colors::RED), t)
        }
        ColorBy::Rcs => {
            let t = (detection.rcs.clamp(-20.0, 20.0) + 20.0) / 40.0;
            hex_to_rgba(Colors::GREEN).map(|c| c * t)
        }
        ColorBy::SensorId => hex_to_rgba(Colors::sensor_color(detection.sensor_id)),
        ColorBy::Uniform => UNIFORM_COLOR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_hex_to_rgba() {
        assert_eq!(hex_to_rgba("#ff0000"), [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(hex_to_rgba("00ff00"), [0.0, 1.0, 0.0, 1.0]);
        assert_eq!(hex_to_rgba("#zz"), [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_doppler_endpoints() {
        let mut detection = RadarDetection::default();
        detection.vr_compensated = -50.0;
        assert_eq!(detection_color(&detection, ColorBy::Doppler), hex_to_rgba(Colors::BLUE));
        detection.vr_compensated = 10.0;
        let red = detection_color(&detection, ColorBy::Doppler);
        for (a, b) in red.iter().zip(hex_to_rgba(Colors::RED).iter()) {
            assert_relative_eq!(a, b, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_rcs_scales_green() {
        let mut detection = RadarDetection::default();
        detection.rcs = 0.0;
        let c = detection_color(&detection, ColorBy::Rcs);
        let green = hex_to_rgba(Colors::GREEN);
        assert_relative_eq!(c[1], green[1] * 0.5, epsilon = 1e-6);
        assert_relative_eq!(c[3], 0.5, epsilon = 1e-6);
    }

    #[test]
    fn test_sensor_palette_and_cycle() {
        let detection = RadarDetection { sensor_id: 3, ..Default::default() };
        assert_eq!(detection_color(&detection, ColorBy::SensorId), hex_to_rgba(Colors::GREEN));
        assert_eq!(ColorBy::Uniform.next(), ColorBy::Doppler);
        assert_eq!(ColorBy::Doppler.next(), ColorBy::Rcs);
    }
}
