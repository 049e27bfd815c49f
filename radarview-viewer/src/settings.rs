//! Runtime settings of the viewer, optionally loaded from a TOML file

use radarview_core::{Color, ColorBy, Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Viewer settings. Every field has a default, so a settings file only needs
/// to name what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub program_title: String,
    pub dark_mode: bool,
    pub canvas_light_mode_clear_color: Color,
    pub canvas_dark_mode_clear_color: Color,
    pub grid_circle_color: Color,
    pub doppler_arrow_scale: f32,
    pub draw_doppler_arrows: bool,
    pub color_by: ColorBy,

    pub min_circle_range: f32,
    pub max_circle_range: f32,
    pub num_circles: usize,

    /// Detection sprite size before RCS scaling
    pub standard_point_size: f32,
    /// Extra size per dBsm above the weakest detection of the frame
    pub rcs_size_scaling: f32,

    pub detection_capacity: usize,
    pub circle_capacity: usize,
    /// Maximum distance in meters between a click ray and a detection
    pub pick_radius: f32,

    pub window_width: u32,
    pub window_height: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            program_title: "Radar Data Viewer".to_string(),
            dark_mode: true,
            canvas_light_mode_clear_color: [0.92, 0.92, 0.95, 1.0],
            canvas_dark_mode_clear_color: [0.05, 0.05, 0.08, 1.0],
            grid_circle_color: [0.15, 0.15, 0.18, 1.0],
            doppler_arrow_scale: 0.2,
            draw_doppler_arrows: true,
            color_by: ColorBy::Doppler,
            min_circle_range: 10.0,
            max_circle_range: 100.0,
            num_circles: 5,
            standard_point_size: 300.0,
            rcs_size_scaling: 10.0,
            detection_capacity: 50_000,
            circle_capacity: 500,
            pick_radius: 1.0,
            window_width: 1200,
            window_height: 800,
        }
    }
}

impl Settings {
    /// Load and validate settings from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;
        let settings = Self::from_toml_str(&contents)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(contents).map_err(|e| Error::Config(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.min_circle_range >= 0.0 && self.min_circle_range <= self.max_circle_range) {
            return Err(Error::Config(format!(
                "circle ranges must satisfy 0 <= min <= max, got {} and {}",
                self.min_circle_range, self.max_circle_range
            )));
        }
        if self.num_circles == 0 {
            return Err(Error::Config("num_circles must be at least 1".to_string()));
        }
        if self.detection_capacity == 0 || self.circle_capacity == 0 {
            return Err(Error::Config("buffer capacities must be greater than zero".to_string()));
        }
        let scales = [
            ("doppler_arrow_scale", self.doppler_arrow_scale),
            ("standard_point_size", self.standard_point_size),
            ("rcs_size_scaling", self.rcs_size_scaling),
            ("pick_radius", self.pick_radius),
        ];
        if let Some((name, value)) = scales.iter().find(|(_, v)| !(*v >= 0.0)) {
            return Err(Error::Config(format!("{} must be non-negative, got {}", name, value)));
        }
        Ok(())
    }

    /// Canvas background for the current mode
    pub fn clear_color(&self) -> Color {
        if self.dark_mode {
            self.canvas_dark_mode_clear_color
        } else {
            self.canvas_light_mode_clear_color
        }
    }
}

/// Parse a color mode name as used on the command line and in settings files
pub fn parse_color_by(name: &str) -> std::result::Result<ColorBy, String> {
    match name.trim().to_lowercase().replace('-', "_").as_str() {
        "doppler" => Ok(ColorBy::Doppler),
        "rcs" => Ok(ColorBy::Rcs),
        "sensor_id" | "sensor" => Ok(ColorBy::SensorId),
        "uniform" => Ok(ColorBy::Uniform),
        other => Err(format!(
            "unknown color mode '{}', expected one of doppler, rcs, sensor_id, uniform",
            other
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.clear_color(), [0.05, 0.05, 0.08, 1.0]);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let settings = Settings::from_toml_str("dark_mode = false\nnum_circles = 3\ncolor_by = \"rcs\"\n").unwrap();
        assert!(!settings.dark_mode);
        assert_eq!(settings.num_circles, 3);
        assert_eq!(settings.color_by, ColorBy::Rcs);
        assert_eq!(settings.doppler_arrow_scale, 0.2);
        assert_eq!(settings.clear_color(), settings.canvas_light_mode_clear_color);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            Settings::from_toml_str("min_circle_range = 50.0\nmax_circle_range = 10.0\n"),
            Err(Error::Config(_))
        ));
        assert!(Settings::from_toml_str("detection_capacity = 0\n").is_err());
        assert!(Settings::from_toml_str("pick_radius = -1.0\n").is_err());
        assert!(Settings::from_toml_str("dark_mode = \"yes\"\n").is_err());
    }

    #[test]
    fn test_toml_roundtrip() {
        let settings = Settings { num_circles: 8, ..Default::default() };
        let text = settings.to_toml_string().unwrap();
        assert_eq!(Settings::from_toml_str(&text).unwrap(), settings);
    }

    #[test]
    fn test_parse_color_by() {
        assert_eq!(parse_color_by("Doppler"), Ok(ColorBy::Doppler));
        assert_eq!(parse_color_by("sensor-id"), Ok(ColorBy::SensorId));
        assert!(parse_color_by("velocity").is_err());
    }
}
