use serde::{Deserialize, Serialize};

use crate::{
    grid::DEFAULT_PIXELS_PER_LINE,
    viewport::{DEFAULT_MAX_SCALE, DEFAULT_MIN_SCALE, DEFAULT_ZOOM_FACTOR},
    PlotError, PlotPoint, PlotResult, Viewport,
};

/// Serializable viewport settings. Every field is optional in JSON.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewportConfig {
    pub width: u32,
    pub height: u32,
    pub center: PlotPoint,
    /// Pixels per world unit.
    pub scale: f64,
    pub zoom_factor: f64,
    pub min_scale: f64,
    pub max_scale: f64,
    /// Target spacing between grid lines, in pixels.
    pub pixels_per_line: f64,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        ViewportConfig {
            width: 800,
            height: 600,
            center: PlotPoint::default(),
            scale: 40.0,
            zoom_factor: DEFAULT_ZOOM_FACTOR,
            min_scale: DEFAULT_MIN_SCALE,
            max_scale: DEFAULT_MAX_SCALE,
            pixels_per_line: DEFAULT_PIXELS_PER_LINE,
        }
    }
}

impl ViewportConfig {
    pub fn from_json(json: &str) -> PlotResult<Self> {
        let config: ViewportConfig =
            serde_json::from_str(json).map_err(|e| PlotError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> PlotResult<()> {
        if !(self.pixels_per_line.is_finite() && self.pixels_per_line > 0.0) {
            return Err(PlotError::config(format!(
                "pixels_per_line must be positive, got {}",
                self.pixels_per_line
            )));
        }
        self.viewport().map(|_| ())
    }

    pub fn viewport(&self) -> PlotResult<Viewport> {
        Viewport::new(self.width, self.height, self.center, self.scale)?.with_zoom(
            self.zoom_factor,
            self.min_scale,
            self.max_scale,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_fields() {
        let config = ViewportConfig::from_json(r#"{ "width": 320, "scale": 10.0 }"#).unwrap();
        assert_eq!(config.width, 320);
        assert_eq!(config.height, 600);
        assert_eq!(config.scale, 10.0);
        assert_eq!(config.pixels_per_line, 100.0);

        let vp = config.viewport().unwrap();
        assert_eq!(vp.width(), 320);
        assert_eq!(vp.scale(), 10.0);
        assert_eq!(vp.zoom_factor(), 1.1);
    }

    #[test]
    fn nested_center() {
        let config =
            ViewportConfig::from_json(r#"{ "center": { "x": 2.0, "y": -1.5 } }"#).unwrap();
        assert_eq!(config.viewport().unwrap().center(), PlotPoint::new(2.0, -1.5));
    }

    #[test]
    fn json_round_trip() {
        let config = ViewportConfig {
            width: 1024,
            pixels_per_line: 80.0,
            ..Default::default()
        };
        let json = serde_json::to_string_pretty(&config).unwrap();
        assert_eq!(ViewportConfig::from_json(&json).unwrap(), config);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(ViewportConfig::from_json(r#"{ "scale": -1.0 }"#).is_err());
        assert!(ViewportConfig::from_json(r#"{ "zoom_factor": 0.5 }"#).is_err());
        assert!(ViewportConfig::from_json(r#"{ "pixels_per_line": 0.0 }"#).is_err());
        assert!(ViewportConfig::from_json(r#"{ "width": 0 }"#).is_err());
        assert!(matches!(
            ViewportConfig::from_json(r#"{ "zoom": 2 }"#),
            Err(PlotError::Config(_))
        ));
        assert!(ViewportConfig::from_json("not json").is_err());
    }
}
