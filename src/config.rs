//! Session configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::fit::{DisplayMode, FitParams};
use crate::view::ZoomLimits;

/// Errors raised while loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A field holds an unusable value.
    #[error("invalid config value for {field}: {message}")]
    Invalid {
        /// Field name.
        field: &'static str,
        /// What is wrong with it.
        message: String,
    },

    /// The input is not valid config JSON.
    #[error("malformed config: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ConfigError {
    /// Create an invalid-value error.
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            message: message.into(),
        }
    }
}

/// Configuration for an interactive map session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Allowed interactive zoom range.
    pub zoom_limits: ZoomLimits,
    /// Pixel radius for pointer hit testing.
    pub tolerance_px: f64,
    /// Tooltip width used for edge clamping.
    pub tooltip_width_px: f64,
    /// Minimum gap between a tooltip and the container edge.
    pub tooltip_edge_px: f64,
    /// Initial display mode.
    pub display_mode: DisplayMode,
    /// Fit parameters for embedded maps.
    pub embedded_fit: FitParams,
    /// Fit parameters for full-screen maps.
    pub fullscreen_fit: FitParams,
    /// Marker radius of an unselected point.
    pub point_radius_px: f32,
    /// Marker radius of the selected point.
    pub selected_radius_px: f32,
    /// Opacity of points and labels de-emphasized by an expanded tooltip.
    pub dimmed_opacity: f32,
    /// Opacity of cluster labels.
    pub label_opacity: f32,
    /// Ignore dominantly vertical drags so the page can scroll.
    pub vertical_drag_scrolls: bool,
    /// Cell size of the hit-test grid, in pixels.
    pub grid_cell_px: f64,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            zoom_limits: ZoomLimits::default(),
            tolerance_px: 12.0,
            tooltip_width_px: 200.0,
            tooltip_edge_px: 10.0,
            display_mode: DisplayMode::Embedded,
            embedded_fit: FitParams::embedded(),
            fullscreen_fit: FitParams::full_screen(),
            point_radius_px: 4.0,
            selected_radius_px: 8.0,
            dimmed_opacity: 0.3,
            label_opacity: 0.85,
            vertical_drag_scrolls: true,
            grid_cell_px: 32.0,
        }
    }
}

impl MapConfig {
    /// Parse and validate a configuration from JSON. Missing fields take
    /// their defaults.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Fit parameters for a display mode.
    pub fn fit_params(&self, mode: DisplayMode) -> FitParams {
        match mode {
            DisplayMode::Embedded => self.embedded_fit,
            DisplayMode::FullScreen => self.fullscreen_fit,
        }
    }

    /// Check that every field is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let limits = self.zoom_limits;
        if !(limits.min.is_finite() && limits.max.is_finite()) || limits.min <= 0.0 {
            return Err(ConfigError::invalid(
                "zoom_limits",
                format!("expected finite positive bounds, got {}..{}", limits.min, limits.max),
            ));
        }
        if limits.min > limits.max {
            return Err(ConfigError::invalid(
                "zoom_limits",
                format!("min {} exceeds max {}", limits.min, limits.max),
            ));
        }
        for (field, value) in [
            ("tolerance_px", self.tolerance_px),
            ("tooltip_width_px", self.tooltip_width_px),
            ("tooltip_edge_px", self.tooltip_edge_px),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::invalid(field, format!("expected >= 0, got {value}")));
            }
        }
        if !self.grid_cell_px.is_finite() || self.grid_cell_px <= 0.0 {
            return Err(ConfigError::invalid(
                "grid_cell_px",
                format!("expected > 0, got {}", self.grid_cell_px),
            ));
        }
        for (field, params) in [
            ("embedded_fit", self.embedded_fit),
            ("fullscreen_fit", self.fullscreen_fit),
        ] {
            let values = [params.width_fraction, params.margin_factor, params.scale_factor];
            if values.iter().any(|v| !v.is_finite() || *v <= 0.0) {
                return Err(ConfigError::invalid(field, "fit factors must be positive"));
            }
        }
        for (field, value) in [
            ("dimmed_opacity", self.dimmed_opacity),
            ("label_opacity", self.label_opacity),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::invalid(field, format!("expected 0..=1, got {value}")));
            }
        }
        Ok(())
    }
}
