//! Board configuration.

use crate::geometry::CONNECTOR_MARGIN;
use crate::history::MAX_UNDO_HISTORY;
use crate::proximity::{HoverBufferConfig, ProximityThresholds};
use crate::snap::ALIGNMENT_TOLERANCE;
use crate::viewport::{MAX_ZOOM, MIN_ZOOM};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default connection snap radius in screen units.
pub const CONNECTION_SNAP_THRESHOLD: f64 = 40.0;

/// Errors from loading or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid config JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error("zoom range [{min}, {max}] is empty or not positive")]
    InvalidZoomRange { min: f64, max: f64 },
    #[error("{field} must be a positive finite number, got {value}")]
    NotPositive { field: &'static str, value: f64 },
    #[error("proximity thresholds must satisfy primary <= secondary")]
    ThresholdOrder,
    #[error("history limit must be at least 1")]
    EmptyHistory,
}

/// Tunables for a [`Board`](crate::Board).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BoardConfig {
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Maximum number of undo states.
    pub history_limit: usize,
    /// Inward margin on the destination end of attached connectors.
    pub connector_margin: f64,
    /// Anchor snap radius for connection gestures, in screen units.
    pub connection_snap_threshold: f64,
    /// Drag alignment tolerance, in canvas units.
    pub alignment_tolerance: f64,
    /// Padding used by fit-to-content, in screen units.
    pub fit_padding: f64,
    pub proximity: ProximityThresholds,
    pub hover: HoverBufferConfig,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
            history_limit: MAX_UNDO_HISTORY,
            connector_margin: CONNECTOR_MARGIN,
            connection_snap_threshold: CONNECTION_SNAP_THRESHOLD,
            alignment_tolerance: ALIGNMENT_TOLERANCE,
            fit_padding: 50.0,
            proximity: ProximityThresholds::default(),
            hover: HoverBufferConfig::default(),
        }
    }
}

impl BoardConfig {
    /// Parse and validate a JSON configuration. Missing keys take defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.min_zoom.is_finite() && self.max_zoom.is_finite())
            || self.min_zoom <= 0.0
            || self.min_zoom > self.max_zoom
        {
            return Err(ConfigError::InvalidZoomRange {
                min: self.min_zoom,
                max: self.max_zoom,
            });
        }
        if self.history_limit == 0 {
            return Err(ConfigError::EmptyHistory);
        }
        for (field, value) in [
            ("connectionSnapThreshold", self.connection_snap_threshold),
            ("alignmentTolerance", self.alignment_tolerance),
            ("proximity.primary", self.proximity.primary),
            ("proximity.secondary", self.proximity.secondary),
            ("hover.baseBuffer", self.hover.base_buffer),
            ("hover.denseBuffer", self.hover.dense_buffer),
            ("hover.densityRadius", self.hover.density_radius),
        ] {
            if !value.is_finite() || value <= 0.0 {
                return Err(ConfigError::NotPositive { field, value });
            }
        }
        if !self.connector_margin.is_finite() || self.connector_margin < 0.0 {
            return Err(ConfigError::NotPositive {
                field: "connectorMargin",
                value: self.connector_margin,
            });
        }
        if self.proximity.primary > self.proximity.secondary {
            return Err(ConfigError::ThresholdOrder);
        }
        Ok(())
    }
}
