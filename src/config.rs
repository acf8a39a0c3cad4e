// src/config.rs

//! Construction-time configuration for a rendering surface.
//!
//! The options are deliberately small: initial pixel dimensions and the
//! animation interval. Everything else (pixel-format requirements, provider
//! selection) is decided by the platform layer. Defaults are provided for
//! every field so a partial configuration file deserializes cleanly.

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Recognized construction-time options for a [`crate::surface::Surface`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    /// Initial width of the rendering area in pixels. The host toolkit's
    /// configure events override this once the window is on screen.
    pub width: u16,
    /// Initial height of the rendering area in pixels.
    pub height: u16,
    /// Delay in milliseconds between the end of one redraw cycle and the
    /// scheduling of the next. `0` disables self-rescheduling entirely; the
    /// surface then redraws only on expose and resize events.
    ///
    /// Note the resulting frame period is `(redraw duration) + interval`,
    /// not a fixed wall-clock rate.
    pub animate_interval_ms: u64,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        SurfaceConfig {
            width: 640,
            height: 480,
            animate_interval_ms: 0,
        }
    }
}

impl SurfaceConfig {
    /// Parses a configuration from a JSON string. Missing fields take their
    /// defaults.
    pub fn from_json_str(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json).context("failed to parse surface configuration JSON")
    }

    /// Loads a configuration from a JSON file on disk.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read configuration file {}", path.display()))?;
        Self::from_json_str(&contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_should_provide_sensible_defaults() {
        let config = SurfaceConfig::default();
        assert_eq!(config.width, 640);
        assert_eq!(config.height, 480);
        assert_eq!(config.animate_interval_ms, 0);
    }

    #[test]
    fn it_should_fill_missing_fields_from_defaults() {
        let config = SurfaceConfig::from_json_str(r#"{"animate_interval_ms": 16}"#).unwrap();
        assert_eq!(config.width, 640);
        assert_eq!(config.height, 480);
        assert_eq!(config.animate_interval_ms, 16);
    }

    #[test]
    fn it_should_round_trip_through_json() {
        let config = SurfaceConfig {
            width: 320,
            height: 200,
            animate_interval_ms: 1,
        };
        let json = serde_json::to_string(&config).unwrap();
        let parsed = SurfaceConfig::from_json_str(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn it_should_reject_malformed_json() {
        assert!(SurfaceConfig::from_json_str("{width:").is_err());
    }
}
