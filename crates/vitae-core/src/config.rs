//! Editor configuration.

use crate::snapshot::{DEFAULT_BACKGROUND, DEFAULT_VERSION};
use kurbo::{Rect, Size, Vec2};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Default number of undo entries kept per session.
pub const MAX_UNDO_HISTORY: usize = 50;

/// Errors raised while loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Tunables for an editing session. Every field has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditorConfig {
    pub canvas_width: f64,
    pub canvas_height: f64,
    pub background: String,
    /// Version tag stamped on new snapshots.
    pub version: String,
    /// Undo entries kept before the oldest are dropped.
    pub history_limit: usize,
    pub paste_offset_x: f64,
    pub paste_offset_y: f64,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            canvas_width: 600.0,
            canvas_height: 1000.0,
            background: DEFAULT_BACKGROUND.to_string(),
            version: DEFAULT_VERSION.to_string(),
            history_limit: MAX_UNDO_HISTORY,
            paste_offset_x: 20.0,
            paste_offset_y: 20.0,
        }
    }
}

impl EditorConfig {
    /// Parse a JSON configuration. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.history_limit == 0 {
            return Err(ConfigError::Invalid(
                "historyLimit must be at least 1".to_string(),
            ));
        }
        if self.canvas_width <= 0.0 || self.canvas_height <= 0.0 {
            return Err(ConfigError::Invalid(
                "canvas dimensions must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn canvas_size(&self) -> Size {
        Size::new(self.canvas_width, self.canvas_height)
    }

    pub fn canvas_rect(&self) -> Rect {
        self.canvas_size().to_rect()
    }

    pub fn paste_offset(&self) -> Vec2 {
        Vec2::new(self.paste_offset_x, self.paste_offset_y)
    }
}
