use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_PATH_SEPARATOR: &str = " / ";

/// Depth past which nodes are dropped from every traversal. Category trees
/// from the backend are a handful of levels deep; anything beyond this is
/// treated as corrupt input.
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// Settings threaded explicitly into the operations that need them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CategoryConfig {
    pub path_separator: String,
    pub max_depth: usize,
}

impl Default for CategoryConfig {
    fn default() -> Self {
        CategoryConfig {
            path_separator: DEFAULT_PATH_SEPARATOR.to_string(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl CategoryConfig {
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.path_separator = separator.into();
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Missing fields fall back to their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: CategoryConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.path_separator.is_empty() {
            return Err(ConfigError::EmptySeparator);
        }
        if self.max_depth == 0 {
            return Err(ConfigError::ZeroDepth);
        }
        Ok(())
    }
}
