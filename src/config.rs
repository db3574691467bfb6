//! Explorer and lab configuration.
//!
//! Configuration is plain data with serde support. With the `config-file`
//! feature it can also be loaded from TOML:
//!
//! ```toml
//! seed = 17
//! lazy_reexploration = true
//! virtual_exploration = false
//! ```

use serde::{Deserialize, Serialize};

/// Configuration of an [`Explorer`](crate::explore::Explorer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplorerConfig {
    /// Seed for every arbitrary choice. `None` draws a seed from the OS; the
    /// drawn seed is logged and available from `Explorer::seed`.
    pub seed: Option<u64>,
    /// Replay edges explored in earlier rounds before new backtracking.
    pub lazy_reexploration: bool,
    /// Replay covering subtrees to detect races hidden by covering.
    pub virtual_exploration: bool,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            seed: Some(0),
            lazy_reexploration: true,
            virtual_exploration: true,
        }
    }
}

impl ExplorerConfig {
    /// Default configuration with the given seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }

    /// Default configuration seeded from OS entropy.
    #[must_use]
    pub fn unseeded() -> Self {
        Self {
            seed: None,
            ..Self::default()
        }
    }

    /// Enables or disables lazy re-exploration.
    #[must_use]
    pub const fn with_lazy_reexploration(mut self, enabled: bool) -> Self {
        self.lazy_reexploration = enabled;
        self
    }

    /// Enables or disables virtual exploration of covering subtrees.
    #[must_use]
    pub const fn with_virtual_exploration(mut self, enabled: bool) -> Self {
        self.virtual_exploration = enabled;
        self
    }
}

/// Error loading a configuration file.
#[cfg(feature = "config-file")]
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    /// The file is not valid TOML for this configuration.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[cfg(feature = "config-file")]
impl ExplorerConfig {
    /// Parses a configuration from TOML text. Missing keys take defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Reads and parses a TOML configuration file.
    pub fn from_toml_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}

/// Configuration of a [`LabRunner`](crate::lab::LabRunner).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabConfig {
    /// Explorer settings.
    pub explorer: ExplorerConfig,
    /// Cover a node by an earlier expanded node with the same state.
    pub covering: bool,
    /// Upper bound on node expansions per round.
    pub max_expansions: usize,
}

impl Default for LabConfig {
    fn default() -> Self {
        Self {
            explorer: ExplorerConfig::default(),
            covering: false,
            max_expansions: 100_000,
        }
    }
}

impl LabConfig {
    /// Default lab configuration with the given explorer seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            explorer: ExplorerConfig::new(seed),
            ..Self::default()
        }
    }

    /// Enables or disables covering.
    #[must_use]
    pub const fn with_covering(mut self, enabled: bool) -> Self {
        self.covering = enabled;
        self
    }

    /// Sets the per-round expansion bound.
    #[must_use]
    pub const fn with_max_expansions(mut self, max: usize) -> Self {
        self.max_expansions = max;
        self
    }

    /// Replaces the explorer settings.
    #[must_use]
    pub const fn with_explorer(mut self, explorer: ExplorerConfig) -> Self {
        self.explorer = explorer;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_enable_everything_with_seed_zero() {
        let cfg = ExplorerConfig::default();
        assert_eq!(cfg.seed, Some(0));
        assert!(cfg.lazy_reexploration);
        assert!(cfg.virtual_exploration);
        assert_eq!(ExplorerConfig::unseeded().seed, None);
    }

    #[test]
    fn builders_compose() {
        let cfg = ExplorerConfig::new(9)
            .with_lazy_reexploration(false)
            .with_virtual_exploration(false);
        assert_eq!(cfg.seed, Some(9));
        assert!(!cfg.lazy_reexploration);
        assert!(!cfg.virtual_exploration);

        let lab = LabConfig::new(3).with_covering(true).with_max_expansions(10);
        assert_eq!(lab.explorer.seed, Some(3));
        assert!(lab.covering);
        assert_eq!(lab.max_expansions, 10);
    }

    #[test]
    fn json_missing_fields_take_defaults() {
        let cfg: ExplorerConfig = serde_json::from_str(r#"{"seed": 5}"#).expect("parse");
        assert_eq!(cfg, ExplorerConfig::new(5));
        let lab: LabConfig = serde_json::from_str(r#"{"covering": true}"#).expect("parse");
        assert!(lab.covering);
        assert_eq!(lab.explorer, ExplorerConfig::default());
    }

    #[cfg(feature = "config-file")]
    #[test]
    fn toml_round_trip() {
        let cfg = ExplorerConfig::from_toml_str("seed = 17\nvirtual_exploration = false\n")
            .expect("parse");
        assert_eq!(cfg.seed, Some(17));
        assert!(!cfg.virtual_exploration);
        assert!(cfg.lazy_reexploration);
        assert!(ExplorerConfig::from_toml_str("seed = \"x\"").is_err());
    }
}
