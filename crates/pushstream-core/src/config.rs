//! Renderer configuration, loadable from TOML.
//!
//! ```toml
//! debug = false
//! count_fast_path = true
//!
//! [optimizer]
//! terminal = true
//! squash = true
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

///
/// RendererConfig
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct RendererConfig {
    /// Print `[debug]` lines for each render phase.
    pub debug: bool,

    /// Answer COUNT with a count-only store query when nothing is left to
    /// replay.
    pub count_fast_path: bool,

    pub optimizer: OptimizerConfig,
}

impl RendererConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            debug: false,
            count_fast_path: true,
            optimizer: OptimizerConfig::default(),
        }
    }
}

///
/// OptimizerConfig
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct OptimizerConfig {
    pub terminal: bool,
    pub squash: bool,
}

impl OptimizerConfig {
    #[must_use]
    pub const fn disabled() -> Self {
        Self {
            terminal: false,
            squash: false,
        }
    }
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            terminal: true,
            squash: true,
        }
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_source_yields_defaults() {
        let config = RendererConfig::from_toml_str("").expect("empty config parses");

        assert_eq!(config, RendererConfig::default());
        assert!(config.count_fast_path);
        assert!(config.optimizer.squash);
    }

    #[test]
    fn partial_tables_keep_remaining_defaults() {
        let config = RendererConfig::from_toml_str(
            r"
            debug = true

            [optimizer]
            squash = false
            ",
        )
        .expect("config parses");

        assert!(config.debug);
        assert!(config.count_fast_path);
        assert!(config.optimizer.terminal);
        assert!(!config.optimizer.squash);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = RendererConfig::from_toml_str("cache = true").expect_err("unknown key");

        assert!(err.to_string().contains("cache"));
    }

    #[test]
    fn config_round_trips_through_toml() {
        let config = RendererConfig {
            debug: true,
            count_fast_path: false,
            optimizer: OptimizerConfig::disabled(),
        };
        let text = toml::to_string(&config).expect("serialize");

        assert_eq!(
            RendererConfig::from_toml_str(&text).expect("parse"),
            config
        );
    }
}
