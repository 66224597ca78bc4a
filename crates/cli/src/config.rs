//! CLI configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::output::OutputFormat;

/// Default configuration file name
pub const DEFAULT_CONFIG_FILE: &str = "pagestate.toml";

/// CLI configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Directory holding session recordings
    pub recordings_dir: PathBuf,

    /// Output format when `--format` is not given
    pub output_format: OutputFormat,

    /// Log level when `RUST_LOG` is unset
    pub log_level: String,

    /// Matcher configuration
    pub matcher: MatcherConfig,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            recordings_dir: PathBuf::from("recordings"),
            output_format: OutputFormat::Table,
            log_level: "info".to_string(),
            matcher: MatcherConfig::default(),
        }
    }
}

/// Matcher configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatcherConfig {
    /// Passing assertions required for a match; all must pass when unset
    pub min_valid_assertions: Option<usize>,
}

impl CliConfig {
    /// Load configuration from file, or defaults if it does not exist
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }
}
