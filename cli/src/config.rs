//! YAML configuration for the CLI.
//!
//! ```yaml
//! decoder: { max_depth: 32 }
//! batch:   { chunk_size: 10000 }
//! log:     { level: info, json: false, components: { calldec_evm: debug } }
//! ```
//!
//! Every section is optional. The file comes from `--config`, else from the
//! `CALLDEC_CONFIG` environment variable; with neither, defaults apply.

use anyhow::{Context, Result};
use calldec_core::config::{BatchConfig, DecoderConfig};
use calldec_observability::LogConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const CONFIG_ENV: &str = "CALLDEC_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CliConfig {
    #[serde(default)]
    pub decoder: DecoderConfig,
    #[serde(default)]
    pub batch: BatchConfig,
    #[serde(default)]
    pub log: LogConfig,
}

impl CliConfig {
    pub fn from_yaml(text: &str) -> Result<Self> {
        // An empty file deserializes to unit, not a map.
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).context("parse YAML config")
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read config file '{}'", path.display()))?;
        Self::from_yaml(&text).with_context(|| format!("in config file '{}'", path.display()))
    }

    /// Resolve the config path from the flag or the environment and load it.
    pub fn load(flag: Option<&Path>) -> Result<Self> {
        let path = flag
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV).map(PathBuf::from));
        match path {
            Some(p) => Self::from_file(&p),
            None => Ok(Self::default()),
        }
    }
}
