//! Configuration loading and parsing

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use telemetry_decoder::{ParserConfig, DEFAULT_DEFINITION_PATH};

/// Main application configuration (loaded from config.toml)
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AppConfig {
    #[serde(default)]
    pub parser: ParserConfig,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InputConfig {
    /// Comma-separated glob patterns of definition files
    #[serde(default = "default_definition_path")]
    pub definition_path: String,
    /// Record files to decode; stdin when empty
    #[serde(default)]
    pub files: Vec<PathBuf>,
    /// Lines decoded in parallel per batch
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            definition_path: default_definition_path(),
            files: Vec::new(),
            batch_size: default_batch_size(),
        }
    }
}

fn default_definition_path() -> String {
    DEFAULT_DEFINITION_PATH.to_string()
}

fn default_batch_size() -> usize {
    1024
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct OutputConfig {
    /// Output file; stdout when unset
    pub file: Option<PathBuf>,
}

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<AppConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: AppConfig = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    if config.input.batch_size == 0 {
        anyhow::bail!("input.batch_size must be at least 1 in {:?}", path);
    }

    Ok(config)
}
