//! Definition file loader
//!
//! Reads device and device type definitions from YAML, TOML or JSON files.
//! Each file is a map of definition name to definition.

use crate::definitions::model::{Definition, NamedDefinition};
use crate::types::ConfigError;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Default location of definition files
pub const DEFAULT_DEFINITION_PATH: &str = "local/devices/*.yaml";

/// Serialization format of a definition file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DefinitionFormat {
    Yaml,
    Toml,
    Json,
}

impl DefinitionFormat {
    /// Pick a format from the file extension; anything unrecognized is read as YAML
    pub fn from_path(path: &Path) -> Self {
        let extension = path
            .extension()
            .and_then(|s| s.to_str())
            .map(|s| s.to_lowercase());

        match extension.as_deref() {
            Some("toml") => DefinitionFormat::Toml,
            Some("json") => DefinitionFormat::Json,
            _ => DefinitionFormat::Yaml,
        }
    }
}

/// Load every definition file matched by a comma-separated list of glob patterns
///
/// Patterns are processed in order and the files of each pattern in sorted
/// order, so later files override earlier ones when names collide. A pattern
/// that matches nothing is logged, not an error.
///
/// # Example
/// ```no_run
/// use telemetry_decoder::definitions::loader::load_definition_path;
///
/// let definitions = load_definition_path("local/devices/*.yaml,local/site/*.yaml").unwrap();
/// println!("Loaded {} definitions", definitions.len());
/// ```
pub fn load_definition_path(path_spec: &str) -> Result<Vec<NamedDefinition>, ConfigError> {
    let mut definitions = Vec::new();

    for pattern in path_spec.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let paths = expand_pattern(pattern)?;
        if paths.is_empty() {
            log::warn!("No files match definition file spec \"{}\"", pattern);
        }

        for path in paths {
            definitions.extend(load_definition_file(&path)?);
        }
    }

    Ok(definitions)
}

/// Load all definitions from one file
pub fn load_definition_file(path: &Path) -> Result<Vec<NamedDefinition>, ConfigError> {
    log::info!("Loading definition file: {:?}", path);

    let content = std::fs::read_to_string(path).map_err(|error| ConfigError::Io {
        path: path.to_path_buf(),
        error,
    })?;

    let definitions = parse_definitions(
        &content,
        DefinitionFormat::from_path(path),
        &path.display().to_string(),
    )
    .map_err(|reason| ConfigError::Parse {
        path: path.to_path_buf(),
        reason,
    })?;

    log::debug!("Read {} definition(s) from {:?}", definitions.len(), path);
    Ok(definitions)
}

/// Parse definitions from text
///
/// Returns the parser's error message on failure. Definitions come back sorted
/// by name; `origin` is recorded on each one for duplicate diagnostics.
pub fn parse_definitions(
    content: &str,
    format: DefinitionFormat,
    origin: &str,
) -> Result<Vec<NamedDefinition>, String> {
    let parsed: BTreeMap<String, Definition> = match format {
        DefinitionFormat::Yaml => {
            // An empty YAML document is an empty set of definitions
            if content.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_yaml::from_str(content).map_err(|e| e.to_string())?
            }
        }
        DefinitionFormat::Toml => toml::from_str(content).map_err(|e| e.to_string())?,
        DefinitionFormat::Json => serde_json::from_str(content).map_err(|e| e.to_string())?,
    };

    Ok(parsed
        .into_iter()
        .map(|(name, definition)| NamedDefinition::new(name, origin, definition))
        .collect())
}

fn expand_pattern(pattern: &str) -> Result<Vec<PathBuf>, ConfigError> {
    let entries = glob::glob(pattern).map_err(|e| ConfigError::Glob {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        match entry {
            Ok(path) => paths.push(path),
            Err(e) => log::warn!("Skipping unreadable path matched by \"{}\": {}", pattern, e),
        }
    }
    paths.sort();
    Ok(paths)
}
