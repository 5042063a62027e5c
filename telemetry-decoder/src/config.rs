//! Parser configuration types
//!
//! This module defines the settings a [`crate::RecordParser`] is constructed with.
//! Device definitions are supplied separately.

use crate::definitions::DuplicatePolicy;
use crate::output::OutputMode;
use crate::template::TemplateOptions;
use crate::types::ConfigError;
use serde::{Deserialize, Serialize};

/// Default record format: `<data_id> <ISO-8601 timestamp> <message>`
pub const DEFAULT_RECORD_FORMAT: &str = "{data_id:w} {timestamp:ti} {message}";

/// Configuration for the record parser
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Template splitting a line into data_id, timestamp and message
    #[serde(default = "default_record_format")]
    pub record_format: String,

    /// Return records as JSON text
    #[serde(default)]
    pub return_json: bool,

    /// Return records as [`crate::DasRecord`] values
    #[serde(default)]
    pub return_das_record: bool,

    /// Log per-record problems at debug instead of warning level
    #[serde(default)]
    pub quiet: bool,

    /// Match template literals case-sensitively
    #[serde(default)]
    pub case_sensitive: bool,

    /// Treat duplicate definition names as a configuration error
    #[serde(default)]
    pub strict_definitions: bool,
}

fn default_record_format() -> String {
    DEFAULT_RECORD_FORMAT.to_string()
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            record_format: default_record_format(),
            return_json: false,
            return_das_record: false,
            quiet: false,
            case_sensitive: false,
            strict_definitions: false,
        }
    }
}

impl ParserConfig {
    /// Create a new parser configuration with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method: set the record format template
    pub fn with_record_format(mut self, record_format: impl Into<String>) -> Self {
        self.record_format = record_format.into();
        self
    }

    /// Builder method: return JSON text
    pub fn with_json_output(mut self, enabled: bool) -> Self {
        self.return_json = enabled;
        self
    }

    /// Builder method: return DAS records
    pub fn with_das_record_output(mut self, enabled: bool) -> Self {
        self.return_das_record = enabled;
        self
    }

    /// Builder method: quiet per-record diagnostics
    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Builder method: case-sensitive template literals
    pub fn with_case_sensitive(mut self, enabled: bool) -> Self {
        self.case_sensitive = enabled;
        self
    }

    /// Builder method: reject duplicate definition names
    pub fn with_strict_definitions(mut self, enabled: bool) -> Self {
        self.strict_definitions = enabled;
        self
    }

    /// The single output mode selected by this configuration
    pub fn output_mode(&self) -> Result<OutputMode, ConfigError> {
        match (self.return_json, self.return_das_record) {
            (true, true) => Err(ConfigError::ConflictingOutputModes),
            (true, false) => Ok(OutputMode::Json),
            (false, true) => Ok(OutputMode::DasRecord),
            (false, false) => Ok(OutputMode::Structured),
        }
    }

    /// Template compilation options
    pub fn template_options(&self) -> TemplateOptions {
        TemplateOptions {
            case_sensitive: self.case_sensitive,
        }
    }

    /// Duplicate definition handling
    pub fn duplicate_policy(&self) -> DuplicatePolicy {
        if self.strict_definitions {
            DuplicatePolicy::Reject
        } else {
            DuplicatePolicy::LastWins
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parser_config_builder() {
        let config = ParserConfig::new()
            .with_record_format("{data_id:w} {message}")
            .with_json_output(true)
            .with_quiet(true)
            .with_case_sensitive(true)
            .with_strict_definitions(true);

        assert_eq!(config.record_format, "{data_id:w} {message}");
        assert!(config.return_json);
        assert!(!config.return_das_record);
        assert!(config.quiet);
        assert!(config.template_options().case_sensitive);
        assert_eq!(config.duplicate_policy(), DuplicatePolicy::Reject);
    }

    #[test]
    fn test_output_mode_selection() {
        assert_eq!(ParserConfig::new().output_mode().unwrap(), OutputMode::Structured);
        assert_eq!(
            ParserConfig::new().with_json_output(true).output_mode().unwrap(),
            OutputMode::Json
        );
        assert_eq!(
            ParserConfig::new()
                .with_das_record_output(true)
                .output_mode()
                .unwrap(),
            OutputMode::DasRecord
        );
    }

    #[test]
    fn test_conflicting_output_modes() {
        let config = ParserConfig::new()
            .with_json_output(true)
            .with_das_record_output(true);
        assert!(matches!(
            config.output_mode(),
            Err(ConfigError::ConflictingOutputModes)
        ));
    }

    #[test]
    fn test_deserialize_defaults() {
        let config: ParserConfig = toml::from_str("return_json = true").unwrap();
        assert_eq!(config.record_format, DEFAULT_RECORD_FORMAT);
        assert!(config.return_json);
        assert!(!config.quiet);
        assert_eq!(config.duplicate_policy(), DuplicatePolicy::LastWins);
    }
}
