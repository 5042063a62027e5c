//! Core types for the telemetry record decoder
//!
//! This module defines the values the decoder produces for every input line and the
//! errors it can report. Per-record problems are not errors: they are reported as a
//! [`SkipReason`] so that a continuous record stream is never interrupted.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Timestamp type used throughout the decoder
pub type Timestamp = DateTime<Utc>;

/// Numeric timestamp in seconds since the Unix epoch
pub type EpochSeconds = f64;

/// Field values keyed by field name
///
/// Used both for raw captures (keyed by template capture name) and for the
/// canonical fields of an output record.
pub type FieldMap = BTreeMap<String, FieldValue>;

/// Result type for decoder operations
pub type Result<T> = std::result::Result<T, DecoderError>;

/// Configuration defects detected while constructing a parser
///
/// These are fatal: a parser is either fully constructed or not at all.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Device definition for \"{0}\" has no declaration of its device_type")]
    MissingDeviceType(String),

    #[error("Device type \"{device_type}\" (declared in definition of \"{device}\") is undefined")]
    UnknownDeviceType { device: String, device_type: String },

    #[error("Device type \"{0}\" has no format definition")]
    NoTemplates(String),

    #[error("Invalid template {template:?}: {reason}")]
    InvalidTemplate { template: String, reason: String },

    #[error("Invalid record format {format:?}: {reason}")]
    InvalidRecordFormat { format: String, reason: String },

    #[error("Only one of return_json and return_das_record may be set")]
    ConflictingOutputModes,

    #[error("Duplicate definition for \"{name}\" in {file} (already defined in {previous_file})")]
    DuplicateDefinition {
        name: String,
        file: String,
        previous_file: String,
    },

    #[error("Failed to read definition file {path:?}: {error}")]
    Io { path: PathBuf, error: std::io::Error },

    #[error("Failed to parse definition file {path:?}: {reason}")]
    Parse { path: PathBuf, reason: String },

    #[error("Invalid definition path pattern {pattern:?}: {reason}")]
    Glob { pattern: String, reason: String },
}

/// Errors that can occur while constructing a parser or decoding a message
#[derive(Debug, thiserror::Error)]
pub enum DecoderError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("No definition found for device_type \"{0}\"")]
    UnknownDeviceType(String),

    #[error("Invalid value {value:?} for field \"{field}\": {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Failed to serialize record: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// A decoded field value
///
/// The closed set of kinds a template capture can produce. Timestamps are
/// already normalized to epoch seconds.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Signed integer (`d` and `x` captures)
    Integer(i64),
    /// Floating-point number (`f` and `g` captures)
    Float(f64),
    /// Text (untyped, `w`, `l` and `S` captures)
    Text(String),
    /// Timestamp as epoch seconds (`ti` captures)
    Timestamp(EpochSeconds),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Integer(v) => write!(f, "{}", v),
            FieldValue::Float(v) => write!(f, "{}", v),
            FieldValue::Text(v) => write!(f, "{}", v),
            FieldValue::Timestamp(v) => write!(f, "{:.6}", v),
        }
    }
}

impl FieldValue {
    /// Numeric view of this value, if it has one
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Integer(v) => Some(*v as f64),
            FieldValue::Float(v) | FieldValue::Timestamp(v) => Some(*v),
            FieldValue::Text(_) => None,
        }
    }

    /// Integer view of this value, if it is an integer
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Text view of this value, if it is text
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(v) => Some(v),
            _ => None,
        }
    }

    /// Column kind a storage backend should infer for this value
    pub fn storage_kind(&self) -> StorageKind {
        match self {
            FieldValue::Integer(_) => StorageKind::Int,
            FieldValue::Float(_) | FieldValue::Timestamp(_) => StorageKind::Double,
            FieldValue::Text(_) => StorageKind::Text,
        }
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::Integer(value)
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

/// Storage column kinds inferred from field values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKind {
    Int,
    Double,
    Text,
}

impl fmt::Display for StorageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageKind::Int => write!(f, "int"),
            StorageKind::Double => write!(f, "double"),
            StorageKind::Text => write!(f, "text"),
        }
    }
}

/// A raw line split into its identifier, timestamp and message body
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    /// Identifier of the emitting device
    pub data_id: String,
    /// Record timestamp, if the record format captures one
    pub timestamp: Option<EpochSeconds>,
    /// Device-specific message body
    pub message: String,
}

/// A fully decoded record with canonical field names
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputRecord {
    /// Identifier of the emitting device
    pub data_id: String,
    /// Record timestamp in epoch seconds
    pub timestamp: EpochSeconds,
    /// Decoded values keyed by canonical field name
    pub fields: FieldMap,
}

/// Single-line text form: `data_id timestamp name=value ...`
///
/// Fields appear in name order. Text values are quoted and escaped so that
/// values containing spaces or `=` stay unambiguous.
impl fmt::Display for OutputRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:.6}", self.data_id, self.timestamp)?;
        for (name, value) in &self.fields {
            match value {
                FieldValue::Text(text) => write!(f, " {}={:?}", name, text)?,
                other => write!(f, " {}={}", name, other)?,
            }
        }
        Ok(())
    }
}

/// Why a record produced no output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The line was empty or whitespace only
    EmptyLine,
    /// The line did not match the record format
    MalformedLine,
    /// No device is defined for the record's identifier
    UnknownDevice(String),
    /// A captured value could not be converted to its declared type
    InvalidValue(String),
    /// The decoded record could not be serialized
    Serialization(String),
}

impl SkipReason {
    /// Short, stable label for counting skip reasons
    pub fn kind(&self) -> &'static str {
        match self {
            SkipReason::EmptyLine => "empty_line",
            SkipReason::MalformedLine => "malformed_line",
            SkipReason::UnknownDevice(_) => "unknown_device",
            SkipReason::InvalidValue(_) => "invalid_value",
            SkipReason::Serialization(_) => "serialization",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::EmptyLine => write!(f, "empty line"),
            SkipReason::MalformedLine => write!(f, "line does not match record format"),
            SkipReason::UnknownDevice(id) => write!(f, "unrecognized data id \"{}\"", id),
            SkipReason::InvalidValue(reason) => write!(f, "invalid value: {}", reason),
            SkipReason::Serialization(reason) => write!(f, "serialization failed: {}", reason),
        }
    }
}

/// Convert a timestamp to fractional epoch seconds
pub fn epoch_seconds(timestamp: &Timestamp) -> EpochSeconds {
    timestamp.timestamp() as f64 + f64::from(timestamp.timestamp_subsec_nanos()) / 1e9
}

/// Timestamp formats carrying an explicit UTC offset
const OFFSET_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%dT%H:%M%z",
];

/// Timestamp formats without offset, interpreted as UTC
const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Parse an ISO-8601 style timestamp
///
/// Accepts `T` or space between date and time, optional seconds and fractional
/// seconds, and an optional `Z` or numeric offset (`+hh`, `+hhmm` or `+hh:mm`).
/// Values without an offset are taken as UTC. A bare date is midnight UTC.
pub fn parse_iso8601(text: &str) -> Option<Timestamp> {
    let normalized = normalize_iso8601(text.trim());
    let text = normalized.as_str();

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(text, format) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    let naive = text
        .strip_suffix(|c: char| c.eq_ignore_ascii_case(&'z'))
        .unwrap_or(text);

    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(naive, format) {
            return Some(dt.and_utc());
        }
    }

    NaiveDate::parse_from_str(naive, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}

/// Uppercase the date/time separator and widen an hour-only offset to `+hh:00`
fn normalize_iso8601(text: &str) -> String {
    let mut normalized = text.replacen('t', "T", 1);

    let bytes = normalized.as_bytes();
    let len = bytes.len();
    let hour_only_offset = len >= 3
        && matches!(bytes[len - 3], b'+' | b'-')
        && bytes[len - 2].is_ascii_digit()
        && bytes[len - 1].is_ascii_digit()
        && normalized[..len - 3].contains(['T', ' ']);
    if hour_only_offset {
        normalized.push_str(":00");
    }

    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_value_conversions() {
        assert_eq!(FieldValue::Integer(42).as_f64(), Some(42.0));
        assert_eq!(FieldValue::Integer(42).as_i64(), Some(42));
        assert_eq!(FieldValue::Float(3.3).as_f64(), Some(3.3));
        assert_eq!(FieldValue::Float(3.3).as_i64(), None);
        assert_eq!(FieldValue::Timestamp(1.5).as_f64(), Some(1.5));
        assert_eq!(FieldValue::from("abc").as_str(), Some("abc"));
        assert_eq!(FieldValue::from("abc").as_f64(), None);
    }

    #[test]
    fn test_storage_kind() {
        assert_eq!(FieldValue::Integer(1).storage_kind(), StorageKind::Int);
        assert_eq!(FieldValue::Float(1.0).storage_kind(), StorageKind::Double);
        assert_eq!(FieldValue::Timestamp(1.0).storage_kind(), StorageKind::Double);
        assert_eq!(FieldValue::from("x").storage_kind(), StorageKind::Text);
        assert_eq!(StorageKind::Double.to_string(), "double");
    }

    #[test]
    fn test_field_value_serializes_untagged() {
        let mut fields = FieldMap::new();
        fields.insert("count".to_string(), FieldValue::Integer(7));
        fields.insert("name".to_string(), FieldValue::from("pump"));
        fields.insert("voltage".to_string(), FieldValue::Float(3.5));

        let json = serde_json::to_string(&fields).unwrap();
        assert_eq!(json, r#"{"count":7,"name":"pump","voltage":3.5}"#);
    }

    #[test]
    fn test_parse_iso8601_variants() {
        let expected = 1704067200.0;
        for text in [
            "2024-01-01T00:00:00Z",
            "2024-01-01T00:00:00.000Z",
            "2024-01-01T00:00:00+00:00",
            "2024-01-01T01:00:00+01:00",
            "2024-01-01T00:00:00",
            "2024-01-01 00:00:00",
            "2024-01-01T00:00",
            "2024-01-01",
        ] {
            let ts = parse_iso8601(text).unwrap_or_else(|| panic!("failed to parse {}", text));
            assert_eq!(epoch_seconds(&ts), expected, "{}", text);
        }
    }

    #[test]
    fn test_parse_iso8601_offset_forms() {
        let expected = 1704067200.0;
        for text in [
            "2024-01-01T01:00:00+01",
            "2024-01-01T01:00:00+0100",
            "2023-12-31T19:00:00-05",
            "2024-01-01 01:00:00+01",
            "2024-01-01t00:00:00z",
        ] {
            let ts = parse_iso8601(text).unwrap_or_else(|| panic!("failed to parse {}", text));
            assert_eq!(epoch_seconds(&ts), expected, "{}", text);
        }
    }

    #[test]
    fn test_parse_iso8601_bare_date_is_not_an_offset() {
        let ts = parse_iso8601("2024-01-01").unwrap();
        assert_eq!(epoch_seconds(&ts), 1704067200.0);
    }

    #[test]
    fn test_parse_iso8601_fractional_seconds() {
        let ts = parse_iso8601("2024-01-01T00:00:00.250Z").unwrap();
        assert_eq!(epoch_seconds(&ts), 1704067200.25);
    }

    #[test]
    fn test_parse_iso8601_rejects_garbage() {
        assert!(parse_iso8601("yesterday").is_none());
        assert!(parse_iso8601("2024-13-01T00:00:00Z").is_none());
    }

    #[test]
    fn test_output_record_display() {
        let mut fields = FieldMap::new();
        fields.insert("voltage".to_string(), FieldValue::Float(3.3));
        fields.insert("status".to_string(), FieldValue::from("low battery"));
        fields.insert("count".to_string(), FieldValue::Integer(7));
        let record = OutputRecord {
            data_id: "analog1".to_string(),
            timestamp: 1704067200.5,
            fields,
        };
        assert_eq!(
            record.to_string(),
            r#"analog1 1704067200.500000 count=7 status="low battery" voltage=3.3"#
        );
    }

    #[test]
    fn test_skip_reason_kind() {
        assert_eq!(SkipReason::MalformedLine.kind(), "malformed_line");
        assert_eq!(SkipReason::UnknownDevice("x".into()).kind(), "unknown_device");
        assert_eq!(
            SkipReason::UnknownDevice("gyro".into()).to_string(),
            "unrecognized data id \"gyro\""
        );
    }
}
