//! Record splitter
//!
//! Breaks a raw line into data_id, timestamp and message body using the
//! engine-wide record format.

use crate::template::{CaptureKind, Matcher, TemplateOptions};
use crate::types::{epoch_seconds, parse_iso8601, ConfigError, Envelope, FieldValue};

const DATA_ID: &str = "data_id";
const TIMESTAMP: &str = "timestamp";
const MESSAGE: &str = "message";

/// Splits raw lines with a compiled record format
#[derive(Debug, Clone)]
pub struct RecordSplitter {
    matcher: Matcher,
}

impl RecordSplitter {
    /// Compile a record format
    ///
    /// The format must capture `data_id` and `message`; `timestamp` is optional.
    pub fn new(record_format: &str, options: &TemplateOptions) -> Result<Self, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidRecordFormat {
            format: record_format.to_string(),
            reason,
        };

        let matcher = Matcher::compile(record_format, options).map_err(|e| match e {
            ConfigError::InvalidTemplate { reason, .. } => invalid(reason),
            other => other,
        })?;

        for required in [DATA_ID, MESSAGE] {
            if matcher.template().capture_kind(required).is_none() {
                return Err(invalid(format!("missing required capture {{{}}}", required)));
            }
        }

        if let Some(kind) = matcher.template().capture_kind(TIMESTAMP) {
            if matches!(kind, CaptureKind::Word | CaptureKind::Letters) {
                log::warn!(
                    "Record format {:?} captures timestamp as {:?}; it will only be used if it parses as ISO-8601",
                    record_format,
                    kind
                );
            }
        }

        Ok(Self { matcher })
    }

    /// The record format this splitter was compiled from
    pub fn record_format(&self) -> &str {
        self.matcher.source()
    }

    /// Split a line into an envelope
    ///
    /// Returns `None` if the line does not match the record format, one of its
    /// typed captures cannot be converted, or a captured timestamp is not a
    /// valid timestamp. Only a format without a timestamp capture yields
    /// `timestamp: None`.
    pub fn split(&self, line: &str) -> Option<Envelope> {
        let mut fields = match self.matcher.captures(line) {
            Ok(Some(fields)) => fields,
            Ok(None) => return None,
            Err(e) => {
                log::debug!("Record matched format but failed conversion: {}", e);
                return None;
            }
        };

        let data_id = into_text(fields.remove(DATA_ID)?);
        let message = into_text(fields.remove(MESSAGE)?);
        let timestamp = match fields.remove(TIMESTAMP) {
            None => None,
            Some(value) => {
                let seconds = match &value {
                    FieldValue::Text(text) => parse_iso8601(text).map(|ts| epoch_seconds(&ts)),
                    other => other.as_f64(),
                };
                if seconds.is_none() {
                    log::debug!("Record timestamp \"{}\" is not a valid timestamp", value);
                    return None;
                }
                seconds
            }
        };

        if !fields.is_empty() {
            log::trace!("Ignoring extra record captures: {:?}", fields.keys());
        }

        Some(Envelope {
            data_id,
            timestamp,
            message,
        })
    }
}

fn into_text(value: FieldValue) -> String {
    match value {
        FieldValue::Text(text) => text,
        other => other.to_string(),
    }
}
