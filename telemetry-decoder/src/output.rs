//! Output formatting
//!
//! A parser renders every decoded record in one output mode, chosen at
//! construction: the in-memory [`OutputRecord`], its JSON text, or a
//! [`DasRecord`] for a storage writer.

use crate::types::{EpochSeconds, FieldMap, OutputRecord, Result};
use serde::{Deserialize, Serialize};

/// Separator between data_id and message_type in table names
pub const TABLE_NAME_SEPARATOR: char = '#';

/// How decoded records are returned
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputMode {
    /// [`ParsedRecord::Record`]
    #[default]
    Structured,
    /// [`ParsedRecord::Json`]
    Json,
    /// [`ParsedRecord::Das`]
    DasRecord,
}

/// A record as handed to a storage writer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DasRecord {
    pub data_id: String,
    /// Optional sub-type, stored in its own table
    pub message_type: Option<String>,
    pub timestamp: EpochSeconds,
    pub fields: FieldMap,
}

impl DasRecord {
    pub fn new(
        data_id: impl Into<String>,
        message_type: Option<String>,
        timestamp: EpochSeconds,
        fields: FieldMap,
    ) -> Self {
        Self {
            data_id: data_id.into(),
            message_type,
            timestamp,
            fields,
        }
    }

    /// Table this record belongs in: `data_id` or `data_id#message_type`
    pub fn table_name(&self) -> String {
        match &self.message_type {
            Some(message_type) => {
                format!("{}{}{}", self.data_id, TABLE_NAME_SEPARATOR, message_type)
            }
            None => self.data_id.clone(),
        }
    }

    /// Split a table name back into data_id and message_type
    pub fn split_table_name(table_name: &str) -> (String, Option<String>) {
        match table_name.split_once(TABLE_NAME_SEPARATOR) {
            Some((data_id, message_type)) => (data_id.to_string(), Some(message_type.to_string())),
            None => (table_name.to_string(), None),
        }
    }
}

impl From<OutputRecord> for DasRecord {
    fn from(record: OutputRecord) -> Self {
        DasRecord::new(record.data_id, None, record.timestamp, record.fields)
    }
}

/// A decoded record in the parser's output mode
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedRecord {
    Record(OutputRecord),
    Json(String),
    Das(DasRecord),
}

/// Storage writer interface
///
/// A writer provisions one table per [`DasRecord::table_name`], infers column
/// kinds from the first record it sees for a table
/// ([`crate::FieldValue::storage_kind`]), and appends rows with a sequence
/// position and the record timestamp.
pub trait RecordWriter {
    /// Append one record
    fn write_record(&mut self, record: &DasRecord) -> Result<()>;

    /// Flush buffered records
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Renders output records in a fixed mode
#[derive(Debug, Clone, Copy)]
pub struct OutputFormatter {
    mode: OutputMode,
}

impl OutputFormatter {
    pub fn new(mode: OutputMode) -> Self {
        Self { mode }
    }

    pub fn mode(&self) -> OutputMode {
        self.mode
    }

    /// Render a record
    pub fn format(&self, record: OutputRecord) -> Result<ParsedRecord> {
        match self.mode {
            OutputMode::Structured => Ok(ParsedRecord::Record(record)),
            OutputMode::Json => Ok(ParsedRecord::Json(serde_json::to_string(&record)?)),
            OutputMode::DasRecord => Ok(ParsedRecord::Das(record.into())),
        }
    }
}
