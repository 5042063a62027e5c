//! Telemetry Record Decoder Library
//!
//! A reusable library for decoding single-line telemetry records into typed
//! fields, driven by device and device type definitions.
//!
//! # Architecture
//!
//! Each line goes through a fixed pipeline:
//! - Split into data_id, timestamp and message with the record format
//! - Resolve the data_id to a device and its device type
//! - Match the message against the device type's templates, first match wins
//! - Rename captured fields to the device's canonical names
//! - Render in the configured output mode
//!
//! Definitions are validated and templates compiled once, when the
//! [`RecordParser`] is created. After that the parser is read-only and can be
//! shared between threads.
//!
//! The library does NOT:
//! - Store records (see [`RecordWriter`] for the writer interface)
//! - Read input streams
//! - Retry records that fail to decode
//!
//! # Example Usage
//!
//! ```no_run
//! use telemetry_decoder::{ParseOutcome, ParserConfig, RecordParser};
//!
//! // Load definitions and build the parser
//! let config = ParserConfig::new().with_json_output(true);
//! let parser = RecordParser::from_definition_path(config, "local/devices/*.yaml").unwrap();
//!
//! // Decode lines
//! for line in ["gyro1 2024-01-01T00:00:00Z $HEHDT,235.18,T"] {
//!     match parser.parse_record(line) {
//!         ParseOutcome::Parsed(record) => println!("{:?}", record),
//!         ParseOutcome::Unmatched(record) => println!("no fields: {:?}", record),
//!         ParseOutcome::Skipped(reason) => eprintln!("skipped: {}", reason),
//!     }
//! }
//! ```

// Public modules
pub mod config;
pub mod definitions;
pub mod output;
pub mod parser;
pub mod template;
pub mod types;

// Re-export main types for convenience
pub use config::{ParserConfig, DEFAULT_RECORD_FORMAT};
pub use definitions::{
    CatalogStats, Definition, DefinitionCatalog, Device, DeviceType, DuplicatePolicy,
    NamedDefinition, DEFAULT_DEFINITION_PATH,
};
pub use message_decoder::{MessageDecoder, MessageMatch};
pub use output::{DasRecord, OutputMode, ParsedRecord, RecordWriter};
pub use parser::{ParseOutcome, ParsedRecords, RecordParser};
pub use splitter::RecordSplitter;
pub use types::{
    ConfigError, DecoderError, Envelope, EpochSeconds, FieldMap, FieldValue, OutputRecord,
    Result, SkipReason, StorageKind, Timestamp,
};

// Pipeline stages (exposed through the re-exports above)
mod field_mapper;
mod message_decoder;
mod splitter;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
