//! Main parser API
//!
//! This module provides the primary interface for the decoder library.
//! [`RecordParser`] is constructed once from a configuration and a set of
//! definitions, and then decodes any number of lines.

use crate::config::ParserConfig;
use crate::definitions::{load_definition_path, CatalogStats, DefinitionCatalog, NamedDefinition};
use crate::field_mapper::FieldMapper;
use crate::message_decoder::MessageDecoder;
use crate::output::{OutputFormatter, OutputMode, ParsedRecord};
use crate::splitter::RecordSplitter;
use crate::types::{epoch_seconds, DecoderError, Envelope, FieldMap, OutputRecord, Result, SkipReason};
use chrono::Utc;
use std::fmt;

/// Outcome of parsing one line
#[derive(Debug, Clone, PartialEq)]
pub enum ParseOutcome {
    /// The message matched one of its device type's templates
    Parsed(ParsedRecord),
    /// The record was recognized but its message matched no template; the
    /// record carries no fields
    Unmatched(ParsedRecord),
    /// No record was produced
    Skipped(SkipReason),
}

impl ParseOutcome {
    /// The produced record, if any
    pub fn record(&self) -> Option<&ParsedRecord> {
        match self {
            ParseOutcome::Parsed(record) | ParseOutcome::Unmatched(record) => Some(record),
            ParseOutcome::Skipped(_) => None,
        }
    }

    /// Take the produced record, if any
    pub fn into_record(self) -> Option<ParsedRecord> {
        match self {
            ParseOutcome::Parsed(record) | ParseOutcome::Unmatched(record) => Some(record),
            ParseOutcome::Skipped(_) => None,
        }
    }

    /// True if no record was produced
    pub fn is_skipped(&self) -> bool {
        matches!(self, ParseOutcome::Skipped(_))
    }
}

/// The record parser - entry point for all decoding operations
///
/// All decoding methods take `&self` and never modify the parser, so one
/// parser can be shared between threads.
///
/// # Example
/// ```
/// use telemetry_decoder::{Definition, NamedDefinition, ParseOutcome, ParsedRecord, ParserConfig, RecordParser};
///
/// let definitions = vec![
///     NamedDefinition::new("analog1", "example", Definition::device("generic_gauge", [("value", "voltage")])),
///     NamedDefinition::new("generic_gauge", "example", Definition::device_type(["{value:f} V"])),
/// ];
/// let parser = RecordParser::new(ParserConfig::new(), definitions).unwrap();
///
/// match parser.parse_record("analog1 2024-01-01T00:00:00Z 3.30 V") {
///     ParseOutcome::Parsed(ParsedRecord::Record(record)) => {
///         assert_eq!(record.fields["voltage"].as_f64(), Some(3.30));
///     }
///     other => panic!("unexpected outcome: {:?}", other),
/// }
/// ```
pub struct RecordParser {
    config: ParserConfig,
    splitter: RecordSplitter,
    catalog: DefinitionCatalog,
    formatter: OutputFormatter,
}

impl RecordParser {
    /// Create a parser from a configuration and definitions
    ///
    /// Fails if the output mode is ambiguous, the record format is invalid, or
    /// the definitions do not validate (see [`DefinitionCatalog::build`]).
    pub fn new<I>(config: ParserConfig, definitions: I) -> Result<Self>
    where
        I: IntoIterator<Item = NamedDefinition>,
    {
        let mode = config.output_mode()?;
        let options = config.template_options();
        let splitter = RecordSplitter::new(&config.record_format, &options)?;
        let catalog = DefinitionCatalog::build(definitions, &options, config.duplicate_policy())?;

        log::info!(
            "Record parser ready: format {:?}, output {:?}",
            splitter.record_format(),
            mode
        );

        Ok(Self {
            config,
            splitter,
            catalog,
            formatter: OutputFormatter::new(mode),
        })
    }

    /// Create a parser from definition files
    ///
    /// `path_spec` is a comma-separated list of glob patterns, for example
    /// `"local/devices/*.yaml,local/site/*.yaml"`.
    pub fn from_definition_path(config: ParserConfig, path_spec: &str) -> Result<Self> {
        let definitions = load_definition_path(path_spec)?;
        Self::new(config, definitions)
    }

    /// Parse one `<data_id> <timestamp> <message>` line
    ///
    /// Never fails: lines that cannot be decoded come back as
    /// [`ParseOutcome::Skipped`] and are logged.
    pub fn parse_record(&self, record: &str) -> ParseOutcome {
        if record.trim().is_empty() {
            return ParseOutcome::Skipped(SkipReason::EmptyLine);
        }

        match self.splitter.split(record) {
            Some(envelope) => self.parse_envelope(envelope),
            None => {
                self.diagnostic(format_args!(
                    "Unable to parse record into \"{}\": {}",
                    self.splitter.record_format(),
                    record
                ));
                ParseOutcome::Skipped(SkipReason::MalformedLine)
            }
        }
    }

    /// Decode an already split record
    pub fn parse_envelope(&self, envelope: Envelope) -> ParseOutcome {
        let Some((device, device_type)) = self.catalog.resolve(&envelope.data_id) else {
            self.diagnostic(format_args!(
                "Unrecognized data id \"{}\" in record",
                envelope.data_id
            ));
            log::debug!("Devices are: {}", self.catalog.device_names().join(", "));
            return ParseOutcome::Skipped(SkipReason::UnknownDevice(envelope.data_id));
        };

        let decoded = match MessageDecoder::decode(device_type, &envelope.message) {
            Ok(decoded) => decoded,
            Err(e) => {
                self.diagnostic(format_args!("{} ({} record)", e, envelope.data_id));
                return ParseOutcome::Skipped(SkipReason::InvalidValue(e.to_string()));
            }
        };

        let matched = decoded.is_matched();
        if !matched {
            self.diagnostic(format_args!(
                "No formats for {} matched message {}",
                device_type.name, envelope.message
            ));
        }

        let record = OutputRecord {
            data_id: envelope.data_id,
            timestamp: envelope
                .timestamp
                .unwrap_or_else(|| epoch_seconds(&Utc::now())),
            fields: FieldMapper::map(device, decoded.fields),
        };
        log::debug!("Returning parsed record: {:?}", record);

        match self.formatter.format(record) {
            Ok(formatted) if matched => ParseOutcome::Parsed(formatted),
            Ok(formatted) => ParseOutcome::Unmatched(formatted),
            Err(e) => {
                log::error!("Failed to format record: {}", e);
                ParseOutcome::Skipped(SkipReason::Serialization(e.to_string()))
            }
        }
    }

    /// Decode a message body as the named device type
    ///
    /// Returns the raw captures (not renamed), or an empty map if no template
    /// matches.
    pub fn parse(&self, device_type: &str, message: &str) -> Result<FieldMap> {
        let definition = self
            .catalog
            .device_type(device_type)
            .ok_or_else(|| DecoderError::UnknownDeviceType(device_type.to_string()))?;

        let decoded = MessageDecoder::decode(definition, message)?;
        if !decoded.is_matched() {
            self.diagnostic(format_args!(
                "No formats for {} matched message {}",
                device_type, message
            ));
        }
        Ok(decoded.fields)
    }

    /// Parse a sequence of lines lazily, one outcome per line
    pub fn parse_records<I>(&self, records: I) -> ParsedRecords<'_, I::IntoIter>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        ParsedRecords {
            parser: self,
            records: records.into_iter(),
        }
    }

    /// The validated definitions
    pub fn catalog(&self) -> &DefinitionCatalog {
        &self.catalog
    }

    /// Get statistics about the loaded definitions
    pub fn catalog_stats(&self) -> CatalogStats {
        self.catalog.stats()
    }

    /// The output mode selected at construction
    pub fn output_mode(&self) -> OutputMode {
        self.formatter.mode()
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Log a per-record problem; `quiet` lowers it to debug
    fn diagnostic(&self, args: fmt::Arguments<'_>) {
        let level = if self.config.quiet {
            log::Level::Debug
        } else {
            log::Level::Warn
        };
        log::log!(level, "{}", args);
    }
}

/// Iterator returned by [`RecordParser::parse_records`]
pub struct ParsedRecords<'a, I> {
    parser: &'a RecordParser,
    records: I,
}

impl<'a, I> Iterator for ParsedRecords<'a, I>
where
    I: Iterator,
    I::Item: AsRef<str>,
{
    type Item = ParseOutcome;

    fn next(&mut self) -> Option<Self::Item> {
        self.records
            .next()
            .map(|record| self.parser.parse_record(record.as_ref()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.records.size_hint()
    }
}
