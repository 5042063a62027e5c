//! Output writers
//!
//! Structured records are written one per line in their `Display` form
//! (`data_id timestamp name=value ...`), JSON records as their text. DAS records go
//! through [`JsonLinesWriter`], which keeps a per-table schema and row counter
//! the way a database writer would.

use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use telemetry_decoder::{
    DasRecord, EpochSeconds, FieldMap, ParsedRecord, RecordWriter, Result, StorageKind,
};

/// Columns inferred from the first record of a table
#[derive(Debug, Default)]
struct TableState {
    next_id: u64,
    columns: BTreeMap<String, StorageKind>,
}

/// One stored row
#[derive(Serialize)]
struct Row<'a> {
    table: &'a str,
    id: u64,
    timestamp: EpochSeconds,
    fields: &'a FieldMap,
}

/// Writes DAS records as JSON lines, one table-tagged row per record
pub struct JsonLinesWriter<W: Write> {
    out: W,
    tables: HashMap<String, TableState>,
}

impl<W: Write> JsonLinesWriter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            tables: HashMap::new(),
        }
    }

    /// Write a record in whatever mode the parser produced it
    pub fn emit(&mut self, record: &ParsedRecord) -> Result<()> {
        match record {
            ParsedRecord::Record(record) => writeln!(self.out, "{}", record)?,
            ParsedRecord::Json(text) => writeln!(self.out, "{}", text)?,
            ParsedRecord::Das(das) => self.write_record(das)?,
        }
        Ok(())
    }

    /// Inferred column kinds of a table, if it has been created
    pub fn columns(&self, table: &str) -> Option<&BTreeMap<String, StorageKind>> {
        self.tables.get(table).map(|state| &state.columns)
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> RecordWriter for JsonLinesWriter<W> {
    fn write_record(&mut self, record: &DasRecord) -> Result<()> {
        let table = record.table_name();
        let state = self.tables.entry(table.clone()).or_insert_with(|| {
            let columns: BTreeMap<String, StorageKind> = record
                .fields
                .iter()
                .map(|(name, value)| (name.clone(), value.storage_kind()))
                .collect();
            let described: Vec<String> = columns
                .iter()
                .map(|(name, kind)| format!("{} {}", name, kind))
                .collect();
            log::info!("Creating table {} ({})", table, described.join(", "));
            TableState {
                next_id: 0,
                columns,
            }
        });

        for (name, value) in &record.fields {
            match state.columns.get(name) {
                Some(kind) if *kind == value.storage_kind() => {}
                Some(kind) => log::warn!(
                    "Field {} in table {} is {}, column is {}",
                    name,
                    table,
                    value.storage_kind(),
                    kind
                ),
                None => log::warn!("Table {} has no column for field {}", table, name),
            }
        }

        let row = Row {
            table: &table,
            id: state.next_id,
            timestamp: record.timestamp,
            fields: &record.fields,
        };
        state.next_id += 1;

        serde_json::to_writer(&mut self.out, &row)?;
        self.out.write_all(b"\n")?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }
}
