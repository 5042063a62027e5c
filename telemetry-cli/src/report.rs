//! Run summary
//!
//! Counts decoding outcomes and logs them when the run ends.

use std::collections::BTreeMap;
use telemetry_decoder::ParseOutcome;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ParseSummary {
    pub total: usize,
    pub parsed: usize,
    pub unmatched: usize,
    /// Skipped lines per [`telemetry_decoder::SkipReason::kind`]
    pub skipped: BTreeMap<&'static str, usize>,
}

impl ParseSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, outcome: &ParseOutcome) {
        self.total += 1;
        match outcome {
            ParseOutcome::Parsed(_) => self.parsed += 1,
            ParseOutcome::Unmatched(_) => self.unmatched += 1,
            ParseOutcome::Skipped(reason) => *self.skipped.entry(reason.kind()).or_insert(0) += 1,
        }
    }

    pub fn skipped_total(&self) -> usize {
        self.skipped.values().sum()
    }

    pub fn log(&self) {
        log::info!(
            "Processed {} lines: {} parsed, {} unmatched, {} skipped",
            self.total,
            self.parsed,
            self.unmatched,
            self.skipped_total()
        );
        for (kind, count) in &self.skipped {
            log::info!("  skipped ({}): {}", kind, count);
        }
    }
}
