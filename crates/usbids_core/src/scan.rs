//! Single pass over the registry text

use crate::context::Tracker;
use crate::error::Result;
use crate::parser::Line;
use crate::parser::classify;
use crate::parser::split_indent;
use crate::schema::Record;
use crate::schema::Table;
use std::collections::BTreeMap;

/// Destination for records produced by a scan
pub trait RecordSink<'input> {
    /// Insert the record, or rename it if the key already exists
    fn upsert(&mut self, record: &Record<'input>) -> Result<()>;
}

/// Collects records in memory, in registry order
impl<'input> RecordSink<'input> for Vec<Record<'input>> {
    fn upsert(&mut self, record: &Record<'input>) -> Result<()> {
        self.push(*record);
        Ok(())
    }
}

/// Registry metadata taken from the leading comment block
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Metadata {
    pub version: Option<String>,
    pub date: Option<String>,
}

/// What a scan saw
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ScanSummary {
    pub metadata: Metadata,
    /// Upserts issued per table (updates of existing keys included)
    pub written: BTreeMap<Table, u64>,
    /// Non-blank lines that were not understood
    pub skipped: u64,
}

/// Scan the registry text once, feeding every record into `sink`
#[tracing::instrument(skip_all)]
pub fn scan<'input>(
    text: &'input str,
    sink: &mut impl RecordSink<'input>,
) -> Result<ScanSummary> {
    let mut tracker = Tracker::new();
    let mut summary = ScanSummary::default();

    for (index, raw) in text.lines().enumerate() {
        if raw.trim().is_empty() {
            continue;
        }
        let (depth, rest) = split_indent(raw);
        let Some(line) = classify(depth, rest) else {
            tracing::trace!(line = index + 1, "Skipping unrecognized line: {raw:?}");
            summary.skipped += 1;
            continue;
        };
        match line {
            Line::Version(version) => summary.metadata.version = Some(version.to_owned()),
            Line::Date(date) => summary.metadata.date = Some(date.to_owned()),
            Line::Comment => (),
            line => match tracker.advance(line) {
                Some(record) => {
                    sink.upsert(&record)?;
                    *summary.written.entry(record.table()).or_default() += 1;
                }
                None => {
                    tracing::trace!(line = index + 1, "No parent for line: {raw:?}");
                    summary.skipped += 1;
                }
            },
        }
    }

    tracing::debug!(
        records = summary.written.values().sum::<u64>(),
        skipped = summary.skipped,
        "Scan complete"
    );
    Ok(summary)
}
