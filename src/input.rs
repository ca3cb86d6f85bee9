use anyhow::Context;
use csv::{ReaderBuilder, Trim};
use std::path::Path;

use crate::target::strip_counter;

const HEADER_WORDS: &[&str] = &[
    "target", "targets", "asset", "assets", "host", "hosts", "ip", "domain", "address",
];

/// Raw values from the first column of a CSV or plain text file.
///
/// Blank cells and `#` lines are skipped, each value loses its trailing
/// `(<digits>)` counter, and a column name as the first non-empty value is ignored.
pub fn read_raw_targets(path: &Path) -> anyhow::Result<Vec<String>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(Trim::All)
        .comment(Some(b'#'))
        .from_path(path)
        .with_context(|| format!("Failed to open input file {}", path.display()))?;

    let mut values = Vec::new();
    for (idx, row) in reader.records().enumerate() {
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                tracing::warn!(row = idx + 1, error = %e, "skipping unreadable input row");
                continue;
            }
        };
        let Some(cell) = row.get(0) else { continue };
        let value = strip_counter(cell);
        if value.is_empty() {
            continue;
        }
        if values.is_empty() && HEADER_WORDS.contains(&value.to_ascii_lowercase().as_str()) {
            continue;
        }
        values.push(value.to_string());
    }

    tracing::info!(count = values.len(), path = %path.display(), "Loaded {} raw targets", values.len());
    Ok(values)
}
