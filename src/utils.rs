use std::fs;
use std::path::Path;

use crate::normalize::NormalizedRecord;

pub fn ensure_dir(path: &Path) -> anyhow::Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Load records previously written by [`crate::output::write_jsonl`].
pub fn read_jsonl(path: &Path) -> anyhow::Result<Vec<NormalizedRecord>> {
    let mut out = Vec::new();
    let data = fs::read_to_string(path)?;
    for line in data.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let v: NormalizedRecord = serde_json::from_str(line)?;
        out.push(v);
    }
    Ok(out)
}
