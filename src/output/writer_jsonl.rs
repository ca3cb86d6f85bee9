use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::normalize::NormalizedRecord;

/// One JSON object per line, replacing any previous file.
pub fn write_jsonl(path: &Path, items: &[NormalizedRecord]) -> anyhow::Result<()> {
    let mut f = BufWriter::new(File::create(path)?);
    for it in items {
        let line = serde_json::to_string(it)?;
        f.write_all(line.as_bytes())?;
        f.write_all(b"\n")?;
    }
    f.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::quake::normalize_item;
    use crate::target::Target;
    use crate::utils::read_jsonl;
    use serde_json::json;

    #[test]
    fn test_jsonl_lines_parse_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("results.jsonl");
        let target = Target::ip("10.0.0.1");
        let records: Vec<_> = [80, 8080]
            .iter()
            .map(|p| normalize_item(&target, &json!({"ip": "10.0.0.1", "port": p}), "2024-01-01 00:00:00").unwrap())
            .collect();

        write_jsonl(&path, &records).unwrap();
        write_jsonl(&path, &records).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 2);
        assert!(text.lines().next().unwrap().contains(r#""source":"quake""#));
        assert_eq!(read_jsonl(&path).unwrap(), records);
    }
}
