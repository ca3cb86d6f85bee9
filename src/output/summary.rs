use ahash::{AHashMap, AHashSet};
use csv::Writer;
use serde::Serialize;
use std::fs::File;
use std::hash::Hash;
use std::path::Path;

use crate::normalize::NormalizedRecord;

const TOP_N: usize = 20;

/// Aggregates over the deduplicated record set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total_results: usize,
    pub unique_ips: usize,
    pub unique_domains: usize,
    pub by_source: Vec<(String, usize)>,
    pub by_target_type: Vec<(String, usize)>,
    pub top_ports: Vec<(u16, usize)>,
    pub top_hosts: Vec<(String, usize)>,
}

/// Occurrence counts sorted by count descending, then key ascending.
fn ranked<K, I>(keys: I) -> Vec<(K, usize)>
where
    K: Hash + Eq + Ord,
    I: IntoIterator<Item = K>,
{
    let mut counts: AHashMap<K, usize> = AHashMap::new();
    for key in keys {
        *counts.entry(key).or_insert(0) += 1;
    }
    let mut ranked: Vec<(K, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked
}

pub fn summarize(records: &[NormalizedRecord]) -> Summary {
    let unique_ips = records
        .iter()
        .filter_map(|r| r.ip.as_deref())
        .collect::<AHashSet<_>>()
        .len();
    let unique_domains = records
        .iter()
        .filter_map(|r| r.domain.as_deref())
        .collect::<AHashSet<_>>()
        .len();

    let mut top_ports = ranked(records.iter().filter_map(|r| r.port));
    top_ports.truncate(TOP_N);
    let mut top_hosts = ranked(records.iter().map(|r| r.original_target.clone()));
    top_hosts.truncate(TOP_N);

    Summary {
        total_results: records.len(),
        unique_ips,
        unique_domains,
        by_source: ranked(records.iter().map(|r| r.source.as_str().to_string())),
        by_target_type: ranked(records.iter().map(|r| r.target_type.as_str().to_string())),
        top_ports,
        top_hosts,
    }
}

fn counted(rows: &[(String, usize)]) -> Vec<(String, String)> {
    rows.iter().map(|(k, n)| (k.clone(), n.to_string())).collect()
}

/// Write every aggregate into one CSV. Each section starts with its own
/// header row and sections are separated by a blank row.
pub fn write_summary_csv(path: &Path, summary: &Summary) -> anyhow::Result<()> {
    let f = File::create(path)?;
    let mut w = Writer::from_writer(f);

    let overview = vec![
        ("total_results".to_string(), summary.total_results.to_string()),
        ("unique_ips".to_string(), summary.unique_ips.to_string()),
        ("unique_domains".to_string(), summary.unique_domains.to_string()),
    ];
    let ports: Vec<(String, String)> = summary
        .top_ports
        .iter()
        .map(|(p, n)| (p.to_string(), n.to_string()))
        .collect();

    let sections: [(&str, [&str; 2], Vec<(String, String)>); 5] = [
        ("Overview", ["metric", "value"], overview),
        ("By Source", ["source", "count"], counted(&summary.by_source)),
        ("By Target Type", ["target_type", "count"], counted(&summary.by_target_type)),
        ("Top Ports", ["port", "count"], ports),
        ("Top Hosts", ["original_target", "result_count"], counted(&summary.top_hosts)),
    ];

    for (idx, (section, columns, rows)) in sections.iter().enumerate() {
        if idx > 0 {
            w.write_record(["", "", ""])?;
        }
        w.write_record(["section", columns[0], columns[1]])?;
        for (key, value) in rows {
            w.write_record([*section, key.as_str(), value.as_str()])?;
        }
    }
    w.flush()?;
    Ok(())
}
