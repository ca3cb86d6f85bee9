use csv::Writer;
use std::cmp::Ordering;
use std::fs::File;
use std::path::Path;

use crate::normalize::NormalizedRecord;
use crate::target::ClassificationRecord;

const RESULT_COLUMNS: [&str; 19] = [
    "source", "original_target", "target_type", "ip", "domain", "root_domain", "subdomain",
    "port", "protocol", "url", "title", "server", "status_code", "banner", "headers",
    "body_length", "cert_subject", "query_time", "has_https",
];

/// Absent values sort after present ones.
fn cmp_present<T: Ord>(a: &Option<T>, b: &Option<T>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.cmp(y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Presentation order: source, target type, ip, port.
pub fn sort_records(records: &mut [NormalizedRecord]) {
    records.sort_by(|a, b| {
        a.source
            .as_str()
            .cmp(b.source.as_str())
            .then_with(|| a.target_type.as_str().cmp(b.target_type.as_str()))
            .then_with(|| cmp_present(&a.ip, &b.ip))
            .then_with(|| cmp_present(&a.port, &b.port))
    });
}

pub fn write_results_csv(path: &Path, records: &[NormalizedRecord]) -> anyhow::Result<()> {
    let mut sorted = records.to_vec();
    sort_records(&mut sorted);

    let f = File::create(path)?;
    let mut w = Writer::from_writer(f);
    w.write_record(RESULT_COLUMNS)?;
    for it in &sorted {
        w.write_record(&[
            it.source.as_str().to_string(),
            it.original_target.clone(),
            it.target_type.as_str().to_string(),
            it.ip.clone().unwrap_or_default(),
            it.domain.clone().unwrap_or_default(),
            it.root_domain.clone().unwrap_or_default(),
            it.subdomain.clone().unwrap_or_default(),
            it.port.map(|p| p.to_string()).unwrap_or_default(),
            it.protocol.clone(),
            it.url.clone(),
            it.title.clone().unwrap_or_default(),
            it.server.clone().unwrap_or_default(),
            it.status_code.to_string(),
            it.banner.clone().unwrap_or_default(),
            it.headers.clone().unwrap_or_default(),
            it.body_length.to_string(),
            it.cert_subject.clone(),
            it.query_time.clone(),
            it.has_https.to_string(),
        ])?;
    }
    w.flush()?;
    Ok(())
}

pub fn write_classification_csv(path: &Path, records: &[ClassificationRecord]) -> anyhow::Result<()> {
    let f = File::create(path)?;
    let mut w = Writer::from_writer(f);
    w.write_record(["original", "processed", "classification", "expanded_count"])?;
    for it in records {
        w.write_record(&[
            it.original.clone(),
            it.processed.clone(),
            it.classification.as_str().to_string(),
            it.expanded_count.to_string(),
        ])?;
    }
    w.flush()?;
    Ok(())
}
