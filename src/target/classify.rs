use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

use super::range;
use super::{Target, TargetType};

static COUNTER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\(\d+\)$").expect("valid counter regex"));
static SUBDOMAIN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9-]{0,61}\.[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
        .expect("valid subdomain regex")
});
static DOMAIN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9][a-zA-Z0-9-]{0,61}(?:\.[a-zA-Z0-9-]{1,63})*\.[a-zA-Z]{2,}$")
        .expect("valid domain regex")
});

/// Label reported for each raw input in the classification report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Ip,
    IpRange,
    CSegment,
    Subdomain,
    Domain,
    Unrecognised,
}

impl Classification {
    pub fn as_str(&self) -> &'static str {
        match self {
            Classification::Ip => "ip",
            Classification::IpRange => "ip_range",
            Classification::CSegment => "c_segment",
            Classification::Subdomain => "subdomain",
            Classification::Domain => "domain",
            Classification::Unrecognised => "unrecognised",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassificationRecord {
    pub original: String,
    pub processed: String,
    pub classification: Classification,
    pub expanded_count: usize,
}

#[derive(Debug, Clone)]
pub struct ClassifiedInput {
    pub targets: Vec<Target>,
    pub record: ClassificationRecord,
}

impl ClassifiedInput {
    fn new(original: &str, processed: String, classification: Classification, targets: Vec<Target>) -> Self {
        let expanded_count = match classification {
            Classification::IpRange => targets.len(),
            _ => 1,
        };
        Self {
            targets,
            record: ClassificationRecord {
                original: original.to_string(),
                processed,
                classification,
                expanded_count,
            },
        }
    }
}

/// Trim whitespace and a trailing `(<digits>)` counter.
pub fn strip_counter(raw: &str) -> &str {
    let trimmed = raw.trim();
    match COUNTER_RE.find(trimmed) {
        Some(m) => trimmed[..m.start()].trim_end(),
        None => trimmed,
    }
}

pub fn is_valid_domain(value: &str) -> bool {
    DOMAIN_RE.is_match(value)
}

pub fn is_valid_subdomain(value: &str) -> bool {
    SUBDOMAIN_RE.is_match(value)
}

fn host_from_url(value: &str) -> Option<String> {
    Url::parse(value).ok()?.host_str().map(|h| h.to_string())
}

/// Classify one raw input value and expand it into targets.
pub fn classify(raw: &str) -> ClassifiedInput {
    let mut processed = strip_counter(raw).to_string();

    if processed.starts_with("http://") || processed.starts_with("https://") {
        match host_from_url(&processed) {
            Some(host) if is_valid_domain(&host) => processed = host,
            _ => {
                let mut rejected = ClassifiedInput::new(raw, processed, Classification::Unrecognised, Vec::new());
                rejected.record.expanded_count = 0;
                return rejected;
            }
        }
    }

    if processed.is_empty() {
        return ClassifiedInput::new(raw, processed, Classification::Unrecognised, Vec::new());
    }

    if let Some(ip) = range::parse_ipv4(&processed) {
        let targets = vec![Target::ip(ip.to_string())];
        return ClassifiedInput::new(raw, processed, Classification::Ip, targets);
    }

    if processed.contains('-') || processed.contains('/') {
        let ips = range::expand(&processed);
        if !ips.is_empty() {
            let targets = ips.into_iter().map(|ip| Target::ip(ip.to_string())).collect();
            return ClassifiedInput::new(raw, processed, Classification::IpRange, targets);
        }
        if range::is_c_segment(&processed) {
            let targets = vec![Target::new(range::c_segment_cidr(&processed), TargetType::CSegment)];
            return ClassifiedInput::new(raw, processed, Classification::CSegment, targets);
        }
        // no address form matched; hyphenated host names fall through
    }

    if range::is_c_segment(&processed) {
        let targets = vec![Target::new(range::c_segment_cidr(&processed), TargetType::CSegment)];
        return ClassifiedInput::new(raw, processed, Classification::CSegment, targets);
    }

    if is_valid_subdomain(&processed) {
        let targets = vec![Target::new(processed.clone(), TargetType::Subdomain)];
        return ClassifiedInput::new(raw, processed, Classification::Subdomain, targets);
    }

    if is_valid_domain(&processed) {
        let targets = vec![Target::new(processed.clone(), TargetType::Domain)];
        return ClassifiedInput::new(raw, processed, Classification::Domain, targets);
    }

    ClassifiedInput::new(raw, processed, Classification::Unrecognised, Vec::new())
}

/// Classify every non-empty raw value. Targets come back in input order,
/// duplicates included.
pub fn classify_all<S: AsRef<str>>(raw_values: &[S]) -> (Vec<Target>, Vec<ClassificationRecord>) {
    let mut targets = Vec::new();
    let mut records = Vec::new();

    for raw in raw_values {
        let raw = raw.as_ref();
        if strip_counter(raw).is_empty() {
            continue;
        }
        let classified = classify(raw);
        if classified.record.classification == Classification::Unrecognised {
            tracing::debug!(input = %raw, "unrecognised input");
        }
        targets.extend(classified.targets);
        records.push(classified.record);
    }

    (targets, records)
}
