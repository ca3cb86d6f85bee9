pub mod classify;
pub mod range;

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

pub use classify::{classify, classify_all, strip_counter, Classification, ClassificationRecord, ClassifiedInput};

/// Kind of queryable unit a raw input resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetType {
    Ip,
    Domain,
    Subdomain,
    CSegment,
}

impl TargetType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetType::Ip => "ip",
            TargetType::Domain => "domain",
            TargetType::Subdomain => "subdomain",
            TargetType::CSegment => "c_segment",
        }
    }
}

impl fmt::Display for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified target. Immutable once built; equality covers both value and type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Target {
    pub value: String,
    pub target_type: TargetType,
}

impl Target {
    pub fn new(value: impl Into<String>, target_type: TargetType) -> Self {
        Self { value: value.into(), target_type }
    }

    pub fn ip(value: impl Into<String>) -> Self {
        Self::new(value, TargetType::Ip)
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.value, self.target_type)
    }
}

/// Drop repeated targets, keeping the first occurrence of each.
pub fn dedup_targets(targets: Vec<Target>) -> Vec<Target> {
    let mut seen = HashSet::with_capacity(targets.len());
    targets.into_iter().filter(|t| seen.insert(t.clone())).collect()
}
