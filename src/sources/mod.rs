//! Attack-surface search services.
//!
//! Each service implements [`SearchSource`]: it turns a [`Target`] into its
//! own query language, performs one HTTP call per query and maps its native
//! items onto [`NormalizedRecord`]. The retry guard and the scanner only ever
//! see the trait.

pub mod fofa;
pub mod quake;
pub mod query;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::SourceError;
use crate::normalize::NormalizedRecord;
use crate::target::Target;

pub use fofa::FofaSource;
pub use quake::QuakeSource;
pub use query::build_query;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Fofa,
    Quake,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Fofa => "fofa",
            SourceKind::Quake => "quake",
        }
    }

    /// Upper-case name used in log lines.
    pub fn label(&self) -> &'static str {
        match self {
            SourceKind::Fofa => "FOFA",
            SourceKind::Quake => "QUAKE",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[async_trait]
pub trait SearchSource: Send + Sync {
    fn kind(&self) -> SourceKind;

    /// Query string for `target`, or `None` when no query can be built.
    fn build_query(&self, target: &Target) -> Option<String> {
        query::build_query(self.kind(), target)
    }

    /// One network call. Returns the raw service items on success.
    async fn execute(&self, query: &str) -> Result<Vec<Value>, SourceError>;

    /// Map one raw item, or drop it when it has no usable host.
    fn normalize(&self, target: &Target, item: &Value, captured_at: &str) -> Option<NormalizedRecord>;
}
