pub mod concurrent;
pub mod config;
pub mod engine;
pub mod error;
pub mod http_client;
pub mod input;
pub mod normalize;
pub mod output;
pub mod scan;
pub mod sources;
pub mod target;
pub mod throttle;
pub mod utils;

// re-export the types most callers need
pub use crate::config::ScannerConfig;
pub use crate::engine::{Scanner, ScanResults};
pub use crate::error::{ConfigError, SourceError};
pub use crate::normalize::NormalizedRecord;
pub use crate::output::{ScanOutcome, ScanReport};
pub use crate::scan::{run_scan, run_with_inputs};
pub use crate::target::{Target, TargetType};
