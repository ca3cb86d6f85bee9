pub mod fofa;
pub mod quake;
pub mod record;

pub use record::{build_url, capture_timestamp, split_domain, NormalizedRecord};
