use super::SourceKind;
use crate::target::{Target, TargetType};

/// Build the service-specific filter for a target. Every query pins
/// `status_code=200`.
pub fn build_query(kind: SourceKind, target: &Target) -> Option<String> {
    let value = target.value.as_str();
    if value.is_empty() {
        tracing::error!(source = %kind, target_type = %target.target_type, "cannot build query for empty target");
        return None;
    }

    let eq = match kind {
        SourceKind::Fofa => "=",
        SourceKind::Quake => ":",
    };

    let predicate = match target.target_type {
        TargetType::Ip | TargetType::CSegment => format!("ip{}\"{}\"", eq, value),
        TargetType::Domain => format!("domain{}\"{}\"", eq, value),
        TargetType::Subdomain => match kind {
            SourceKind::Fofa => format!("(domain=\"{0}\" || domain=\"*{0}\")", value),
            SourceKind::Quake => format!("(domain:\"{0}\" || domain:\"*.{0}\")", value),
        },
    };

    Some(format!("status_code=200 && {}", predicate))
}
