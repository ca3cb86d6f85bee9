use once_cell::sync::Lazy;
use regex::Regex;
use std::net::Ipv4Addr;

static CIDR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+\.\d+\.\d+\.\d+/\d+$").expect("valid cidr regex"));
static FULL_RANGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d+\.\d+\.\d+\.\d+-\d+\.\d+\.\d+\.\d+$").expect("valid range regex")
});
static SUFFIX_RANGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+\.\d+\.\d+\.\d+-\d+$").expect("valid suffix range regex"));
static C_SEGMENT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+\.\d+\.\d+\.0(?:/24)?$").expect("valid c-segment regex"));

/// Parse an IPv4 address in dotted form or as a plain 32-bit integer.
pub fn parse_ipv4(value: &str) -> Option<Ipv4Addr> {
    if !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()) {
        return value.parse::<u32>().ok().map(Ipv4Addr::from);
    }
    value.parse().ok()
}

/// Parse `a.b.c.d/n` into its network address (host bits cleared) and prefix.
pub fn parse_network(value: &str) -> Option<(Ipv4Addr, u8)> {
    let (addr, prefix) = value.split_once('/')?;
    let addr: Ipv4Addr = addr.parse().ok()?;
    let prefix: u8 = prefix.parse().ok()?;
    if prefix > 32 {
        return None;
    }
    let mask = if prefix == 0 { 0 } else { u32::MAX << (32 - prefix) };
    Some((Ipv4Addr::from(u32::from(addr) & mask), prefix))
}

/// Usable host addresses of a network. /31 and /32 have no network or
/// broadcast address to exclude.
pub fn network_hosts(network: Ipv4Addr, prefix: u8) -> Vec<Ipv4Addr> {
    let start = u32::from(network);
    let last = (u64::from(start) + (1u64 << (32 - u32::from(prefix))) - 1) as u32;
    match prefix {
        32 => vec![network],
        31 => vec![Ipv4Addr::from(start), Ipv4Addr::from(last)],
        _ => (start + 1..last).map(Ipv4Addr::from).collect(),
    }
}

pub fn is_c_segment(value: &str) -> bool {
    if value.contains('/') {
        return matches!(parse_network(value), Some((_, 24)));
    }
    C_SEGMENT_RE.is_match(value)
}

/// Canonical `/24` form of a C segment literal.
pub fn c_segment_cidr(value: &str) -> String {
    if value.contains('/') {
        value.to_string()
    } else {
        format!("{}/24", value)
    }
}

/// Expand a single address, an address range or a CIDR block into host
/// addresses. Anything unparseable or reversed yields nothing.
pub fn expand(value: &str) -> Vec<Ipv4Addr> {
    if let Some(ip) = parse_ipv4(value) {
        return vec![ip];
    }

    if value.matches('-').count() == 1 {
        if FULL_RANGE_RE.is_match(value) {
            return expand_full_range(value);
        }
        if SUFFIX_RANGE_RE.is_match(value) {
            return expand_suffix_range(value);
        }
    }

    if CIDR_RE.is_match(value) {
        return parse_network(value)
            .map(|(network, prefix)| network_hosts(network, prefix))
            .unwrap_or_default();
    }

    Vec::new()
}

fn expand_full_range(value: &str) -> Vec<Ipv4Addr> {
    let Some((start, end)) = value.split_once('-') else {
        return Vec::new();
    };
    let (Ok(start), Ok(end)) = (start.parse::<Ipv4Addr>(), end.parse::<Ipv4Addr>()) else {
        return Vec::new();
    };
    let (start, end) = (u32::from(start), u32::from(end));
    if end < start {
        return Vec::new();
    }
    (start..=end).map(Ipv4Addr::from).collect()
}

fn expand_suffix_range(value: &str) -> Vec<Ipv4Addr> {
    let Some((base, last)) = value.split_once('-') else {
        return Vec::new();
    };
    let (Ok(base), Ok(last)) = (base.parse::<Ipv4Addr>(), last.parse::<u8>()) else {
        return Vec::new();
    };
    let [a, b, c, first] = base.octets();
    if last < first {
        return Vec::new();
    }
    (first..=last).map(|d| Ipv4Addr::new(a, b, c, d)).collect()
}
