use std::collections::HashSet;

use crate::error::ConfigError;

/// Inclusive bounds used when a range scan leaves `start` or `end` unset.
pub const DEFAULT_RANGE_START: u32 = 1;
pub const DEFAULT_RANGE_END: u32 = 1024;

/// Commonly interesting ports scanned by `--top-ports`.
pub const PRESET_PORTS: &[u16] = &[
    21, 22, 23, 25, 53, 80, 110, 139, 143, 443, 445, 3389, 8080, 3306, 5900, 995, 1723, 111, 993,
];

/// How the set of ports to probe is chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortSelection {
    /// Every port from `start` to `end`, inclusive.
    Range { start: u32, end: u32 },
    /// The curated [`PRESET_PORTS`] list.
    Preset,
    /// An explicit list, usually parsed with [`parse_ports_str`].
    List(Vec<u16>),
}

impl Default for PortSelection {
    fn default() -> Self {
        PortSelection::Range {
            start: DEFAULT_RANGE_START,
            end: DEFAULT_RANGE_END,
        }
    }
}

/// Produce the deduplicated port list for a selection.
pub fn build(selection: &PortSelection) -> Result<Vec<u16>, ConfigError> {
    let ports = match selection {
        PortSelection::Range { start, end } => range_ports(*start, *end)?,
        PortSelection::Preset => preset_ports(),
        PortSelection::List(list) => dedup_ports(list),
    };
    if ports.is_empty() {
        return Err(ConfigError::EmptyPortSet);
    }
    Ok(ports)
}

/// Enumerate `start..=end`. Both bounds must lie in 1..=65535 and `start <= end`.
pub fn range_ports(start: u32, end: u32) -> Result<Vec<u16>, ConfigError> {
    let start = check_port(start)?;
    let end = check_port(end)?;
    if start > end {
        return Err(ConfigError::InvalidRange {
            start: start.into(),
            end: end.into(),
        });
    }
    Ok((start..=end).collect())
}

/// The preset list with repeats removed, in first-appearance order.
pub fn preset_ports() -> Vec<u16> {
    dedup_ports(PRESET_PORTS)
}

/// Drop repeated ports, keeping the first occurrence of each.
pub fn dedup_ports(ports: &[u16]) -> Vec<u16> {
    let mut seen = HashSet::with_capacity(ports.len());
    ports.iter().copied().filter(|p| seen.insert(*p)).collect()
}

/// Parse a ports expression into a deduplicated list of TCP ports (1..=65535).
///
/// Entries are separated by commas or newlines and may be:
/// - single port number: `80`
/// - inclusive range: `8000-8010`
/// - comments: everything after `#` on a line is ignored
pub fn parse_ports_str(s: &str) -> Result<Vec<u16>, ConfigError> {
    let mut out: Vec<u16> = Vec::new();
    let mut seen = HashSet::new();

    for raw_line in s.lines() {
        let line = raw_line.split('#').next().unwrap_or("");
        for token in line.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            if let Some((a, b)) = token.split_once('-') {
                let start = parse_port_token(a.trim())?;
                let end = parse_port_token(b.trim())?;
                for p in range_ports(start, end)? {
                    if seen.insert(p) {
                        out.push(p);
                    }
                }
                continue;
            }

            let p = check_port(parse_port_token(token)?)?;
            if seen.insert(p) {
                out.push(p);
            }
        }
    }

    Ok(out)
}

fn parse_port_token(s: &str) -> Result<u32, ConfigError> {
    s.parse::<u32>()
        .map_err(|_| ConfigError::InvalidPort(s.to_string()))
}

fn check_port(val: u32) -> Result<u16, ConfigError> {
    match u16::try_from(val) {
        Ok(p) if p != 0 => Ok(p),
        _ => Err(ConfigError::PortOutOfRange(val)),
    }
}
