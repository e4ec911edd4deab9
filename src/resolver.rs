use std::net::IpAddr;

use tokio::net::lookup_host;
use tracing::debug;

use crate::error::ScanError;

/// Resolve a hostname or literal address to the single address that will be scanned.
///
/// Literal addresses are returned as-is. For hostnames the first IPv4 address is
/// preferred, falling back to the first IPv6 one.
pub async fn resolve(target: &str) -> Result<IpAddr, ScanError> {
    let target = target.trim();
    if let Ok(ip) = target.parse::<IpAddr>() {
        return Ok(ip);
    }

    // The port is a placeholder required by the resolver API.
    let addrs: Vec<IpAddr> = lookup_host((target, 0))
        .await
        .map_err(|source| ScanError::Resolve {
            target: target.to_string(),
            source,
        })?
        .map(|sa| sa.ip())
        .collect();

    let ip = addrs
        .iter()
        .find(|ip| ip.is_ipv4())
        .or_else(|| addrs.first())
        .copied()
        .ok_or_else(|| ScanError::NoAddress(target.to_string()))?;

    debug!(%ip, target, "resolved target");
    Ok(ip)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    #[tokio::test]
    async fn literal_addresses_pass_through() {
        assert_eq!(
            resolve("127.0.0.1").await.unwrap(),
            IpAddr::V4(Ipv4Addr::LOCALHOST)
        );
        assert_eq!(resolve(" ::1 ").await.unwrap(), IpAddr::V6(Ipv6Addr::LOCALHOST));
    }

    #[tokio::test]
    async fn unresolvable_name_is_an_error() {
        let err = resolve("no-such-host.invalid").await.unwrap_err();
        assert!(matches!(
            err,
            ScanError::Resolve { .. } | ScanError::NoAddress(_)
        ));
    }
}
