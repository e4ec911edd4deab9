use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio::time;
use tracing::{debug, info};

use crate::services;
use crate::types::OpenPort;

/// Deadline for the banner read, independent of the connect timeout.
pub const BANNER_TIMEOUT: Duration = Duration::from_secs(1);
/// Upper bound on banner bytes read from a single port.
pub const BANNER_BUF_LEN: usize = 1024;

/// Probe one port with a bounded TCP connect and a short passive banner grab.
///
/// Returns `None` for any connect failure (refused, timed out, unreachable, ...);
/// those cases are not distinguished. Once connected the port is reported open
/// whether or not a banner could be read.
pub async fn probe_port(ip: IpAddr, port: u16, connect_timeout: Duration) -> Option<OpenPort> {
    let addr = SocketAddr::new(ip, port);
    let mut stream = match time::timeout(connect_timeout, TcpStream::connect(addr)).await {
        Ok(Ok(stream)) => stream,
        Ok(Err(e)) => {
            debug!(%addr, error = %e, "connect failed");
            return None;
        }
        Err(_) => {
            debug!(%addr, "connect timed out");
            return None;
        }
    };

    let banner = read_banner(&mut stream).await;
    drop(stream);

    let service = services::lookup(port);
    info!(%addr, service, "port open");
    Some(OpenPort {
        port,
        service: service.to_string(),
        banner,
    })
}

/// Read once, up to [`BANNER_BUF_LEN`] bytes, within [`BANNER_TIMEOUT`].
async fn read_banner(stream: &mut TcpStream) -> String {
    let mut buf = vec![0u8; BANNER_BUF_LEN];
    match time::timeout(BANNER_TIMEOUT, stream.read(&mut buf)).await {
        Ok(Ok(n)) => decode_banner(&buf[..n]),
        Ok(Err(e)) => {
            debug!(error = %e, "banner read failed");
            String::new()
        }
        Err(_) => String::new(),
    }
}

/// Decode banner bytes as UTF-8, dropping invalid sequences and surrounding whitespace.
pub fn decode_banner(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        out.push_str(chunk.valid());
    }
    out.trim().to_string()
}
