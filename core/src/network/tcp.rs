use std::io;
use std::net::SocketAddr;

use async_trait::async_trait;
use lanprobe_common::{capability::HttpProbe, error::FetchError};
use tokio::net::TcpStream;
use tracing::trace;

use super::{LookupGate, host_of};

const HTTPS_PORT: u16 = 443;

/// Treats a TCP handshake with the host as the opaque request.
///
/// A name that resolves answers with either an accept or a refusal, both of which
/// settle the probe. A name that does not resolve never settles, leaving the
/// engine's timeout to classify it.
///
/// Name lookups go through a [`LookupGate`]. A lookup for a missing `.local` name
/// can outlive the probe that started it by seconds, and while the gate is full
/// new probes queue, which reads as extra latency.
pub struct TcpHandshakeProbe {
    port: u16,
    lookups: LookupGate,
}

impl TcpHandshakeProbe {
    pub fn new(port: u16) -> Self {
        Self {
            port,
            lookups: LookupGate::default(),
        }
    }

    /// Shares `lookups` with other native capabilities.
    pub fn with_lookups(mut self, lookups: LookupGate) -> Self {
        self.lookups = lookups;
        self
    }
}

impl Default for TcpHandshakeProbe {
    fn default() -> Self {
        Self::new(HTTPS_PORT)
    }
}

#[async_trait]
impl HttpProbe for TcpHandshakeProbe {
    async fn fetch(&self, url: &str) -> Result<(), FetchError> {
        let host = host_of(url).ok_or_else(|| FetchError::Rejected(format!("no host in {url}")))?;

        let addrs: Vec<SocketAddr> = match self.lookups.lookup(host, self.port).await {
            Ok(addrs) => addrs,
            Err(e) if e.kind() == io::ErrorKind::InvalidInput => {
                return Err(FetchError::Rejected(e.to_string()));
            }
            Err(e) => {
                trace!(host, error = %e, "lookup failed");
                return std::future::pending().await;
            }
        };

        match TcpStream::connect(addrs.as_slice()).await {
            Ok(_) => Ok(()),
            Err(e) => Err(FetchError::Opaque(e.to_string())),
        }
    }
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn handshake_with_listening_port_settles() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let probe = TcpHandshakeProbe::new(port);

        assert_eq!(probe.fetch("https://127.0.0.1/").await, Ok(()));
    }

    #[tokio::test]
    async fn url_without_host_is_rejected() {
        let probe = TcpHandshakeProbe::default();
        assert!(matches!(probe.fetch("https:///").await, Err(FetchError::Rejected(_))));
    }

    #[tokio::test]
    #[ignore]
    async fn unresolvable_name_never_settles() {
        let probe = TcpHandshakeProbe::default();
        let settled = tokio::time::timeout(
            std::time::Duration::from_millis(500),
            probe.fetch("https://no-such-host.invalid/"),
        )
        .await;
        assert!(settled.is_err());
    }
}
