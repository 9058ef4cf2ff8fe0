//! # Native Capabilities
//!
//! Stand-ins for the browser primitives, for running the engine from a terminal.
//!
//! * [`tcp`]: opaque requests as a bare TCP handshake.
//! * [`lookup`]: navigation completion as a system resolver lookup.
//!
//! There is no native peer-connection primitive, so the topology strategy reports
//! itself unsupported here.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::sync::Semaphore;

pub mod lookup;
pub mod tcp;

/// Outstanding system lookups allowed by [`LookupGate::default`].
pub const DEFAULT_LOOKUP_LIMIT: usize = 16;

/// Bounds how many system resolver lookups run at once.
///
/// A system lookup occupies a blocking-pool thread until the resolver gives up,
/// and dropping its future does not stop it. Each lookup therefore runs in its own
/// task holding a permit for as long as it really lasts, so lookups abandoned by a
/// probe timeout keep counting against the limit instead of piling up unseen.
/// Waiting for a permit still delays the probe that asked; a limit that is too
/// low for the wave size turns into slow samples.
#[derive(Debug, Clone)]
pub struct LookupGate {
    permits: Arc<Semaphore>,
    limit: usize,
}

impl LookupGate {
    pub fn new(limit: usize) -> Self {
        Self {
            permits: Arc::new(Semaphore::new(limit)),
            limit,
        }
    }

    /// Lookups currently holding a permit, abandoned ones included.
    pub fn outstanding(&self) -> usize {
        self.limit - self.permits.available_permits()
    }

    /// Resolves `host` through the system resolver once a permit is free.
    pub async fn lookup(&self, host: &str, port: u16) -> io::Result<Vec<SocketAddr>> {
        let permit = self
            .permits
            .clone()
            .acquire_owned()
            .await
            .map_err(io::Error::other)?;

        let host = host.to_string();
        let task = tokio::spawn(async move {
            let _permit = permit;
            tokio::net::lookup_host((host.as_str(), port))
                .await
                .map(|addrs| addrs.collect::<Vec<SocketAddr>>())
        });
        task.await.map_err(io::Error::other)?
    }
}

impl Default for LookupGate {
    fn default() -> Self {
        Self::new(DEFAULT_LOOKUP_LIMIT)
    }
}

/// Pulls the host out of a probe URL such as `https://name.local/`.
pub(crate) fn host_of(url: &str) -> Option<&str> {
    let rest = url.split_once("://").map_or(url, |(_, rest)| rest);
    rest.split(['/', '?', '#'])
        .next()
        .filter(|host| !host.is_empty())
}
