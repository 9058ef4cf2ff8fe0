mod disposal;
mod properties;

use std::sync::Arc;
use std::time::Duration;

use lanprobe_common::{candidate::Candidate, config::ResolverConfig};
use lanprobe_core::test_utils::{FakeHttp, FakePeerFactory, FakeSurfaceHost};
use lanprobe_core::{Capabilities, Resolver};

pub fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

pub fn candidates(hosts: &[&str]) -> Vec<Candidate> {
    hosts.iter().map(|h| Candidate::new(*h)).collect()
}

/// Tight, delay-free tuning so tests read in round numbers.
pub fn test_config() -> ResolverConfig {
    let mut cfg = ResolverConfig::default();
    cfg.fetch.concurrency_limit = 4;
    cfg.fetch.inter_batch_delay = Duration::ZERO;
    cfg.frame.concurrency_limit = 4;
    cfg.topology.concurrency_limit = 3;
    cfg
}

pub fn resolver(
    http: Option<Arc<FakeHttp>>,
    surfaces: Option<Arc<FakeSurfaceHost>>,
    peers: Option<Arc<FakePeerFactory>>,
) -> Resolver {
    let mut caps = Capabilities::default();
    if let Some(http) = http {
        caps = caps.with_http(http);
    }
    if let Some(surfaces) = surfaces {
        caps = caps.with_surfaces(surfaces);
    }
    if let Some(peers) = peers {
        caps = caps.with_peers(peers);
    }
    Resolver::new(caps, test_config())
}
