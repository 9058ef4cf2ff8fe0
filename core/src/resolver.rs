//! # Hostname Resolution
//!
//! Three interchangeable strategies share one contract ([`ProbeStrategy`]) and are
//! picked from a fixed registry by [`StrategyKind`]:
//!
//! * [`fetch`]: opaque cross-origin request timing.
//! * [`frame`]: hidden-navigation completion timing.
//! * [`topology`]: peer-connection path selection disclosure.
//!
//! **Architectural Note:**
//! Strategies never touch a network or page primitive directly; everything goes
//! through the capability ports in [`lanprobe_common::capability`], handed over
//! as [`Capabilities`].

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use lanprobe_common::{
    candidate::{Candidate, OnFound, ResolvedCandidate},
    capability::{HttpProbe, PeerConnectionFactory, SurfaceHost},
    config::ResolverConfig,
    error::ResolveError,
};
use tracing::{Instrument, debug, info_span};

use crate::rank::{self, Found};

pub mod fetch;
pub mod frame;
pub mod topology;

use fetch::FetchStrategy;
use frame::FrameStrategy;
use topology::TopologyStrategy;

/// Identifier of a strategy in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StrategyKind {
    Fetch,
    Frame,
    Topology,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 3] = [Self::Fetch, Self::Frame, Self::Topology];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Fetch => "fetch",
            Self::Frame => "frame",
            Self::Topology => "topology",
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = ResolveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ResolveError::UnknownStrategy(s.to_string()))
    }
}

/// Probing primitives the host provides. A strategy whose primitive is missing
/// reports [`ResolveError::Unsupported`].
#[derive(Clone, Default)]
pub struct Capabilities {
    pub http: Option<Arc<dyn HttpProbe>>,
    pub surfaces: Option<Arc<dyn SurfaceHost>>,
    pub peers: Option<Arc<dyn PeerConnectionFactory>>,
}

impl Capabilities {
    pub fn with_http(mut self, http: Arc<dyn HttpProbe>) -> Self {
        self.http = Some(http);
        self
    }

    pub fn with_surfaces(mut self, surfaces: Arc<dyn SurfaceHost>) -> Self {
        self.surfaces = Some(surfaces);
        self
    }

    pub fn with_peers(mut self, peers: Arc<dyn PeerConnectionFactory>) -> Self {
        self.peers = Some(peers);
        self
    }
}

/// Contract every probe strategy fulfils.
#[async_trait]
pub trait ProbeStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// Probes `candidates` and returns what was confirmed, in confirmation order.
    ///
    /// `candidates` must be well formed and free of repeats; [`ProbeStrategy::resolve`]
    /// takes care of that. `on_found` fires once per confirmed candidate, as soon as
    /// it is confirmed. Every transient resource created here is released before
    /// returning.
    ///
    /// If the host withdraws a primitive partway through, this returns
    /// [`ResolveError::Setup`] after `on_found` may already have fired for earlier
    /// confirmations. Those reports are not a partial result; the whole call failed.
    async fn probe(
        &self,
        candidates: &[Candidate],
        on_found: Option<OnFound<'_>>,
    ) -> Result<Vec<Found>, ResolveError>;

    /// Probes `candidates` and returns the confirmed ones ranked by ping.
    ///
    /// Malformed candidates reject the whole request. Repeated hostnames are probed
    /// once, at their first position. Finding nothing is an empty list.
    async fn resolve(
        &self,
        candidates: &[Candidate],
        on_found: Option<OnFound<'_>>,
    ) -> Result<Vec<ResolvedCandidate>, ResolveError> {
        let candidates = prepare(candidates)?;
        Ok(rank::rank(self.probe(&candidates, on_found).await?))
    }
}

/// Reports a confirmed candidate to the caller and wraps it for ranking.
pub(crate) fn emit(
    index: usize,
    resolved: ResolvedCandidate,
    on_found: Option<OnFound<'_>>,
) -> Found {
    debug!(
        hostname = %resolved.candidate.hostname,
        ping_ms = resolved.ping_ms(),
        "hostname resolved"
    );
    if let Some(callback) = on_found {
        callback(&resolved);
    }
    Found { index, resolved }
}

/// Entry point: the strategy registry plus the capabilities and tuning it hands out.
pub struct Resolver {
    caps: Capabilities,
    cfg: ResolverConfig,
}

impl Resolver {
    pub fn new(caps: Capabilities, cfg: ResolverConfig) -> Self {
        Self { caps, cfg }
    }

    /// Looks up the implementation registered for `kind`.
    pub fn strategy(&self, kind: StrategyKind) -> Result<Box<dyn ProbeStrategy>, ResolveError> {
        let unsupported = || ResolveError::Unsupported(kind.as_str());
        Ok(match kind {
            StrategyKind::Fetch => {
                let http = self.caps.http.clone().ok_or_else(unsupported)?;
                Box::new(FetchStrategy::new(http, self.cfg.fetch)?)
            }
            StrategyKind::Frame => {
                let surfaces = self.caps.surfaces.clone().ok_or_else(unsupported)?;
                Box::new(FrameStrategy::new(surfaces, self.cfg.frame)?)
            }
            StrategyKind::Topology => {
                let peers = self.caps.peers.clone().ok_or_else(unsupported)?;
                Box::new(TopologyStrategy::new(peers, self.cfg.topology)?)
            }
        })
    }

    /// Resolves `candidates` with the strategy registered for `kind`.
    ///
    /// See [`ProbeStrategy::resolve`].
    pub async fn resolve(
        &self,
        kind: StrategyKind,
        candidates: &[Candidate],
        on_found: Option<OnFound<'_>>,
    ) -> Result<Vec<ResolvedCandidate>, ResolveError> {
        let strategy = self.strategy(kind)?;

        let span = info_span!("resolve", strategy = %kind, candidates = candidates.len());
        strategy.resolve(candidates, on_found).instrument(span).await
    }
}

fn prepare(candidates: &[Candidate]) -> Result<Vec<Candidate>, ResolveError> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut unique = Vec::with_capacity(candidates.len());

    for (index, candidate) in candidates.iter().enumerate() {
        if !candidate.is_well_formed() {
            return Err(ResolveError::InvalidCandidate {
                index,
                hostname: candidate.hostname.clone(),
            });
        }
        if seen.insert(candidate.hostname.as_str()) {
            unique.push(candidate.clone());
        }
    }

    Ok(unique)
}
