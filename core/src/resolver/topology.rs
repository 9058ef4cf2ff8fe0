//! Topology-disclosure strategy.
//!
//! Two loopback peer connections negotiate with each other, but every address each
//! side offers is swapped for the batch's candidate hostnames (see [`sdp`]). The
//! connectivity check then races the candidates against each other, and the
//! selected path discloses the single one that was actually reachable.

use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use async_trait::async_trait;
use lanprobe_common::{
    candidate::{Candidate, OnFound},
    capability::{DataChannel, PeerConnection, PeerConnectionFactory},
    config::StrategyConfig,
    error::{CapabilityError, ProbeError, ResolveError},
};
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use super::{ProbeStrategy, StrategyKind, emit};
use crate::batch::{self, ProbeBatch};
use crate::rank::Found;

pub mod sdp;

/// Lifecycle of one batch's negotiation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkState {
    Idle,
    Negotiating,
    /// Carries the remote foundation of the selected path, if one was reported.
    Connected { foundation: Option<String> },
    Failed(String),
    TimedOut,
}

impl LinkState {
    fn advance(&mut self, next: LinkState) {
        trace!(from = ?self, to = ?next, "link state");
        *self = next;
    }
}

trait Teardown {
    fn teardown(&mut self);
}

impl Teardown for dyn PeerConnection {
    fn teardown(&mut self) {
        self.close();
    }
}

impl Teardown for dyn DataChannel {
    fn teardown(&mut self) {
        self.close();
    }
}

/// Closes what it holds when dropped.
struct Closing<T: Teardown + ?Sized>(Box<T>);

impl<T: Teardown + ?Sized> Deref for Closing<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: Teardown + ?Sized> DerefMut for Closing<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.0
    }
}

impl<T: Teardown + ?Sized> Drop for Closing<T> {
    fn drop(&mut self) {
        self.0.teardown();
    }
}

/// Both endpoints and the data channel of one batch.
///
/// Fields drop in declaration order: the channel first, then the answering side,
/// then the offering side.
struct PeerSession {
    _channel: Closing<dyn DataChannel>,
    remote: Closing<dyn PeerConnection>,
    local: Closing<dyn PeerConnection>,
}

impl PeerSession {
    fn open(peers: &dyn PeerConnectionFactory) -> Result<Self, CapabilityError> {
        let mut local = Closing(peers.create()?);
        let remote = Closing(peers.create()?);

        let label = rand::random::<u64>().to_string();
        let channel = Closing(local.create_data_channel(&label)?);

        Ok(Self {
            _channel: channel,
            remote,
            local,
        })
    }

    /// Runs the offer/answer exchange with rewritten address lists and waits for
    /// the answering side to connect.
    async fn negotiate(&mut self, hostnames: &[&str]) -> Result<Option<String>, ProbeError> {
        let local = &mut *self.local;
        let remote = &mut *self.remote;

        let offer = local.create_offer().await?;
        local.set_local_description(offer).await?;
        local.gathering_complete().await?;
        let offer = local
            .local_description()
            .ok_or_else(|| ProbeError::new("offering side has no local description"))?;

        remote.set_remote_description(sdp::rewrite(&offer, hostnames)).await?;
        let answer = remote.create_answer().await?;
        remote.set_local_description(answer).await?;
        remote.gathering_complete().await?;
        let answer = remote
            .local_description()
            .ok_or_else(|| ProbeError::new("answering side has no local description"))?;

        local.set_remote_description(sdp::rewrite(&answer, hostnames)).await?;
        remote.connected().await?;

        Ok(remote.selected_remote_foundation())
    }
}

pub struct TopologyStrategy {
    peers: Arc<dyn PeerConnectionFactory>,
    cfg: StrategyConfig,
}

impl TopologyStrategy {
    pub fn new(
        peers: Arc<dyn PeerConnectionFactory>,
        cfg: StrategyConfig,
    ) -> Result<Self, ResolveError> {
        cfg.validate()?;
        Ok(Self { peers, cfg })
    }

    /// Yields at most one confirmed candidate: the protocol only discloses the
    /// winning path.
    async fn probe_batch(
        &self,
        batch: ProbeBatch<'_>,
        on_found: Option<OnFound<'_>>,
    ) -> Result<Option<Found>, CapabilityError> {
        let start = Instant::now();
        let mut state = LinkState::Idle;

        let mut session = match PeerSession::open(self.peers.as_ref()) {
            Ok(session) => session,
            Err(CapabilityError::Probe(e)) => {
                debug!(offset = batch.offset, error = %e, "peer connection setup failed");
                return Ok(None);
            }
            Err(unavailable) => return Err(unavailable),
        };

        let hostnames: Vec<&str> = batch.candidates.iter().map(|c| c.hostname.as_str()).collect();
        state.advance(LinkState::Negotiating);
        let negotiation = session.negotiate(&hostnames);
        let next = match tokio::time::timeout(self.cfg.probe_timeout, negotiation).await {
            Ok(Ok(foundation)) => LinkState::Connected { foundation },
            Ok(Err(e)) => LinkState::Failed(e.to_string()),
            Err(_elapsed) => LinkState::TimedOut,
        };
        state.advance(next);
        let ping = start.elapsed();
        drop(session);

        debug!(offset = batch.offset, size = batch.len(), ?state, "negotiation settled");
        let LinkState::Connected { foundation: Some(foundation) } = state else {
            return Ok(None);
        };
        let Some(i) = sdp::foundation_index(&foundation, batch.len()) else {
            debug!(%foundation, "selected path does not map to a candidate");
            return Ok(None);
        };

        Ok(Some(emit(batch.offset + i, batch.candidates[i].resolved(ping), on_found)))
    }
}

#[async_trait]
impl ProbeStrategy for TopologyStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Topology
    }

    async fn probe(
        &self,
        candidates: &[Candidate],
        on_found: Option<OnFound<'_>>,
    ) -> Result<Vec<Found>, ResolveError> {
        let mut found = Vec::new();

        for (wave, batch) in batch::partition(candidates, self.cfg.concurrency_limit).enumerate() {
            batch::pause_between(wave, self.cfg.inter_batch_delay).await;
            match self.probe_batch(batch, on_found).await {
                Ok(Some(f)) => found.push(f),
                Ok(None) => {}
                Err(e) => {
                    warn!(error = %e, "peer connections are unavailable");
                    return Err(e.into());
                }
            }
        }

        Ok(found)
    }
}
