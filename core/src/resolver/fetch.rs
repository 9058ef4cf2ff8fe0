//! Opaque-timing strategy.
//!
//! Cross-origin requests never tell us whether they succeeded, only whether they
//! settled before we gave up on them. A local name resolves and answers (or refuses)
//! almost at once; a name nobody owns hangs until the timeout.

use std::sync::Arc;

use async_trait::async_trait;
use lanprobe_common::{
    candidate::{Candidate, OnFound},
    capability::HttpProbe,
    config::StrategyConfig,
    error::{FetchError, ResolveError},
};
use tracing::{debug, trace};

use super::{ProbeStrategy, StrategyKind, emit};
use crate::batch;
use crate::confirm::{DoubleProbe, Sample, timed};
use crate::rank::Found;

pub struct FetchStrategy {
    http: Arc<dyn HttpProbe>,
    cfg: StrategyConfig,
}

impl FetchStrategy {
    pub fn new(http: Arc<dyn HttpProbe>, cfg: StrategyConfig) -> Result<Self, ResolveError> {
        cfg.validate()?;
        Ok(Self { http, cfg })
    }

    async fn probe_one(
        &self,
        index: usize,
        candidate: &Candidate,
        on_found: Option<OnFound<'_>>,
    ) -> Option<Found> {
        let url = probe_url(&candidate.hostname);
        let mut state = DoubleProbe::new();

        while let Some(bound) =
            state.next_bound(self.cfg.probe_timeout, self.cfg.confirm_threshold)
        {
            let sample = self.sample(&url, bound).await;
            trace!(hostname = %candidate.hostname, ?sample, "fetch sample");
            state.record(sample, self.cfg.confirm_threshold);
        }

        let ping = state.ping()?;
        Some(emit(index, candidate.resolved(ping), on_found))
    }

    async fn sample(&self, url: &str, bound: std::time::Duration) -> Sample {
        timed(bound, async {
            match self.http.fetch(url).await {
                Ok(()) | Err(FetchError::Opaque(_)) => true,
                Err(FetchError::Rejected(reason)) => {
                    debug!(url, %reason, "fetch probe rejected");
                    false
                }
            }
        })
        .await
    }
}

#[async_trait]
impl ProbeStrategy for FetchStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Fetch
    }

    async fn probe(
        &self,
        candidates: &[Candidate],
        on_found: Option<OnFound<'_>>,
    ) -> Result<Vec<Found>, ResolveError> {
        Ok(batch::run_waves(candidates, &self.cfg, |index, candidate| {
            self.probe_one(index, candidate, on_found)
        })
        .await)
    }
}

fn probe_url(hostname: &str) -> String {
    format!("https://{hostname}/")
}
