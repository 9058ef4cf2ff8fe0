//! Hidden-navigation strategy.
//!
//! Each candidate gets its own invisible surface. The surface is parked on a blank
//! document, then pointed at the candidate; the moment its document becomes
//! inaccessible (it "unloads") the navigation reached the name.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lanprobe_common::{
    candidate::{Candidate, OnFound},
    capability::{HiddenSurface, SurfaceHost},
    config::StrategyConfig,
    error::{CapabilityError, ResolveError},
};
use tracing::{debug, trace, warn};

use super::{ProbeStrategy, StrategyKind, emit};
use crate::batch;
use crate::confirm::{DoubleProbe, Sample, timed};
use crate::rank::Found;

pub const BLANK_TARGET: &str = "about:blank";

/// Owns a surface for the duration of one candidate's probe and removes it from the
/// page when dropped, whichever way the probe ends.
pub struct SurfaceLease {
    surface: Box<dyn HiddenSurface>,
}

impl SurfaceLease {
    pub fn new(surface: Box<dyn HiddenSurface>) -> Self {
        Self { surface }
    }

    /// Parks the surface on the blank target, then times the navigation to `url`
    /// until the surface unloads.
    async fn sample(&mut self, url: &str, bound: Duration) -> Sample {
        if let Err(e) = self.surface.navigate(BLANK_TARGET).await {
            debug!(error = %e, "could not reset surface");
            return Sample::Failed;
        }

        timed(bound, async {
            if let Err(e) = self.surface.navigate(url).await {
                debug!(url, error = %e, "navigation failed");
                return false;
            }
            match self.surface.unloaded().await {
                Ok(()) => true,
                Err(e) => {
                    debug!(url, error = %e, "surface failed while waiting for unload");
                    false
                }
            }
        })
        .await
    }
}

impl Drop for SurfaceLease {
    fn drop(&mut self) {
        self.surface.remove();
    }
}

pub struct FrameStrategy {
    surfaces: Arc<dyn SurfaceHost>,
    cfg: StrategyConfig,
}

impl FrameStrategy {
    pub fn new(surfaces: Arc<dyn SurfaceHost>, cfg: StrategyConfig) -> Result<Self, ResolveError> {
        cfg.validate()?;
        Ok(Self { surfaces, cfg })
    }

    async fn probe_one(
        &self,
        index: usize,
        candidate: &Candidate,
        on_found: Option<OnFound<'_>>,
    ) -> Result<Option<Found>, CapabilityError> {
        let mut lease = match self.surfaces.create_surface().await {
            Ok(surface) => SurfaceLease::new(surface),
            Err(CapabilityError::Probe(e)) => {
                debug!(hostname = %candidate.hostname, error = %e, "could not create surface");
                return Ok(None);
            }
            Err(unavailable) => return Err(unavailable),
        };

        let url = probe_url(&candidate.hostname);
        let mut state = DoubleProbe::new();
        while let Some(bound) =
            state.next_bound(self.cfg.probe_timeout, self.cfg.confirm_threshold)
        {
            let sample = lease.sample(&url, bound).await;
            trace!(hostname = %candidate.hostname, ?sample, "navigation sample");
            state.record(sample, self.cfg.confirm_threshold);
        }
        drop(lease);

        Ok(state
            .ping()
            .map(|ping| emit(index, candidate.resolved(ping), on_found)))
    }
}

#[async_trait]
impl ProbeStrategy for FrameStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Frame
    }

    async fn probe(
        &self,
        candidates: &[Candidate],
        on_found: Option<OnFound<'_>>,
    ) -> Result<Vec<Found>, ResolveError> {
        let settled = batch::run_waves(candidates, &self.cfg, |index, candidate| async move {
            Some(self.probe_one(index, candidate, on_found).await)
        })
        .await;

        let mut found = Vec::with_capacity(settled.len());
        for outcome in settled {
            match outcome {
                Ok(Some(f)) => found.push(f),
                Ok(None) => {}
                Err(e) => {
                    warn!(error = %e, "hidden surfaces are unavailable");
                    return Err(e.into());
                }
            }
        }
        Ok(found)
    }
}

/// The trailing dot makes the name absolute so no search domain gets appended.
fn probe_url(hostname: &str) -> String {
    format!("https://{hostname}./")
}
