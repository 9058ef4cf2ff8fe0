use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use lanprobe_common::{
    capability::{HiddenSurface, SurfaceHost},
    error::{CapabilityError, ProbeError},
};
use tracing::trace;

use super::{LookupGate, host_of};
use crate::resolver::frame::BLANK_TARGET;

const HTTPS_PORT: u16 = 443;

/// Hands out surfaces whose "navigation" is a system resolver lookup: the surface
/// unloads once the target name resolves, and never does otherwise.
///
/// Removing a surface does not stop its lookup; the [`LookupGate`] keeps counting
/// it until the resolver answers.
#[derive(Default)]
pub struct LookupSurfaceHost {
    live: Arc<AtomicUsize>,
    lookups: LookupGate,
}

impl LookupSurfaceHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shares `lookups` with other native capabilities.
    pub fn with_lookups(mut self, lookups: LookupGate) -> Self {
        self.lookups = lookups;
        self
    }

    /// Surfaces created and not yet removed.
    pub fn live(&self) -> usize {
        self.live.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl SurfaceHost for LookupSurfaceHost {
    async fn create_surface(&self) -> Result<Box<dyn HiddenSurface>, CapabilityError> {
        self.live.fetch_add(1, Ordering::Relaxed);
        Ok(Box::new(LookupSurface {
            live: Some(self.live.clone()),
            lookups: self.lookups.clone(),
            target: None,
        }))
    }
}

struct LookupSurface {
    live: Option<Arc<AtomicUsize>>,
    lookups: LookupGate,
    target: Option<String>,
}

#[async_trait]
impl HiddenSurface for LookupSurface {
    async fn navigate(&mut self, url: &str) -> Result<(), ProbeError> {
        if url == BLANK_TARGET {
            self.target = None;
            return Ok(());
        }
        let host = host_of(url).ok_or_else(|| ProbeError::new(format!("no host in {url}")))?;
        self.target = Some(host.to_string());
        Ok(())
    }

    async fn unloaded(&mut self) -> Result<(), ProbeError> {
        let Some(host) = self.target.as_deref() else {
            return std::future::pending().await;
        };
        match self.lookups.lookup(host, HTTPS_PORT).await {
            Ok(_) => Ok(()),
            Err(e) => {
                trace!(host, error = %e, "lookup failed");
                std::future::pending().await
            }
        }
    }

    fn remove(&mut self) {
        if let Some(live) = self.live.take() {
            live.fetch_sub(1, Ordering::Relaxed);
        }
    }
}
