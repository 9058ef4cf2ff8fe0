//! Tuning knobs for the probe strategies.
//!
//! The numbers are empirical. They trade wall-clock time against the accuracy of the
//! timing oracle and carry no accuracy guarantee.

use std::time::Duration;

use crate::error::ResolveError;

/// Per-strategy tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StrategyConfig {
    /// Maximum number of probes in flight at once, also the batch size.
    pub concurrency_limit: usize,
    /// Bound on a single timing sample (or on a whole negotiation for topology).
    pub probe_timeout: Duration,
    /// A confirmation sample must land strictly under this.
    pub confirm_threshold: Duration,
    /// Pause between consecutive waves. Not applied after the last one.
    pub inter_batch_delay: Duration,
}

impl StrategyConfig {
    pub fn fetch() -> Self {
        Self {
            concurrency_limit: 50,
            probe_timeout: Duration::from_millis(1_000),
            confirm_threshold: Duration::from_millis(100),
            inter_batch_delay: Duration::from_millis(100),
        }
    }

    pub fn frame() -> Self {
        Self {
            concurrency_limit: 10,
            probe_timeout: Duration::from_millis(2_000),
            confirm_threshold: Duration::from_millis(500),
            inter_batch_delay: Duration::ZERO,
        }
    }

    pub fn topology() -> Self {
        Self {
            concurrency_limit: 8,
            probe_timeout: Duration::from_millis(5_000),
            confirm_threshold: Duration::ZERO,
            inter_batch_delay: Duration::ZERO,
        }
    }

    pub fn validate(&self) -> Result<(), ResolveError> {
        if self.concurrency_limit == 0 {
            return Err(ResolveError::InvalidConfig(
                "concurrency limit must be at least 1".into(),
            ));
        }
        if self.probe_timeout.is_zero() {
            return Err(ResolveError::InvalidConfig(
                "probe timeout must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

/// Tuning for every strategy in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolverConfig {
    pub fetch: StrategyConfig,
    pub frame: StrategyConfig,
    pub topology: StrategyConfig,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            fetch: StrategyConfig::fetch(),
            frame: StrategyConfig::frame(),
            topology: StrategyConfig::topology(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = ResolverConfig::default();
        assert!(cfg.fetch.validate().is_ok());
        assert!(cfg.frame.validate().is_ok());
        assert!(cfg.topology.validate().is_ok());
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let cfg = StrategyConfig {
            concurrency_limit: 0,
            ..StrategyConfig::fetch()
        };
        assert!(matches!(cfg.validate(), Err(ResolveError::InvalidConfig(_))));
    }
}
