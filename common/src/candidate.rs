//! # Candidate Model
//!
//! A [`Candidate`] is a hostname offered for resolution, optionally tagged with a
//! caller-chosen label. A [`ResolvedCandidate`] is a candidate that a probe strategy
//! confirmed, paired with the latency it was confirmed at.

use std::fmt;
use std::time::Duration;

/// A hostname proposed for local-network resolution.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Candidate {
    /// Opaque pass-through, e.g. the personal name a pattern was expanded with.
    pub label: Option<String>,
    /// Fully qualified, lower-cased local name.
    pub hostname: String,
}

impl Candidate {
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            label: None,
            hostname: hostname.into(),
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// A hostname that is empty or carries whitespace can never be probed.
    pub fn is_well_formed(&self) -> bool {
        !self.hostname.is_empty() && !self.hostname.chars().any(char::is_whitespace)
    }

    pub fn resolved(&self, ping: Duration) -> ResolvedCandidate {
        ResolvedCandidate {
            candidate: self.clone(),
            ping,
        }
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.label {
            Some(label) => write!(f, "{} ({label})", self.hostname),
            None => write!(f, "{}", self.hostname),
        }
    }
}

/// A candidate a strategy confirmed as resolving on the local network.
///
/// `ping` is only comparable against other results of the same run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedCandidate {
    pub candidate: Candidate,
    pub ping: Duration,
}

impl ResolvedCandidate {
    pub fn hostname(&self) -> &str {
        &self.candidate.hostname
    }

    pub fn label(&self) -> Option<&str> {
        self.candidate.label.as_deref()
    }

    pub fn ping_ms(&self) -> f64 {
        self.ping.as_secs_f64() * 1_000.0
    }
}

/// Progress callback, invoked once per confirmed candidate in confirmation order.
pub type OnFound<'a> = &'a (dyn Fn(&ResolvedCandidate) + Send + Sync);
