use thiserror::Error;

/// Failures that reject a whole resolution request.
///
/// "Nothing resolved" is never one of these; it is an empty result.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("unknown strategy '{0}' (expected fetch, frame or topology)")]
    UnknownStrategy(String),

    #[error("strategy '{0}' is not supported by this host")]
    Unsupported(&'static str),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("malformed candidate at position {index}: {hostname:?}")]
    InvalidCandidate { index: usize, hostname: String },

    #[error("strategy setup failed: {0}")]
    Setup(#[from] CapabilityError),
}

/// Outcome of an opaque request that did not succeed.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The request completed but its result is hidden from us. Still counts as settled.
    #[error("opaque failure: {0}")]
    Opaque(String),

    /// The request could not be issued at all.
    #[error("request rejected: {0}")]
    Rejected(String),
}

/// A single probe failed for reasons unrelated to timing.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct ProbeError(pub String);

impl ProbeError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }
}

/// Failure to acquire a probing primitive from the host.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CapabilityError {
    /// The primitive does not exist on this host at all.
    #[error("{0} is unavailable")]
    Unavailable(&'static str),

    #[error(transparent)]
    Probe(#[from] ProbeError),
}
