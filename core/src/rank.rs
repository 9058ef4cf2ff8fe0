//! Final ordering of confirmed candidates.

use lanprobe_common::candidate::ResolvedCandidate;

/// A confirmed candidate along with its position in the input list.
#[derive(Debug, Clone)]
pub struct Found {
    pub index: usize,
    pub resolved: ResolvedCandidate,
}

/// Sorts by ascending ping, ties broken by input position.
///
/// Discovery order never leaks into the result. Every entry is kept; repeats are
/// removed before probing, not here.
pub fn rank(mut found: Vec<Found>) -> Vec<ResolvedCandidate> {
    found.sort_by_key(|f| (f.resolved.ping, f.index));
    found.into_iter().map(|f| f.resolved).collect()
}
