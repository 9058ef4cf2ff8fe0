//! Builds candidate lists out of hostname patterns and names.

use tracing::trace;

use crate::candidate::Candidate;

/// Substituted by each name when a pattern is expanded.
pub const NAME_PLACEHOLDER: &str = "<name>";

/// Device base names used when the caller has no better guess.
pub const DEVICE_BASE_NAMES: &[&str] = &["macbook-pro", "macbook-air", "imac", "mac-mini", "mac"];

/// The three hostname shapes devices commonly pick for themselves.
pub fn default_patterns(devices: &[&str]) -> Vec<String> {
    devices
        .iter()
        .flat_map(|device| {
            [
                format!("{NAME_PLACEHOLDER}s-{device}.local"),
                format!("{device}-{NAME_PLACEHOLDER}.local"),
                format!("{device}.local"),
            ]
        })
        .collect()
}

/// Expands every pattern against every name.
///
/// Patterns without the placeholder are used once, unlabelled. Results are
/// lower-cased; blank patterns and names are skipped.
pub fn expand(patterns: &[String], names: &[String]) -> Vec<Candidate> {
    let names: Vec<&str> = names
        .iter()
        .map(|n| n.trim())
        .filter(|n| !n.is_empty())
        .collect();

    let mut candidates = Vec::new();
    for pattern in patterns.iter().map(|p| p.trim()).filter(|p| !p.is_empty()) {
        if !pattern.contains(NAME_PLACEHOLDER) {
            candidates.push(Candidate::new(pattern.to_lowercase()));
            continue;
        }
        for name in &names {
            let hostname = pattern.replace(NAME_PLACEHOLDER, name).to_lowercase();
            candidates.push(Candidate::new(hostname).with_label(*name));
        }
    }

    trace!(
        patterns = patterns.len(),
        names = names.len(),
        candidates = candidates.len(),
        "expanded patterns"
    );
    candidates
}
