//! # lanprobe engine
//!
//! Infers which candidate hostnames resolve on the local network using only
//! client-observable timing and connection-completion signals.
//!
//! * **[`resolver`]**: the strategy contract, the three strategies, and the registry.
//! * **[`batch`]**: bounded-concurrency waves.
//! * **[`confirm`]**: the double-probe noise filter.
//! * **[`rank`]**: deterministic result ordering.
//! * **[`network`]**: native stand-ins for the browser primitives.

pub mod batch;
pub mod confirm;
pub mod network;
pub mod rank;
pub mod resolver;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use resolver::{Capabilities, ProbeStrategy, Resolver, StrategyKind};
