//! Shared building blocks for `lanprobe`.
//!
//! * **[`candidate`]**: what gets probed and what comes back.
//! * **[`capability`]**: the narrow async interfaces the engine probes through.
//! * **[`config`]**: tuning knobs per strategy.
//! * **[`error`]**: the error taxonomy.
//! * **[`pattern`]**: candidate generation from name patterns.

pub mod candidate;
pub mod capability;
pub mod config;
pub mod error;
pub mod pattern;
