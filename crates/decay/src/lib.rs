//! Decay bookkeeping: which objects expire when.
//!
//! # Invariants
//! - At most one entry per object.
//! - The by-object map and the by-time index always hold exactly the same entries.
//!
//! Eligibility rules and the sweep itself live in the kernel, which owns the
//! objects those rules inspect.

mod config;
mod registry;
mod stats;

pub use config::DecayConfig;
pub use registry::{DecayEntry, DecayRegistry, Upsert};
pub use stats::{DecayStatistics, RunningStats};

pub fn crate_info() -> &'static str {
    "realmkeep-decay v0.1.0"
}
