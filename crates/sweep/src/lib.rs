//! Background decay sweep: walks every zone of every realm on a fixed
//! period, sweeping one zone per step under the shared world lock.
//!
//! # Invariants
//! - The world lock is never held while sleeping.
//! - Every zone is visited exactly once per cycle.

mod config;
mod cursor;
mod driver;
mod shutdown;

pub use config::DriverConfig;
pub use cursor::{CursorStep, ZoneCursor};
pub use driver::{DriverError, DriverSummary, StepOutcome, SweepDriver};
pub use shutdown::ShutdownSignal;

pub fn crate_info() -> &'static str {
    "realmkeep-sweep v0.1.0"
}
