//! ---
//! sim_section: "01-core-functionality"
//! sim_subsection: "module"
//! sim_type: "source"
//! sim_scope: "code"
//! sim_description: "Shared primitives and utilities for the simulator runtime."
//! sim_version: "v0.1.0"
//! sim_owner: "tbd"
//! ---
use chrono::Utc;

/// Current wall-clock time as whole Unix seconds.
///
/// Every payload emitted within one device tick shares a single timestamp
/// captured at the start of the tick.
pub fn unix_timestamp() -> i64 {
    Utc::now().timestamp()
}
