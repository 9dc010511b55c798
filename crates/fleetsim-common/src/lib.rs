//! ---
//! sim_section: "01-core-functionality"
//! sim_subsection: "module"
//! sim_type: "source"
//! sim_scope: "code"
//! sim_description: "Shared primitives and utilities for the simulator runtime."
//! sim_version: "v0.1.0"
//! sim_owner: "tbd"
//! ---
//! Core shared primitives for the fleetsim workspace.
//! This crate exposes configuration loading, logging initialisation, and
//! time utilities consumed across the workspace.

pub mod config;
pub mod logging;
pub mod time;

pub use config::{BrokerConfig, FleetConfig, SimulatorConfig};
pub use logging::init_tracing;
pub use time::unix_timestamp;
