//! ---
//! sim_section: "04-simulation"
//! sim_subsection: "01-bootstrap"
//! sim_type: "source"
//! sim_scope: "code"
//! sim_description: "Simulation engine module exports and shared helpers."
//! sim_version: "v0.1.0"
//! sim_owner: "tbd"
//! ---
//! Sensor value generation and event decision engines for the fleetsim
//! project.
//!
//! The engines here are the deterministic heart of the simulator: given a
//! source of randomness they decide what one device tick looks like. They
//! hold no connection state and can be driven entirely from tests.

pub mod events;
pub mod sensors;

pub use events::{
    EventEngine, TickDecision, ALERT_EVENT_PROBABILITY, PRODUCTION_EVENT_PROBABILITY,
    STATUS_CHANGE_REASON,
};
pub use sensors::SensorRig;

/// Round to two decimals, matching the precision of the published readings.
pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
