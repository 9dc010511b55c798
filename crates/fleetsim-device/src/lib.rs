//! ---
//! sim_section: "05-fleet-runtime"
//! sim_subsection: "01-bootstrap"
//! sim_type: "source"
//! sim_scope: "code"
//! sim_description: "Fleet runtime module exports."
//! sim_version: "v0.1.0"
//! sim_owner: "tbd"
//! ---
//! Device session state machine and fleet supervision for the fleetsim
//! project.
//!
//! Each simulated device runs as an independent task driving a
//! `Connecting → Running → Disconnecting → Stopped` lifecycle; the fleet
//! supervisor spawns the configured number of sessions with staggered
//! startup and joins them all on shutdown.

pub mod session;
pub mod supervisor;

pub use session::{DeviceSession, SessionError, SessionState};
pub use supervisor::{FleetHandle, FleetSupervisor, StopTrigger};
