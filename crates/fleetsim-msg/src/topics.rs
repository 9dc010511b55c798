//! ---
//! sim_section: "02-messaging-data-model"
//! sim_subsection: "module"
//! sim_type: "source"
//! sim_scope: "code"
//! sim_description: "Message schema helpers for simulator payloads."
//! sim_version: "v0.1.0"
//! sim_owner: "tbd"
//! ---
//! Fixed topic category roots. The device identity is appended as the final
//! topic level, so retained messages keep one last-known value per device.

/// Continuous machine telemetry.
pub const TOPIC_TELEMETRY_ROOT: &str = "iiot/telemetry/machine";

/// Discrete production events.
pub const TOPIC_PRODUCTION_ROOT: &str = "iiot/event/production";

/// Threshold and health alerts.
pub const TOPIC_ALERT_ROOT: &str = "iiot/event/alert";

/// Machine status transitions.
pub const TOPIC_STATUS_UPDATE_ROOT: &str = "iiot/event/status_update";
