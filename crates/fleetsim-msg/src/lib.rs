//! ---
//! sim_section: "02-messaging-data-model"
//! sim_subsection: "module"
//! sim_type: "source"
//! sim_scope: "code"
//! sim_description: "Message schema helpers for simulator payloads."
//! sim_version: "v0.1.0"
//! sim_owner: "tbd"
//! ---
//! Wire payload schema shared by the simulator runtime and its tests.
//!
//! Every record published by a device carries a Unix-seconds timestamp, the
//! device identity, and a `payload_type` discriminator; the schema here
//! mirrors that envelope exactly so serializing and deserializing any payload
//! recovers all fields unchanged.

pub mod topics;
pub mod types;

pub use topics::{
    TOPIC_ALERT_ROOT, TOPIC_PRODUCTION_ROOT, TOPIC_STATUS_UPDATE_ROOT, TOPIC_TELEMETRY_ROOT,
};
pub use types::{
    AlertData, AlertType, DeviceMessage, DevicePayload, ErrorCode, MachineStatus, ProductionData,
    ProductionEventType, QualityStatus, Severity, StatusUpdateData, TelemetryData,
};
