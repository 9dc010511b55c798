//! ---
//! sim_section: "02-messaging-data-model"
//! sim_subsection: "module"
//! sim_type: "source"
//! sim_scope: "code"
//! sim_description: "Message schema helpers for simulator payloads."
//! sim_version: "v0.1.0"
//! sim_owner: "tbd"
//! ---
use serde::{Deserialize, Serialize};

use crate::topics;

/// Operating state of a simulated machine, drawn each tick from a fixed
/// weighted distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MachineStatus {
    Running,
    Idle,
    Fault,
    Maintenance,
}

impl MachineStatus {
    /// Wire spelling of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            MachineStatus::Running => "running",
            MachineStatus::Idle => "idle",
            MachineStatus::Fault => "fault",
            MachineStatus::Maintenance => "maintenance",
        }
    }
}

impl std::fmt::Display for MachineStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for MachineStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(MachineStatus::Running),
            "idle" => Ok(MachineStatus::Idle),
            "fault" => Ok(MachineStatus::Fault),
            "maintenance" => Ok(MachineStatus::Maintenance),
            other => Err(format!("unknown machine status: {}", other)),
        }
    }
}

/// Error codes attached to telemetry while a machine reports `fault`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    #[serde(rename = "E001_Overheat")]
    Overheat,
    #[serde(rename = "E002_Jammed")]
    Jammed,
    #[serde(rename = "E003_SensorFailure")]
    SensorFailure,
    #[serde(rename = "E004_PowerLoss")]
    PowerLoss,
}

impl ErrorCode {
    /// The full fixed set, in wire order.
    pub const ALL: [ErrorCode; 4] = [
        ErrorCode::Overheat,
        ErrorCode::Jammed,
        ErrorCode::SensorFailure,
        ErrorCode::PowerLoss,
    ];
}

/// Alert categories raised by the simulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AlertType {
    VibrationExceededThreshold,
    TemperatureCritical,
    SensorOffline,
}

impl AlertType {
    /// The full fixed set, in wire order.
    pub const ALL: [AlertType; 3] = [
        AlertType::VibrationExceededThreshold,
        AlertType::TemperatureCritical,
        AlertType::SensorOffline,
    ];

    /// Wire spelling of the alert category.
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertType::VibrationExceededThreshold => "VIBRATION_EXCEEDED_THRESHOLD",
            AlertType::TemperatureCritical => "TEMPERATURE_CRITICAL",
            AlertType::SensorOffline => "SENSOR_OFFLINE",
        }
    }
}

/// Alert severity scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// The full fixed set, in ascending order.
    pub const ALL: [Severity; 4] = [
        Severity::Low,
        Severity::Medium,
        Severity::High,
        Severity::Critical,
    ];
}

/// Kind discriminator for production events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductionEventType {
    UnitProduced,
}

/// Quality verdict attached to production events. The simulator never grades
/// units itself; quality determination is deferred to a downstream consumer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityStatus {
    PendingAnalysis,
}

/// Continuous sensor readings plus the machine status for one tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryData {
    pub temperature_celsius: f64,
    pub humidity_percent: f64,
    pub vibration_hz: f64,
    pub motor_rpm: u32,
    pub current_amps: f64,
    pub machine_status: MachineStatus,
    /// Populated if and only if `machine_status` is `fault`.
    pub error_code: Option<ErrorCode>,
}

/// A produced unit, emitted with fixed per-tick probability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionData {
    pub event_type: ProductionEventType,
    pub product_sku: String,
    pub unit_count: u32,
    pub batch_id: String,
    pub quality_status: QualityStatus,
}

/// A threshold or health alert, emitted with fixed per-tick probability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertData {
    pub alert_type: AlertType,
    pub severity: Severity,
    pub message: String,
    pub current_value: f64,
}

/// A machine status transition, emitted only when the status changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusUpdateData {
    /// `None` before the first tick ever completed; serialized as `"unknown"`.
    #[serde(with = "maybe_unknown_status")]
    pub old_status: Option<MachineStatus>,
    pub new_status: MachineStatus,
    pub reason: String,
}

/// Payload carried by a device message, discriminated by `payload_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "payload_type", content = "data", rename_all = "snake_case")]
pub enum DevicePayload {
    Telemetry(TelemetryData),
    EventProduction(ProductionData),
    EventAlert(AlertData),
    EventStatusUpdate(StatusUpdateData),
}

impl DevicePayload {
    /// Payload kind as the wire discriminator string.
    pub fn kind(&self) -> &'static str {
        match self {
            DevicePayload::Telemetry(_) => "telemetry",
            DevicePayload::EventProduction(_) => "event_production",
            DevicePayload::EventAlert(_) => "event_alert",
            DevicePayload::EventStatusUpdate(_) => "event_status_update",
        }
    }

    /// Topic category root this payload is published under.
    pub fn topic_root(&self) -> &'static str {
        match self {
            DevicePayload::Telemetry(_) => topics::TOPIC_TELEMETRY_ROOT,
            DevicePayload::EventProduction(_) => topics::TOPIC_PRODUCTION_ROOT,
            DevicePayload::EventAlert(_) => topics::TOPIC_ALERT_ROOT,
            DevicePayload::EventStatusUpdate(_) => topics::TOPIC_STATUS_UPDATE_ROOT,
        }
    }
}

/// Complete record published by a device: envelope plus payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceMessage {
    /// Publish-time Unix timestamp in whole seconds.
    pub timestamp: i64,
    /// Identity of the emitting device.
    pub device_id: String,
    #[serde(flatten)]
    pub payload: DevicePayload,
}

impl DeviceMessage {
    /// Wrap a payload into the published envelope.
    pub fn new(device_id: impl Into<String>, timestamp: i64, payload: DevicePayload) -> Self {
        Self {
            timestamp,
            device_id: device_id.into(),
            payload,
        }
    }

    /// Full topic this message is published on: `<category-root>/<device-id>`.
    pub fn topic(&self) -> String {
        format!("{}/{}", self.payload.topic_root(), self.device_id)
    }
}

mod maybe_unknown_status {
    //! The broker-facing schema predates typed statuses: a transition out of
    //! the initial state reports `old_status: "unknown"` rather than null.
    use serde::de::Error as DeError;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::MachineStatus;

    pub fn serialize<S: Serializer>(
        value: &Option<MachineStatus>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(status) => status.serialize(serializer),
            None => serializer.serialize_str("unknown"),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<MachineStatus>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        if raw == "unknown" {
            return Ok(None);
        }
        raw.parse::<MachineStatus>().map(Some).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip_json(message: &DeviceMessage) -> DeviceMessage {
        let json = serde_json::to_string(message).expect("serialize json");
        serde_json::from_str(&json).expect("deserialize json")
    }

    fn telemetry_message() -> DeviceMessage {
        DeviceMessage::new(
            "machine_001",
            1_700_000_000,
            DevicePayload::Telemetry(TelemetryData {
                temperature_celsius: 24.51,
                humidity_percent: 61.02,
                vibration_hz: 17.4,
                motor_rpm: 2100,
                current_amps: 8.73,
                machine_status: MachineStatus::Fault,
                error_code: Some(ErrorCode::Overheat),
            }),
        )
    }

    #[test]
    fn every_payload_kind_roundtrips_unchanged() {
        let messages = vec![
            telemetry_message(),
            DeviceMessage::new(
                "machine_002",
                1_700_000_001,
                DevicePayload::EventProduction(ProductionData {
                    event_type: ProductionEventType::UnitProduced,
                    product_sku: "PROD_XYZ_123".to_owned(),
                    unit_count: 1,
                    batch_id: "BATCH_4711".to_owned(),
                    quality_status: QualityStatus::PendingAnalysis,
                }),
            ),
            DeviceMessage::new(
                "machine_002",
                1_700_000_002,
                DevicePayload::EventAlert(AlertData {
                    alert_type: AlertType::TemperatureCritical,
                    severity: Severity::Critical,
                    message: "Alert: TEMPERATURE_CRITICAL detected on machine_002".to_owned(),
                    current_value: 93.17,
                }),
            ),
            DeviceMessage::new(
                "machine_003",
                1_700_000_003,
                DevicePayload::EventStatusUpdate(StatusUpdateData {
                    old_status: Some(MachineStatus::Running),
                    new_status: MachineStatus::Idle,
                    reason: "simulated_change".to_owned(),
                }),
            ),
        ];
        for message in messages {
            assert_eq!(message, roundtrip_json(&message));
        }
    }

    #[test]
    fn envelope_uses_the_documented_discriminators() {
        let value = serde_json::to_value(telemetry_message()).expect("to_value");
        assert_eq!(value["payload_type"], "telemetry");
        assert_eq!(value["device_id"], "machine_001");
        assert_eq!(value["timestamp"], 1_700_000_000_i64);
        assert_eq!(value["data"]["machine_status"], "fault");
        assert_eq!(value["data"]["error_code"], "E001_Overheat");
    }

    #[test]
    fn unknown_old_status_serializes_as_the_unknown_literal() {
        let message = DeviceMessage::new(
            "machine_001",
            1_700_000_000,
            DevicePayload::EventStatusUpdate(StatusUpdateData {
                old_status: None,
                new_status: MachineStatus::Running,
                reason: "simulated_change".to_owned(),
            }),
        );
        let value = serde_json::to_value(&message).expect("to_value");
        assert_eq!(value["payload_type"], "event_status_update");
        assert_eq!(value["data"]["old_status"], "unknown");

        let parsed: DeviceMessage = serde_json::from_value(value).expect("from_value");
        assert_eq!(message, parsed);
    }

    #[test]
    fn topics_follow_the_category_root_shape() {
        let message = telemetry_message();
        assert_eq!(message.topic(), "iiot/telemetry/machine/machine_001");
        assert_eq!(message.payload.kind(), "telemetry");
    }
}
