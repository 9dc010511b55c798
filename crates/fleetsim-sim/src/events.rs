//! ---
//! sim_section: "04-simulation"
//! sim_subsection: "module"
//! sim_type: "source"
//! sim_scope: "code"
//! sim_description: "Per-tick event decision engine."
//! sim_version: "v0.1.0"
//! sim_owner: "tbd"
//! ---
use fleetsim_msg::{
    AlertData, AlertType, DeviceMessage, DevicePayload, MachineStatus, ProductionData,
    ProductionEventType, QualityStatus, Severity, StatusUpdateData, TelemetryData,
};
use rand::prelude::*;

use crate::round2;

/// Per-tick probability of a production event.
pub const PRODUCTION_EVENT_PROBABILITY: f64 = 0.20;
/// Per-tick probability of an alert event.
pub const ALERT_EVENT_PROBABILITY: f64 = 0.05;
/// Fixed reason tag carried by every status-change event.
pub const STATUS_CHANGE_REASON: &str = "simulated_change";

const ALERT_VALUE_RANGE: std::ops::RangeInclusive<f64> = 50.0..=100.0;

/// Everything one tick decided to publish. Telemetry is unconditional; the
/// three event slots fire independently.
#[derive(Debug, Clone, PartialEq)]
pub struct TickDecision {
    pub telemetry: TelemetryData,
    pub production: Option<ProductionData>,
    pub alert: Option<AlertData>,
    pub status_update: Option<StatusUpdateData>,
}

impl TickDecision {
    /// Number of messages this tick will publish (1 to 4).
    pub fn message_count(&self) -> usize {
        1 + usize::from(self.production.is_some())
            + usize::from(self.alert.is_some())
            + usize::from(self.status_update.is_some())
    }

    /// Wrap the decision into publishable envelopes, in the fixed per-tick
    /// order: telemetry, production, alert, status-change. All share the one
    /// timestamp captured for the tick.
    pub fn into_messages(self, device_id: &str, timestamp: i64) -> Vec<DeviceMessage> {
        let mut messages = Vec::with_capacity(self.message_count());
        messages.push(DeviceMessage::new(
            device_id,
            timestamp,
            DevicePayload::Telemetry(self.telemetry),
        ));
        if let Some(production) = self.production {
            messages.push(DeviceMessage::new(
                device_id,
                timestamp,
                DevicePayload::EventProduction(production),
            ));
        }
        if let Some(alert) = self.alert {
            messages.push(DeviceMessage::new(
                device_id,
                timestamp,
                DevicePayload::EventAlert(alert),
            ));
        }
        if let Some(status_update) = self.status_update {
            messages.push(DeviceMessage::new(
                device_id,
                timestamp,
                DevicePayload::EventStatusUpdate(status_update),
            ));
        }
        messages
    }
}

/// Decides which event categories fire on a tick and builds their payloads.
///
/// The engine records the machine status seen on the previous tick so that a
/// transition is reported exactly once. It is owned by a single device
/// session and never shared.
#[derive(Debug)]
pub struct EventEngine {
    rng: StdRng,
    previous_status: Option<MachineStatus>,
}

impl EventEngine {
    /// Engine seeded from OS entropy, for production use.
    pub fn from_entropy() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Deterministically seeded engine, for tests.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            rng,
            previous_status: None,
        }
    }

    /// Status recorded at the end of the previous tick, if any tick completed.
    pub fn previous_status(&self) -> Option<MachineStatus> {
        self.previous_status
    }

    /// Decide the full set of messages for one tick. The probability draws
    /// are independent of each other; the status-change check compares the
    /// tick's status against the recorded previous status and updates the
    /// record immediately, so an unchanged status never re-reports.
    pub fn decide(&mut self, device_id: &str, telemetry: TelemetryData) -> TickDecision {
        let status = telemetry.machine_status;

        let production = if self.rng.gen::<f64>() < PRODUCTION_EVENT_PROBABILITY {
            Some(self.production_event())
        } else {
            None
        };

        let alert = if self.rng.gen::<f64>() < ALERT_EVENT_PROBABILITY {
            Some(self.alert_event(device_id))
        } else {
            None
        };

        let status_update = if self.previous_status != Some(status) {
            let update = StatusUpdateData {
                old_status: self.previous_status,
                new_status: status,
                reason: STATUS_CHANGE_REASON.to_owned(),
            };
            self.previous_status = Some(status);
            Some(update)
        } else {
            None
        };

        TickDecision {
            telemetry,
            production,
            alert,
            status_update,
        }
    }

    fn production_event(&mut self) -> ProductionData {
        ProductionData {
            event_type: ProductionEventType::UnitProduced,
            product_sku: format!("PROD_XYZ_{:03}", self.rng.gen_range(100..=999)),
            unit_count: 1,
            batch_id: format!("BATCH_{:04}", self.rng.gen_range(1000..=9999)),
            quality_status: QualityStatus::PendingAnalysis,
        }
    }

    fn alert_event(&mut self, device_id: &str) -> AlertData {
        let alert_type = AlertType::ALL[self.rng.gen_range(0..AlertType::ALL.len())];
        let severity = Severity::ALL[self.rng.gen_range(0..Severity::ALL.len())];
        AlertData {
            alert_type,
            severity,
            message: format!("Alert: {} detected on {}", alert_type.as_str(), device_id),
            current_value: round2(self.rng.gen_range(ALERT_VALUE_RANGE)),
        }
    }
}
