//! ---
//! sim_section: "05-fleet-runtime"
//! sim_subsection: "module"
//! sim_type: "source"
//! sim_scope: "code"
//! sim_description: "Per-device session state machine and tick loop."
//! sim_version: "v0.1.0"
//! sim_owner: "tbd"
//! ---
use std::time::Duration;

use fleetsim_common::unix_timestamp;
use fleetsim_sim::{EventEngine, SensorRig};
use fleetsim_transport::{QosLevel, Transport, TransportError};
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Every message the simulator publishes requests exactly-once delivery.
const PUBLISH_QOS: QosLevel = QosLevel::ExactlyOnce;
/// Messages are retained so late subscribers receive the last value per topic.
const PUBLISH_RETAIN: bool = true;

/// Lifecycle states of a device session. There is no valid path back to
/// `Connecting`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Running,
    Disconnecting,
    Stopped,
}

/// Fatal session failures surfaced to the fleet supervisor.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The broker handshake failed; the session never reached `Running`.
    #[error("broker handshake failed for {device_id}: {source}")]
    Connect {
        /// Identity of the affected device.
        device_id: String,
        #[source]
        source: TransportError,
    },
}

/// Transient tick failures; cause orderly shutdown of one device only.
#[derive(Debug, Error)]
enum TickError {
    #[error("serializing payload for '{topic}': {source}")]
    Serialize {
        topic: String,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// One simulated device: identity, engines, transport, and lifecycle state.
pub struct DeviceSession<T: Transport> {
    device_id: String,
    tick_interval: Duration,
    transport: T,
    sensors: SensorRig,
    events: EventEngine,
    state: SessionState,
}

impl<T: Transport> DeviceSession<T> {
    /// Create a session with entropy-seeded engines.
    pub fn new(device_id: impl Into<String>, tick_interval: Duration, transport: T) -> Self {
        Self::with_engines(
            device_id,
            tick_interval,
            transport,
            SensorRig::from_entropy(),
            EventEngine::from_entropy(),
        )
    }

    /// Create a session with caller-provided engines, for deterministic tests.
    pub fn with_engines(
        device_id: impl Into<String>,
        tick_interval: Duration,
        transport: T,
        sensors: SensorRig,
        events: EventEngine,
    ) -> Self {
        Self {
            device_id: device_id.into(),
            tick_interval,
            transport,
            sensors,
            events,
            state: SessionState::Connecting,
        }
    }

    /// Identity of this device.
    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Drive the session to completion: connect, tick until a stop request or
    /// an unrecoverable error, then disconnect. The transport is closed on
    /// every exit path. A connect failure is returned as fatal; tick failures
    /// shut this device down without propagating.
    pub async fn run(mut self, mut stop: broadcast::Receiver<()>) -> Result<(), SessionError> {
        info!(device = %self.device_id, transport = self.transport.name(), "session connecting");
        if let Err(source) = self.transport.connect().await {
            error!(device = %self.device_id, error = %source, "broker handshake failed");
            self.release().await;
            return Err(SessionError::Connect {
                device_id: self.device_id,
                source,
            });
        }

        self.transition(SessionState::Running);
        let mut ticker = interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = stop.recv() => {
                    info!(device = %self.device_id, "stop request received");
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(err) = self.run_tick().await {
                        error!(device = %self.device_id, error = %err, "tick failed; shutting device down");
                        break;
                    }
                }
            }
        }

        self.release().await;
        Ok(())
    }

    /// One complete tick. All decisions are made before the first publish, so
    /// a cancelled tick never leaves a partial message set behind.
    async fn run_tick(&mut self) -> Result<(), TickError> {
        let timestamp = unix_timestamp();
        let telemetry = self.sensors.sample();
        let decision = self.events.decide(&self.device_id, telemetry);

        for message in decision.into_messages(&self.device_id, timestamp) {
            let topic = message.topic();
            let kind = message.payload.kind();
            let payload = serde_json::to_vec(&message).map_err(|source| TickError::Serialize {
                topic: topic.clone(),
                source,
            })?;
            if kind == "telemetry" {
                debug!(device = %self.device_id, topic = %topic, "telemetry published");
            } else {
                info!(
                    device = %self.device_id,
                    topic = %topic,
                    payload = %String::from_utf8_lossy(&payload),
                    "event published"
                );
            }
            self.transport
                .publish(&topic, payload, PUBLISH_QOS, PUBLISH_RETAIN)
                .await?;
        }
        Ok(())
    }

    /// Enter `Disconnecting`, close the transport, and reach `Stopped`.
    async fn release(&mut self) {
        self.transition(SessionState::Disconnecting);
        if let Err(err) = self.transport.disconnect().await {
            warn!(device = %self.device_id, error = %err, "transport close failed");
        }
        self.transition(SessionState::Stopped);
    }

    fn transition(&mut self, next: SessionState) {
        info!(device = %self.device_id, from = ?self.state, to = ?next, "session state transition");
        self.state = next;
    }
}
