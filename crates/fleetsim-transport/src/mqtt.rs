//! ---
//! sim_section: "03-transport"
//! sim_subsection: "module"
//! sim_type: "source"
//! sim_scope: "code"
//! sim_description: "Publish/subscribe transport abstraction and backends."
//! sim_version: "v0.1.0"
//! sim_owner: "tbd"
//! ---
use async_trait::async_trait;
use fleetsim_common::BrokerConfig;
use rumqttc::{
    AsyncClient, ConnectReturnCode, Event, MqttOptions, Packet, QoS, TlsConfiguration,
    Transport as WireTransport,
};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Duration};
use tracing::{debug, warn};

use crate::{QosLevel, Result, Transport, TransportError};

/// Capacity of the client-side request queue towards the event loop.
const REQUEST_QUEUE_CAPACITY: usize = 64;

/// MQTT transport backed by a `rumqttc` asynchronous client.
///
/// The connection lifecycle is driven by explicit results rather than
/// registered callbacks: `connect` resolves once the broker CONNACK arrives,
/// and the event loop keeps running on a background task owned by this
/// transport until `disconnect` stops it.
pub struct MqttTransport {
    client_id: String,
    broker: BrokerConfig,
    client: Option<AsyncClient>,
    event_loop_task: Option<JoinHandle<()>>,
    stop: Option<watch::Sender<bool>>,
}

impl MqttTransport {
    /// Create a transport for one device. The device identity doubles as the
    /// MQTT client identifier.
    pub fn new(client_id: impl Into<String>, broker: BrokerConfig) -> Self {
        Self {
            client_id: client_id.into(),
            broker,
            client: None,
            event_loop_task: None,
            stop: None,
        }
    }

    async fn build_options(&self) -> Result<MqttOptions> {
        let mut options = MqttOptions::new(&self.client_id, &self.broker.host, self.broker.port);
        options.set_keep_alive(self.broker.keepalive);
        options.set_clean_session(true);
        if let (Some(username), Some(password)) =
            (&self.broker.username, &self.broker.password)
        {
            options.set_credentials(username, password);
        }
        if let Some(ca_path) = &self.broker.ca_certs {
            let ca = tokio::fs::read(ca_path).await.map_err(|err| {
                TransportError::Connect(format!(
                    "unable to read CA certificate {}: {}",
                    ca_path.display(),
                    err
                ))
            })?;
            options.set_transport(WireTransport::Tls(TlsConfiguration::Simple {
                ca,
                alpn: None,
                client_auth: None,
            }));
        }
        Ok(options)
    }
}

#[async_trait]
impl Transport for MqttTransport {
    async fn connect(&mut self) -> Result<()> {
        let options = self.build_options().await?;
        let (client, mut event_loop) = AsyncClient::new(options, REQUEST_QUEUE_CAPACITY);

        // Resolve the handshake before reporting success: the first CONNACK
        // decides whether the session may enter its running loop at all.
        loop {
            match event_loop.poll().await {
                Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                    if ack.code == ConnectReturnCode::Success {
                        break;
                    }
                    return Err(TransportError::Connect(format!(
                        "broker rejected session: {:?}",
                        ack.code
                    )));
                }
                Ok(_) => continue,
                Err(err) => return Err(TransportError::Connect(err.to_string())),
            }
        }

        let (stop_tx, mut stop_rx) = watch::channel(false);
        let client_id = self.client_id.clone();
        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    changed = stop_rx.changed() => {
                        if changed.is_err() || *stop_rx.borrow() {
                            debug!(client = %client_id, "mqtt delivery loop stopping");
                            break;
                        }
                    }
                    event = event_loop.poll() => {
                        if let Err(err) = event {
                            warn!(client = %client_id, error = %err, "mqtt event loop error");
                            sleep(Duration::from_secs(1)).await;
                        }
                    }
                }
            }
        });

        self.client = Some(client);
        self.event_loop_task = Some(task);
        self.stop = Some(stop_tx);
        Ok(())
    }

    async fn publish(
        &self,
        topic: &str,
        payload: Vec<u8>,
        qos: QosLevel,
        retain: bool,
    ) -> Result<()> {
        let client = self.client.as_ref().ok_or(TransportError::NotConnected)?;
        client
            .publish(topic, to_mqtt_qos(qos), retain, payload)
            .await
            .map_err(|err| TransportError::Publish {
                topic: topic.to_owned(),
                reason: err.to_string(),
            })
    }

    async fn disconnect(&mut self) -> Result<()> {
        if let Some(client) = self.client.take() {
            if let Err(err) = client.disconnect().await {
                warn!(client = %self.client_id, error = %err, "mqtt disconnect request failed");
            }
        }
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(true);
        }
        if let Some(task) = self.event_loop_task.take() {
            let _ = task.await;
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "mqtt"
    }
}

fn to_mqtt_qos(qos: QosLevel) -> QoS {
    match qos {
        QosLevel::AtMostOnce => QoS::AtMostOnce,
        QosLevel::AtLeastOnce => QoS::AtLeastOnce,
        QosLevel::ExactlyOnce => QoS::ExactlyOnce,
    }
}
