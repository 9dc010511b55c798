//! ---
//! sim_section: "05-fleet-runtime"
//! sim_subsection: "module"
//! sim_type: "source"
//! sim_scope: "code"
//! sim_description: "Fleet supervisor spawning and joining device sessions."
//! sim_version: "v0.1.0"
//! sim_owner: "tbd"
//! ---
use fleetsim_common::SimulatorConfig;
use fleetsim_transport::Transport;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::session::{DeviceSession, SessionError};

/// Spawns and supervises one independent session per configured device.
#[derive(Debug)]
pub struct FleetSupervisor {
    config: SimulatorConfig,
}

impl FleetSupervisor {
    /// Create a supervisor for the given configuration.
    pub fn new(config: SimulatorConfig) -> Self {
        Self { config }
    }

    /// Device identities for the configured fleet:
    /// `<prefix><sequential-index>`, 3-digit zero-padded, starting at 1.
    pub fn device_ids(&self) -> Vec<String> {
        (1..=self.config.fleet.device_count)
            .map(|index| format!("{}{:03}", self.config.fleet.device_prefix, index))
            .collect()
    }

    /// Start every session, staggering launches to avoid a connection burst
    /// against the broker. The factory supplies one transport per device, so
    /// sessions share nothing.
    ///
    /// A session that fails fatally broadcasts the fleet-wide stop itself;
    /// the remaining sessions observe it within one tick interval.
    pub async fn start<T, F>(&self, make_transport: F) -> FleetHandle
    where
        T: Transport + 'static,
        F: Fn(&str) -> T,
    {
        let (stop_tx, _) = broadcast::channel(4);
        let mut sessions = Vec::with_capacity(self.config.fleet.device_count);

        for (index, device_id) in self.device_ids().into_iter().enumerate() {
            if index > 0 {
                sleep(self.config.fleet.start_stagger).await;
            }
            let transport = make_transport(&device_id);
            let session = DeviceSession::new(
                device_id.clone(),
                self.config.fleet.tick_interval,
                transport,
            );
            let stop_rx = stop_tx.subscribe();
            let stop_on_fatal = stop_tx.clone();
            let task = tokio::spawn(async move {
                let result = session.run(stop_rx).await;
                if result.is_err() {
                    let _ = stop_on_fatal.send(());
                }
                result
            });
            info!(device = %device_id, "session started");
            sessions.push(SessionHandle { device_id, task });
        }

        FleetHandle {
            stop: stop_tx,
            sessions,
        }
    }
}

struct SessionHandle {
    device_id: String,
    task: JoinHandle<Result<(), SessionError>>,
}

/// Cloneable handle for requesting a fleet-wide stop, e.g. from a signal task.
#[derive(Clone)]
pub struct StopTrigger {
    tx: broadcast::Sender<()>,
}

impl StopTrigger {
    /// Request orderly shutdown of every session.
    pub fn stop(&self) {
        let _ = self.tx.send(());
    }
}

/// Runtime handle over a started fleet.
pub struct FleetHandle {
    stop: broadcast::Sender<()>,
    sessions: Vec<SessionHandle>,
}

impl FleetHandle {
    /// Number of sessions under supervision.
    pub fn device_count(&self) -> usize {
        self.sessions.len()
    }

    /// Obtain a trigger that can stop the fleet from another task.
    pub fn stop_trigger(&self) -> StopTrigger {
        StopTrigger {
            tx: self.stop.clone(),
        }
    }

    /// Wait for every session to reach `Stopped`. Returns the first fatal
    /// session error, after all sessions have shut down.
    pub async fn join(self) -> Result<(), SessionError> {
        let FleetHandle { stop, sessions } = self;
        drop(stop);

        let mut fatal: Option<SessionError> = None;
        for handle in sessions {
            match handle.task.await {
                Ok(Ok(())) => info!(device = %handle.device_id, "session stopped"),
                Ok(Err(err)) => {
                    error!(device = %handle.device_id, error = %err, "session failed");
                    fatal.get_or_insert(err);
                }
                Err(join_err) => {
                    warn!(device = %handle.device_id, error = %join_err, "session join error");
                }
            }
        }
        match fatal {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Request a stop and wait for orderly shutdown of every session.
    pub async fn shutdown(self) -> Result<(), SessionError> {
        let _ = self.stop.send(());
        self.join().await
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    use fleetsim_transport::InMemoryTransport;
    use tokio::time::timeout;

    use super::*;

    fn fast_config(devices: usize) -> SimulatorConfig {
        let mut config = SimulatorConfig::default();
        config.fleet.device_count = devices;
        config.fleet.tick_interval = Duration::from_millis(20);
        config.fleet.start_stagger = Duration::from_millis(5);
        config
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn default_prefix_yields_three_distinct_identities() {
        let supervisor = FleetSupervisor::new(fast_config(3));
        assert_eq!(
            supervisor.device_ids(),
            vec!["machine_001", "machine_002", "machine_003"]
        );

        let transports: Mutex<HashMap<String, InMemoryTransport>> = Mutex::new(HashMap::new());
        let handle = supervisor
            .start(|device_id| {
                let transport = InMemoryTransport::new();
                transports
                    .lock()
                    .expect("registry poisoned")
                    .insert(device_id.to_owned(), transport.clone());
                transport
            })
            .await;
        assert_eq!(handle.device_count(), 3);

        tokio::time::sleep(Duration::from_millis(60)).await;
        handle.shutdown().await.expect("fleet stops cleanly");

        let transports = transports.into_inner().expect("registry poisoned");
        assert_eq!(transports.len(), 3);
        for (device_id, transport) in &transports {
            assert_eq!(transport.connect_count(), 1, "{} connected once", device_id);
            assert_eq!(transport.disconnect_count(), 1, "{} closed once", device_id);
            let published = transport.published();
            assert!(!published.is_empty(), "{} published telemetry", device_id);
            // Sessions are independent: each transport only ever sees its own device.
            for record in published {
                assert!(record.topic.ends_with(device_id));
            }
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn fatal_connect_failure_stops_the_entire_fleet() {
        let supervisor = FleetSupervisor::new(fast_config(2));
        let healthy = InMemoryTransport::new();
        let healthy_clone = healthy.clone();

        let handle = supervisor
            .start(move |device_id| {
                if device_id == "machine_002" {
                    let refused = InMemoryTransport::new();
                    refused.refuse_connections();
                    refused
                } else {
                    healthy_clone.clone()
                }
            })
            .await;

        let err = timeout(Duration::from_millis(500), handle.join())
            .await
            .expect("fleet terminates on its own")
            .expect_err("the refused connection is fatal");
        assert!(matches!(err, SessionError::Connect { .. }));
        assert_eq!(healthy.disconnect_count(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn interrupt_during_wait_still_joins_every_session() {
        let supervisor = FleetSupervisor::new(fast_config(2));
        let handle = supervisor.start(|_| InMemoryTransport::new()).await;
        let trigger = handle.stop_trigger();

        let waiter = tokio::spawn(handle.join());
        tokio::time::sleep(Duration::from_millis(30)).await;
        trigger.stop();

        timeout(Duration::from_millis(200), waiter)
            .await
            .expect("join completes after the stop request")
            .expect("join task")
            .expect("clean shutdown");
    }
}
