//! ---
//! sim_section: "06-testing-qa"
//! sim_subsection: "integration"
//! sim_type: "source"
//! sim_scope: "test"
//! sim_description: "End-to-end fleet scenarios over the in-memory transport."
//! sim_version: "v0.1.0"
//! sim_owner: "tbd"
//! ---
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use fleetsim_common::SimulatorConfig;
use fleetsim_device::FleetSupervisor;
use fleetsim_msg::{DeviceMessage, DevicePayload, MachineStatus};
use fleetsim_transport::{InMemoryTransport, QosLevel};
use tokio::time::timeout;

fn fast_config(devices: usize) -> SimulatorConfig {
    let mut config = SimulatorConfig::default();
    config.fleet.device_count = devices;
    config.fleet.tick_interval = Duration::from_millis(20);
    config.fleet.start_stagger = Duration::from_millis(5);
    config
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn three_device_fleet_publishes_well_formed_payloads() {
    let supervisor = FleetSupervisor::new(fast_config(3));
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

    tokio::time::sleep(Duration::from_millis(80)).await;
    handle.shutdown().await.expect("fleet stops cleanly");

    let transports = transports.into_inner().expect("registry poisoned");
    let mut ids: Vec<&String> = transports.keys().collect();
    ids.sort();
    assert_eq!(ids, ["machine_001", "machine_002", "machine_003"]);

    for (device_id, transport) in &transports {
        let published = transport.published();
        assert!(!published.is_empty(), "{} published at least one tick", device_id);

        // The first message of the first tick is always telemetry.
        let first: DeviceMessage =
            serde_json::from_slice(&published[0].payload).expect("telemetry decodes");
        assert!(matches!(first.payload, DevicePayload::Telemetry(_)));

        let mut saw_status_update = false;
        for record in &published {
            assert_eq!(record.qos, QosLevel::ExactlyOnce);
            assert!(record.retain);
            assert!(record.topic.ends_with(device_id.as_str()));

            let message: DeviceMessage =
                serde_json::from_slice(&record.payload).expect("payload decodes");
            assert_eq!(&message.device_id, device_id);
            assert_eq!(message.topic(), record.topic);
            match message.payload {
                DevicePayload::Telemetry(data) => {
                    assert_eq!(
                        data.error_code.is_some(),
                        data.machine_status == MachineStatus::Fault
                    );
                }
                DevicePayload::EventStatusUpdate(data) => {
                    if data.old_status.is_none() {
                        assert!(!saw_status_update, "unknown only on the first transition");
                    }
                    saw_status_update = true;
                }
                DevicePayload::EventProduction(_) | DevicePayload::EventAlert(_) => {}
            }
        }
        // The first tick always transitions out of the unknown status.
        assert!(saw_status_update, "{} reported its first status", device_id);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn interrupted_fleet_stops_within_one_tick_and_closes_once() {
    let supervisor = FleetSupervisor::new(fast_config(1));
    let transports: Mutex<Vec<InMemoryTransport>> = Mutex::new(Vec::new());

    let handle = supervisor
        .start(|_| {
            let transport = InMemoryTransport::new();
            transports
                .lock()
                .expect("registry poisoned")
                .push(transport.clone());
            transport
        })
        .await;

    // Interrupt immediately after startup.
    timeout(Duration::from_millis(100), handle.shutdown())
        .await
        .expect("shutdown completes within one tick interval")
        .expect("clean shutdown");

    let transports = transports.into_inner().expect("registry poisoned");
    assert_eq!(transports.len(), 1);
    assert_eq!(transports[0].connect_count(), 1);
    assert_eq!(transports[0].disconnect_count(), 1);
}
