//! ---
//! sim_section: "01-core-functionality"
//! sim_subsection: "binary"
//! sim_type: "source"
//! sim_scope: "code"
//! sim_description: "Binary entrypoint for the fleetsim daemon."
//! sim_version: "v0.1.0"
//! sim_owner: "tbd"
//! ---
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use fleetsim_common::{init_tracing, SimulatorConfig};
use fleetsim_device::FleetSupervisor;
use fleetsim_transport::MqttTransport;
use tokio::signal;
use tracing::info;

#[derive(Debug, Parser)]
#[command(
    author,
    version,
    about = "Industrial IoT device fleet simulator",
    long_about = None
)]
struct Cli {
    #[arg(long, value_name = "HOST", help = "Override the broker host")]
    broker_host: Option<String>,

    #[arg(long, value_name = "PORT", help = "Override the broker port")]
    broker_port: Option<u16>,

    #[arg(long, value_name = "N", help = "Override the number of simulated devices")]
    devices: Option<usize>,

    #[arg(
        long,
        value_name = "SECONDS",
        help = "Override the telemetry tick interval"
    )]
    interval: Option<u64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing("fleetsimd");

    let mut config = SimulatorConfig::from_env().context("unable to resolve configuration")?;
    if let Some(host) = cli.broker_host {
        config.broker.host = host;
    }
    if let Some(port) = cli.broker_port {
        config.broker.port = port;
    }
    if let Some(devices) = cli.devices {
        config.fleet.device_count = devices;
    }
    if let Some(seconds) = cli.interval {
        config.fleet.tick_interval = Duration::from_secs(seconds);
    }
    config.validate().context("invalid configuration")?;

    info!(
        host = %config.broker.host,
        port = config.broker.port,
        devices = config.fleet.device_count,
        interval_secs = config.fleet.tick_interval.as_secs(),
        "starting device simulator fleet"
    );

    let broker = config.broker.clone();
    let supervisor = FleetSupervisor::new(config);
    let handle = supervisor
        .start(|device_id| MqttTransport::new(device_id, broker.clone()))
        .await;

    let trigger = handle.stop_trigger();
    tokio::spawn(async move {
        if signal::ctrl_c().await.is_ok() {
            info!("interrupt received; stopping all simulators");
            trigger.stop();
        }
    });

    handle
        .join()
        .await
        .context("fleet terminated with a fatal session error")?;
    info!("all simulators stopped");
    Ok(())
}
