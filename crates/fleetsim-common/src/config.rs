//! ---
//! sim_section: "01-core-functionality"
//! sim_subsection: "module"
//! sim_type: "source"
//! sim_scope: "code"
//! sim_description: "Shared primitives and utilities for the simulator runtime."
//! sim_version: "v0.1.0"
//! sim_owner: "tbd"
//! ---
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationMilliSeconds, DurationSeconds};
use tracing::debug;

fn default_broker_host() -> String {
    "localhost".to_owned()
}

fn default_broker_port() -> u16 {
    8883
}

fn default_username() -> Option<String> {
    Some("iot_user".to_owned())
}

fn default_password() -> Option<String> {
    Some("iot_password".to_owned())
}

fn default_keepalive() -> Duration {
    Duration::from_secs(60)
}

fn default_device_count() -> usize {
    3
}

fn default_device_prefix() -> String {
    "machine_".to_owned()
}

fn default_tick_interval() -> Duration {
    Duration::from_secs(3)
}

fn default_start_stagger() -> Duration {
    Duration::from_millis(500)
}

/// Primary configuration object for the fleet simulator.
///
/// The struct is built once at startup and passed by value into the fleet
/// supervisor and every device session; there is no ambient process-wide
/// configuration state.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SimulatorConfig {
    #[serde(default)]
    pub broker: BrokerConfig,
    #[serde(default)]
    pub fleet: FleetConfig,
}

/// Connection settings for the MQTT broker backing the fleet.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrokerConfig {
    #[serde(default = "default_broker_host")]
    pub host: String,
    #[serde(default = "default_broker_port")]
    pub port: u16,
    #[serde(default = "default_username")]
    pub username: Option<String>,
    #[serde(default = "default_password")]
    pub password: Option<String>,
    /// CA certificate enabling TLS towards the broker. TLS is skipped when unset.
    #[serde(default)]
    pub ca_certs: Option<PathBuf>,
    #[serde(default = "default_keepalive")]
    #[serde_as(as = "DurationSeconds<u64>")]
    pub keepalive: Duration,
}

impl Default for BrokerConfig {
    fn default() -> Self {
        Self {
            host: default_broker_host(),
            port: default_broker_port(),
            username: default_username(),
            password: default_password(),
            ca_certs: None,
            keepalive: default_keepalive(),
        }
    }
}

/// Shape and cadence of the simulated device fleet.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FleetConfig {
    #[serde(default = "default_device_count")]
    pub device_count: usize,
    #[serde(default = "default_device_prefix")]
    pub device_prefix: String,
    /// Period of each device's telemetry tick.
    #[serde(default = "default_tick_interval")]
    #[serde_as(as = "DurationSeconds<u64>")]
    pub tick_interval: Duration,
    /// Delay between consecutive session starts, avoiding a connection burst.
    #[serde(default = "default_start_stagger")]
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub start_stagger: Duration,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            device_count: default_device_count(),
            device_prefix: default_device_prefix(),
            tick_interval: default_tick_interval(),
            start_stagger: default_start_stagger(),
        }
    }
}

impl SimulatorConfig {
    /// Build a configuration from environment variables, falling back to
    /// defaults for anything unset. Recognised variables mirror the process
    /// configuration surface: `MQTT_BROKER_HOST`, `MQTT_BROKER_PORT`,
    /// `MQTT_USERNAME`, `MQTT_PASSWORD`, `CA_CERTS_PATH`, `NUM_DEVICES`,
    /// and `PUBLISH_INTERVAL_TELEMETRY` (seconds).
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Some(host) = env_var("MQTT_BROKER_HOST") {
            config.broker.host = host;
        }
        if let Some(port) = env_var("MQTT_BROKER_PORT") {
            config.broker.port = port
                .parse()
                .with_context(|| format!("invalid MQTT_BROKER_PORT '{}'", port))?;
        }
        if let Some(username) = env_var("MQTT_USERNAME") {
            config.broker.username = Some(username);
        }
        if let Some(password) = env_var("MQTT_PASSWORD") {
            config.broker.password = Some(password);
        }
        if let Some(path) = env_var("CA_CERTS_PATH") {
            config.broker.ca_certs = Some(PathBuf::from(path));
        }
        if let Some(count) = env_var("NUM_DEVICES") {
            config.fleet.device_count = count
                .parse()
                .with_context(|| format!("invalid NUM_DEVICES '{}'", count))?;
        }
        if let Some(interval) = env_var("PUBLISH_INTERVAL_TELEMETRY") {
            let seconds: u64 = interval
                .parse()
                .with_context(|| format!("invalid PUBLISH_INTERVAL_TELEMETRY '{}'", interval))?;
            config.fleet.tick_interval = Duration::from_secs(seconds);
        }

        config.validate()?;
        debug!(
            host = %config.broker.host,
            port = config.broker.port,
            devices = config.fleet.device_count,
            "configuration resolved from environment"
        );
        Ok(config)
    }

    /// Validate structural invariants.
    pub fn validate(&self) -> Result<()> {
        if self.fleet.device_count == 0 {
            return Err(anyhow!("fleet must contain at least one device"));
        }
        if self.fleet.device_prefix.trim().is_empty() {
            return Err(anyhow!("device prefix cannot be empty"));
        }
        if self.fleet.tick_interval.is_zero() {
            return Err(anyhow!("tick interval must be greater than zero"));
        }
        Ok(())
    }
}

impl std::str::FromStr for SimulatorConfig {
    type Err = anyhow::Error;

    fn from_str(content: &str) -> std::result::Result<Self, Self::Err> {
        let config: SimulatorConfig =
            toml::from_str(content).with_context(|| "failed to parse configuration")?;
        config.validate()?;
        Ok(config)
    }
}

fn env_var(name: &str) -> Option<String> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Some(value),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_runnable_without_configuration() {
        let config = SimulatorConfig::default();
        config.validate().expect("defaults validate");
        assert_eq!(config.broker.host, "localhost");
        assert_eq!(config.broker.port, 8883);
        assert_eq!(config.fleet.device_count, 3);
        assert_eq!(config.fleet.device_prefix, "machine_");
        assert_eq!(config.fleet.tick_interval, Duration::from_secs(3));
        assert_eq!(config.fleet.start_stagger, Duration::from_millis(500));
    }

    #[test]
    fn toml_overrides_merge_with_defaults() {
        let config: SimulatorConfig = r#"
            [broker]
            host = "broker.internal"
            port = 1883

            [fleet]
            device_count = 5
            tick_interval = 1
        "#
        .parse()
        .expect("config parses");
        assert_eq!(config.broker.host, "broker.internal");
        assert_eq!(config.broker.port, 1883);
        assert_eq!(config.fleet.device_count, 5);
        assert_eq!(config.fleet.tick_interval, Duration::from_secs(1));
        // Unspecified sections keep their defaults.
        assert_eq!(config.fleet.device_prefix, "machine_");
    }

    #[test]
    fn zero_devices_is_rejected() {
        let err = "[fleet]\ndevice_count = 0"
            .parse::<SimulatorConfig>()
            .expect_err("zero devices must fail validation");
        assert!(err.to_string().contains("at least one device"));
    }
}
