//! ---
//! sim_section: "01-core-functionality"
//! sim_subsection: "module"
//! sim_type: "source"
//! sim_scope: "code"
//! sim_description: "Shared primitives and utilities for the simulator runtime."
//! sim_version: "v0.1.0"
//! sim_owner: "tbd"
//! ---
use tracing::info;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const LOG_ENV: &str = "FLEETSIM_LOG";

/// Initialize the tracing subscriber for the simulator process.
///
/// `FLEETSIM_LOG` overrides the log filter (e.g. `info`, `debug,rumqttc=warn`).
/// When unset the standard `RUST_LOG` variable is honoured, finally defaulting
/// to `info`.
pub fn init_tracing(service_name: &str) {
    let filter = match std::env::var(LOG_ENV) {
        Ok(directive) => EnvFilter::try_new(directive).unwrap_or_else(|err| {
            eprintln!(
                "invalid {} directive ({}); defaulting to info logging",
                LOG_ENV, err
            );
            EnvFilter::new("info")
        }),
        Err(_) => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .ok();

    info!(service = %service_name, "tracing initialised");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init_tracing("fleetsim-test");
        init_tracing("fleetsim-test");
    }
}
