//! ---
//! sim_section: "04-simulation"
//! sim_subsection: "module"
//! sim_type: "source"
//! sim_scope: "code"
//! sim_description: "Synthetic sensor reading generation."
//! sim_version: "v0.1.0"
//! sim_owner: "tbd"
//! ---
use std::ops::RangeInclusive;

use fleetsim_msg::{ErrorCode, MachineStatus, TelemetryData};
use rand::distributions::WeightedIndex;
use rand::prelude::*;

use crate::round2;

/// Physical range of the simulated temperature sensor, degrees Celsius.
pub const TEMPERATURE_CELSIUS: RangeInclusive<f64> = 20.0..=35.0;
/// Physical range of the simulated humidity sensor, percent.
pub const HUMIDITY_PERCENT: RangeInclusive<f64> = 40.0..=80.0;
/// Physical range of the simulated vibration sensor, hertz.
pub const VIBRATION_HZ: RangeInclusive<f64> = 10.0..=50.0;
/// Physical range of the simulated motor speed, revolutions per minute.
pub const MOTOR_RPM: RangeInclusive<u32> = 1000..=3000;
/// Physical range of the simulated motor current, amperes.
pub const CURRENT_AMPS: RangeInclusive<f64> = 5.0..=15.0;

const STATUSES: [MachineStatus; 4] = [
    MachineStatus::Running,
    MachineStatus::Idle,
    MachineStatus::Fault,
    MachineStatus::Maintenance,
];
const STATUS_WEIGHTS: [f64; 4] = [0.70, 0.15, 0.10, 0.05];

/// Produces one snapshot of sensor readings and a machine status per call.
///
/// The rig has no hidden state: every sample depends only on the fixed
/// distributions, never on prior output. It owns its RNG so sessions stay
/// fully independent of each other.
#[derive(Debug)]
pub struct SensorRig {
    rng: StdRng,
    status_weights: WeightedIndex<f64>,
}

impl SensorRig {
    /// Rig seeded from OS entropy, for production use.
    pub fn from_entropy() -> Self {
        Self::with_rng(StdRng::from_entropy())
    }

    /// Deterministically seeded rig, for tests.
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }

    fn with_rng(rng: StdRng) -> Self {
        Self {
            rng,
            status_weights: WeightedIndex::new(STATUS_WEIGHTS).expect("weights are positive"),
        }
    }

    /// Draw a status and a full set of readings for one tick.
    pub fn sample(&mut self) -> TelemetryData {
        let status = self.sample_status();
        self.readings_for(status)
    }

    /// Weighted categorical draw over the four machine statuses.
    pub fn sample_status(&mut self) -> MachineStatus {
        STATUSES[self.status_weights.sample(&mut self.rng)]
    }

    fn readings_for(&mut self, machine_status: MachineStatus) -> TelemetryData {
        let error_code = if machine_status == MachineStatus::Fault {
            Some(ErrorCode::ALL[self.rng.gen_range(0..ErrorCode::ALL.len())])
        } else {
            None
        };
        TelemetryData {
            temperature_celsius: round2(self.rng.gen_range(TEMPERATURE_CELSIUS)),
            humidity_percent: round2(self.rng.gen_range(HUMIDITY_PERCENT)),
            vibration_hz: round2(self.rng.gen_range(VIBRATION_HZ)),
            motor_rpm: self.rng.gen_range(MOTOR_RPM),
            current_amps: round2(self.rng.gen_range(CURRENT_AMPS)),
            machine_status,
            error_code,
        }
    }
}
