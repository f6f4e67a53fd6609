//! Parameter sweeps over UAV speed and traffic density.

use crate::config::SimulationConfig;
use crate::error::SimResult;
use crate::simulation::Simulation;
use itertools::iproduct;
use log::debug;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The outcome of one simulation in a sweep.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SweepResult {
    /// The UAV speed in m/s.
    pub uav_speed: f64,
    /// The number of vehicles initially on the road.
    pub vehicles: usize,
    /// The fraction of segments observed when the simulation completed.
    pub completeness: f64,
    /// The fraction of visited segments which were observed.
    pub visible_rate: f64,
    /// The number of steps taken.
    pub steps: usize,
}

/// Runs one simulation to completion for every combination of UAV speed and
/// initial vehicle count, with all other parameters taken from `base`.
///
/// Results are ordered by speed, then by vehicle count. If `base` has a seed,
/// every run uses it, so runs differ only in the swept parameters.
pub fn sweep(
    base: &SimulationConfig,
    uav_speeds: &[f64],
    vehicle_counts: &[usize],
) -> SimResult<Vec<SweepResult>> {
    iproduct!(uav_speeds, vehicle_counts)
        .map(|(&uav_speed, &vehicles)| {
            let mut config = base.clone();
            config.uav_speed = uav_speed;
            config.traffic.initial_vehicles = vehicles;

            let mut sim = Simulation::new(config)?;
            let completeness = sim.run()?;
            debug!(
                "sweep: speed {:.1} m/s, {} vehicles -> completeness {:.3}",
                uav_speed, vehicles, completeness
            );
            Ok(SweepResult {
                uav_speed,
                vehicles,
                completeness,
                visible_rate: sim.visible_rate(),
                steps: sim.step_count(),
            })
        })
        .collect()
}
