//! Simulation configuration.

use crate::error::{SimResult, SimulationError};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The configuration of a [Simulation](crate::Simulation).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SimulationConfig {
    /// The length of the road in m.
    pub road_length: f64,
    /// The length of each road segment in m. The final segment is shortened
    /// if the road length is not a multiple of this.
    pub segment_width: f64,
    /// The UAV's ground speed in m/s.
    pub uav_speed: f64,
    /// The length of road covered by the UAV's sensor in m.
    pub footprint: f64,
    /// The time step in s.
    pub dt: f64,
    /// The maximum number of steps before the simulation completes.
    /// Defaults to the time the UAV needs to sweep the road plus its footprint.
    pub max_steps: Option<usize>,
    /// The seed of the random number generator; `None` seeds from entropy.
    pub seed: Option<u64>,
    /// The traffic on the road.
    pub traffic: TrafficConfig,
}

/// The configuration of the traffic on the road.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TrafficConfig {
    /// What happens to vehicles at the end of the road.
    pub boundary: RoadBoundary,
    /// How new vehicles arrive at the start of an open road.
    pub arrivals: ArrivalProcess,
    /// The number of vehicles placed on the road at the start.
    pub initial_vehicles: usize,
    /// The distribution of desired vehicle speeds.
    pub speed: SpeedDistribution,
    /// The vehicle length in m.
    pub vehicle_length: f64,
    /// The desired time gap to the vehicle ahead in s.
    pub time_headway: f64,
    /// How a vehicle hides the road from the UAV.
    pub shadow: ShadowModel,
}

/// The behaviour of vehicles reaching the end of the road.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum RoadBoundary {
    /// Vehicles leave the road at its end and new ones arrive at its start.
    Open,
    /// The road is a loop; vehicles leaving the end re-enter at the start.
    Ring,
}

/// The arrival process of vehicles at the start of an open road.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ArrivalProcess {
    /// No vehicles arrive.
    None,
    /// One vehicle arrives every `period` s.
    FixedInterval { period: f64 },
    /// Vehicles arrive at random with an average of `rate` vehicles per s.
    Poisson { rate: f64 },
}

/// A normal distribution of desired vehicle speeds in m/s.
/// Samples are folded onto the positive axis.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SpeedDistribution {
    pub mean: f64,
    pub stddev: f64,
}

/// The geometric rule deciding which part of the road a vehicle occludes.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ShadowModel {
    /// A vehicle occludes exactly the road it stands on.
    Footprint,
    /// A vehicle is a box of height `vehicle_height`, viewed from a sensor
    /// `uav_altitude` above the centre of the UAV's footprint. It occludes the
    /// road it stands on plus the ground hidden behind it along the line of sight.
    Projected {
        vehicle_height: f64,
        uav_altitude: f64,
    },
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            road_length: 100.0,
            segment_width: 1.0,
            uav_speed: 10.0,
            footprint: 20.0,
            dt: 0.1,
            max_steps: None,
            seed: None,
            traffic: TrafficConfig::default(),
        }
    }
}

impl Default for TrafficConfig {
    fn default() -> Self {
        Self {
            boundary: RoadBoundary::Ring,
            arrivals: ArrivalProcess::None,
            initial_vehicles: 20,
            speed: SpeedDistribution {
                mean: 5.0,
                stddev: 1.0,
            },
            vehicle_length: 5.0,
            time_headway: 1.5,
            shadow: ShadowModel::Footprint,
        }
    }
}

impl TrafficConfig {
    /// A road without any traffic.
    pub fn empty() -> Self {
        Self {
            boundary: RoadBoundary::Open,
            arrivals: ArrivalProcess::None,
            initial_vehicles: 0,
            ..Default::default()
        }
    }

    /// Checks the traffic configuration against the road it will drive on.
    pub fn validate(&self, road_length: f64) -> SimResult<()> {
        positive("road_length", road_length)?;
        positive("traffic.speed.mean", self.speed.mean)?;
        non_negative("traffic.speed.stddev", self.speed.stddev)?;
        positive("traffic.vehicle_length", self.vehicle_length)?;
        positive("traffic.time_headway", self.time_headway)?;

        match self.arrivals {
            ArrivalProcess::None => {}
            ArrivalProcess::FixedInterval { period } => {
                positive("traffic.arrivals.period", period)?;
            }
            ArrivalProcess::Poisson { rate } => {
                positive("traffic.arrivals.rate", rate)?;
            }
        }

        if let ShadowModel::Projected {
            vehicle_height,
            uav_altitude,
        } = self.shadow
        {
            non_negative("traffic.shadow.vehicle_height", vehicle_height)?;
            positive("traffic.shadow.uav_altitude", uav_altitude)?;
            if vehicle_height >= uav_altitude {
                return Err(SimulationError::InvalidConfiguration {
                    field: "traffic.shadow.vehicle_height",
                    reason: "must be lower than the UAV altitude",
                });
            }
        }

        if self.boundary == RoadBoundary::Ring
            && self.initial_vehicles as f64 * self.vehicle_length > road_length
        {
            return Err(SimulationError::InvalidConfiguration {
                field: "traffic.initial_vehicles",
                reason: "do not fit on the ring road",
            });
        }

        Ok(())
    }
}

impl SimulationConfig {
    /// Checks every field, returning the first violation found.
    pub fn validate(&self) -> SimResult<()> {
        positive("road_length", self.road_length)?;
        positive("segment_width", self.segment_width)?;
        positive("uav_speed", self.uav_speed)?;
        positive("footprint", self.footprint)?;
        positive("dt", self.dt)?;

        if self.footprint > self.road_length {
            return Err(SimulationError::InvalidConfiguration {
                field: "footprint",
                reason: "is wider than the road",
            });
        }
        if self.max_steps == Some(0) {
            return Err(SimulationError::InvalidConfiguration {
                field: "max_steps",
                reason: "must allow at least one step",
            });
        }

        self.traffic.validate(self.road_length)
    }

    /// The step budget of the simulation.
    pub fn step_budget(&self) -> usize {
        self.max_steps.unwrap_or_else(|| {
            let horizon = (self.road_length + self.footprint) / (self.uav_speed * self.dt);
            // Absorb rounding error, e.g. 110 / (10 * 0.1) = 110.00000000000001
            (horizon - 1e-9).ceil().max(1.0) as usize
        })
    }
}

fn positive(field: &'static str, value: f64) -> SimResult<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(SimulationError::InvalidConfiguration {
            field,
            reason: "must be positive and finite",
        })
    }
}

fn non_negative(field: &'static str, value: f64) -> SimResult<()> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(SimulationError::InvalidConfiguration {
            field,
            reason: "must be non-negative and finite",
        })
    }
}
