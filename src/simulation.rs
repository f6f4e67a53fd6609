use crate::config::SimulationConfig;
#[cfg(feature = "debug")]
use crate::debug::take_debug_frame;
use crate::debug::{debug_interval, debug_point};
use crate::error::{SimResult, SimulationError};
use crate::road::{RoadModel, Segment};
use crate::traffic::TrafficModel;
use crate::uav::Uav;
use crate::util::Interval;
use crate::visibility::{OcclusionSet, VisibilityAccumulator};
use crate::VehicleId;
use log::{debug, trace};
use rand::rngs::StdRng;
use rand::SeedableRng;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The state of a simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SimulationState {
    /// The UAV is still scanning the road.
    Running,
    /// The UAV has passed the end of the road or the step budget is spent.
    Complete,
}

/// The result of a single [Simulation::step].
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StepOutcome {
    /// The number of steps taken so far, including this one.
    pub step: usize,
    /// The fraction of segments observed after this step.
    pub completeness: f64,
    /// The number of segments first observed in this step.
    pub newly_observed: usize,
    /// The number of segments occluded in this step.
    pub occluded: usize,
    /// The state after this step.
    pub state: SimulationState,
}

/// A vehicle as seen by a renderer.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VehicleState {
    pub id: VehicleId,
    /// The stretch of road the vehicle stands on.
    pub extent: Interval<f64>,
    /// The velocity in m/s.
    pub vel: f64,
}

/// A read-only view of the simulation after a step.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Snapshot<'a> {
    pub step: usize,
    /// The simulated time in s.
    pub time: f64,
    pub uav_pos: f64,
    pub footprint: Interval<f64>,
    /// The vehicles, rearmost first.
    pub vehicles: Vec<VehicleState>,
    pub segments: &'a [Segment],
    /// The segments occluded in the latest step.
    pub occlusion: &'a OcclusionSet,
    pub completeness: f64,
    pub visible_rate: f64,
    pub state: SimulationState,
}

/// A simulation of a UAV scanning a road with traffic.
#[derive(Clone, Debug)]
pub struct Simulation {
    /// The configuration the simulation was built from.
    config: SimulationConfig,
    /// The road and its visibility flags.
    road: RoadModel,
    /// The vehicles on the road.
    traffic: TrafficModel,
    /// The UAV.
    uav: Uav,
    /// The visibility accumulated so far.
    visibility: VisibilityAccumulator,
    /// The segments occluded in the latest step.
    occlusion: OcclusionSet,
    /// The number of steps taken.
    steps: usize,
    /// The step budget.
    max_steps: usize,
    /// Whether the simulation is complete.
    state: SimulationState,
    /// Debugging information from the previously simulated frame.
    #[cfg(feature = "debug")]
    debug: serde_json::Value,
}

impl Simulation {
    /// Creates a new simulation from a configuration.
    pub fn new(config: SimulationConfig) -> SimResult<Self> {
        config.validate()?;

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let road = RoadModel::new(config.road_length, config.segment_width)?;
        let traffic = TrafficModel::new(&config.traffic, config.road_length, rng)?;
        let uav = Uav::new(config.uav_speed, config.footprint);
        let visibility = VisibilityAccumulator::new(&road);
        let occlusion = OcclusionSet::new(road.len());
        let max_steps = config.step_budget();

        debug!(
            "created simulation with {} segments, {} vehicles and a budget of {} steps",
            road.len(),
            traffic.len(),
            max_steps
        );

        Ok(Self {
            config,
            road,
            traffic,
            uav,
            visibility,
            occlusion,
            steps: 0,
            max_steps,
            state: SimulationState::Running,
            #[cfg(feature = "debug")]
            debug: serde_json::Value::Null,
        })
    }

    /// Discards all progress and starts again from the configuration.
    /// Without a configured seed the traffic is drawn afresh.
    pub fn reset(&mut self) -> SimResult<()> {
        *self = Self::new(self.config.clone())?;
        Ok(())
    }

    /// Advances the simulation by one time step: moves the traffic and the UAV,
    /// then records which segments inside the footprint are visible.
    pub fn step(&mut self) -> SimResult<StepOutcome> {
        if self.state == SimulationState::Complete {
            return Err(SimulationError::StepAfterComplete { step: self.steps });
        }

        let dt = self.config.dt;
        self.traffic.advance(dt);
        self.uav.integrate(dt);
        self.traffic
            .occlusion(&self.road, &self.uav, &mut self.occlusion);

        let footprint = self.uav.footprint();
        debug_interval("footprint", footprint);
        debug_point("sensor", self.uav.sensor_pos());

        let completeness = self
            .visibility
            .observe(&mut self.road, footprint, &self.occlusion);
        self.steps += 1;

        if self.uav.pos() >= self.road.length() || self.steps >= self.max_steps {
            self.state = SimulationState::Complete;
            debug!(
                "simulation complete after {} steps, completeness {:.3}",
                self.steps, completeness
            );
        }

        trace!(
            "step {}: uav at {:.2}, {} vehicles, {} segments occluded, completeness {:.3}",
            self.steps,
            self.uav.pos(),
            self.traffic.len(),
            self.occlusion.len(),
            completeness
        );

        #[cfg(feature = "debug")]
        {
            self.debug = take_debug_frame();
        }

        Ok(StepOutcome {
            step: self.steps,
            completeness,
            newly_observed: self.visibility.newly_observed(),
            occluded: self.occlusion.len(),
            state: self.state,
        })
    }

    /// Steps the simulation until it is complete, returning the final completeness.
    pub fn run(&mut self) -> SimResult<f64> {
        while self.state == SimulationState::Running {
            self.step()?;
        }
        Ok(self.completeness())
    }

    /// The configuration the simulation was built from.
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Whether the simulation is running or complete.
    pub fn state(&self) -> SimulationState {
        self.state
    }

    /// Whether the simulation is complete.
    pub fn is_complete(&self) -> bool {
        self.state == SimulationState::Complete
    }

    /// The number of steps taken.
    pub fn step_count(&self) -> usize {
        self.steps
    }

    /// The step budget.
    pub fn max_steps(&self) -> usize {
        self.max_steps
    }

    /// The simulated time in s.
    pub fn time(&self) -> f64 {
        self.steps as f64 * self.config.dt
    }

    /// The road and its visibility flags.
    pub fn road(&self) -> &RoadModel {
        &self.road
    }

    /// The vehicles on the road.
    pub fn traffic(&self) -> &TrafficModel {
        &self.traffic
    }

    /// The vehicles on the road, for adding or removing vehicles between steps.
    pub fn traffic_mut(&mut self) -> &mut TrafficModel {
        &mut self.traffic
    }

    /// The UAV.
    pub fn uav(&self) -> &Uav {
        &self.uav
    }

    /// The segments occluded in the latest step.
    pub fn occlusion(&self) -> &OcclusionSet {
        &self.occlusion
    }

    /// The fraction of segments observed.
    pub fn completeness(&self) -> f64 {
        self.visibility.completeness()
    }

    /// The fraction of visited segments which were observed.
    pub fn visible_rate(&self) -> f64 {
        self.visibility.visible_rate()
    }

    /// Takes a read-only snapshot for rendering.
    pub fn snapshot(&self) -> Snapshot<'_> {
        Snapshot {
            step: self.steps,
            time: self.time(),
            uav_pos: self.uav.pos(),
            footprint: self.uav.footprint(),
            vehicles: self
                .traffic
                .iter_vehicles()
                .map(|vehicle| VehicleState {
                    id: vehicle.id(),
                    extent: vehicle.extent(),
                    vel: vehicle.vel(),
                })
                .collect(),
            segments: self.road.segments(),
            occlusion: &self.occlusion,
            completeness: self.completeness(),
            visible_rate: self.visible_rate(),
            state: self.state,
        }
    }

    /// Gets the debugging information for the previously simulated frame as JSON array.
    #[cfg(feature = "debug")]
    pub fn debug(&mut self) -> serde_json::Value {
        self.debug.clone()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::TrafficConfig;
    use crate::visibility::SegmentStatus;
    use assert_approx_eq::assert_approx_eq;

    fn empty_road() -> SimulationConfig {
        SimulationConfig {
            road_length: 100.0,
            segment_width: 10.0,
            uav_speed: 10.0,
            footprint: 10.0,
            dt: 1.0,
            max_steps: None,
            seed: Some(1),
            traffic: TrafficConfig::empty(),
        }
    }

    #[test]
    fn rejects_invalid_config() {
        let config = SimulationConfig {
            footprint: 200.0,
            ..empty_road()
        };
        assert!(matches!(
            Simulation::new(config),
            Err(SimulationError::InvalidConfiguration { field: "footprint", .. })
        ));
    }

    #[test]
    fn first_step_sees_start_of_road() {
        let mut sim = Simulation::new(empty_road()).unwrap();
        assert_eq!(sim.snapshot().segments[0].status(), SegmentStatus::Unvisited);

        let outcome = sim.step().unwrap();
        assert_eq!(outcome.step, 1);
        assert_eq!(outcome.newly_observed, 2);
        assert_eq!(outcome.state, SimulationState::Running);
        assert_approx_eq!(outcome.completeness, 0.2);
        assert_approx_eq!(sim.time(), 1.0);
    }

    #[test]
    fn completes_at_end_of_road() {
        let mut sim = Simulation::new(empty_road()).unwrap();
        assert_eq!(sim.max_steps(), 11);
        let completeness = sim.run().unwrap();
        assert_approx_eq!(completeness, 1.0);
        assert_eq!(sim.step_count(), 11);
        assert!(sim.is_complete());
        assert_approx_eq!(sim.uav().pos(), 100.0);

        assert_eq!(
            sim.step(),
            Err(SimulationError::StepAfterComplete { step: 11 })
        );
    }

    #[test]
    fn completes_when_budget_is_spent() {
        let config = SimulationConfig {
            max_steps: Some(3),
            ..empty_road()
        };
        let mut sim = Simulation::new(config).unwrap();
        sim.step().unwrap();
        sim.step().unwrap();
        let outcome = sim.step().unwrap();
        assert_eq!(outcome.state, SimulationState::Complete);
        assert_approx_eq!(outcome.completeness, 0.4);
        assert!(sim.step().is_err());
    }

    #[test]
    fn reset_restarts_scan() {
        let mut sim = Simulation::new(empty_road()).unwrap();
        sim.run().unwrap();
        sim.reset().unwrap();
        assert_eq!(sim.state(), SimulationState::Running);
        assert_eq!(sim.step_count(), 0);
        assert_approx_eq!(sim.completeness(), 0.0);
        assert!(sim.road().segments().iter().all(|s| !s.is_visited()));
    }

    #[test]
    fn snapshot_reports_vehicles() {
        let mut sim = Simulation::new(empty_road()).unwrap();
        let attributes = sim.traffic().default_attributes();
        let id = sim.traffic_mut().add_vehicle(&attributes, 12.0);
        sim.step().unwrap();

        let snapshot = sim.snapshot();
        assert_eq!(snapshot.vehicles.len(), 1);
        assert_eq!(snapshot.vehicles[0].id, id);
        assert_approx_eq!(snapshot.vehicles[0].extent.min, 17.0);
        assert_eq!(snapshot.occlusion.iter().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(snapshot.footprint, Interval::new(0.0, 10.0));
        // Segment 1 was inside the footprint, but hidden
        assert_eq!(snapshot.segments[1].status(), SegmentStatus::Occluded);
        assert_approx_eq!(snapshot.visible_rate, 0.5);
    }
}
