//! Tests that scan a whole road from start to finish.

use assert_approx_eq::assert_approx_eq;
use uav_scan_sim::{
    RoadBoundary, SegmentStatus, ShadowModel, Simulation, SimulationConfig, SimulationState,
    SpeedDistribution, TrafficConfig, VehicleAttributes,
};

/// 10 segments of 10 m, a 10 m footprint and a UAV moving 10 m per step.
fn short_road() -> SimulationConfig {
    SimulationConfig {
        road_length: 100.0,
        segment_width: 10.0,
        uav_speed: 10.0,
        footprint: 10.0,
        dt: 1.0,
        max_steps: None,
        seed: Some(0),
        traffic: TrafficConfig::empty(),
    }
}

fn vehicle(desired_speed: f64) -> VehicleAttributes {
    VehicleAttributes {
        length: 5.0,
        desired_speed,
        time_headway: 1.5,
    }
}

/// Test that an empty road is fully observed after the UAV has flown over it.
#[test]
fn empty_road_is_fully_observed() {
    let mut sim = Simulation::new(short_road()).unwrap();
    for step in 1..=10 {
        sim.step().unwrap();
        // Segment 5 first comes into view on step 5
        let seen = sim.road().segments()[5].is_observed();
        assert_eq!(seen, step >= 5);
    }
    assert!(sim.road().segments().iter().all(|s| s.is_observed()));
    assert_approx_eq!(sim.completeness(), 1.0);
    assert_eq!(sim.state(), SimulationState::Running);

    // Complete once the UAV has flown road length + footprint width
    let outcome = sim.step().unwrap();
    assert_eq!(outcome.state, SimulationState::Complete);
    assert_approx_eq!(sim.uav().pos(), 100.0);
}

/// Test that without traffic, completeness reaches 1 on exactly the step at
/// which the footprint first reaches the last segment.
#[test]
fn empty_road_completes_when_footprint_reaches_end() {
    let config = SimulationConfig {
        seed: Some(0),
        traffic: TrafficConfig::empty(),
        ..Default::default()
    };
    let mut sim = Simulation::new(config).unwrap();
    let last_start = sim.road().segments().last().unwrap().start();

    while !sim.is_complete() {
        let outcome = sim.step().unwrap();
        let reached_end = sim.uav().footprint().max >= last_start;
        assert_eq!(outcome.completeness == 1.0, reached_end);
    }
    assert_eq!(sim.step_count(), sim.max_steps());
    assert_approx_eq!(sim.uav().pos(), 100.0);
}

/// Test that a vehicle hiding a segment before the UAV arrives has no effect.
#[test]
fn earlier_occlusion_does_not_matter() {
    let mut sim = Simulation::new(short_road()).unwrap();
    // Covers [52, 57] during step 3 only
    sim.traffic_mut().add_vehicle(&vehicle(10.0), 22.0);

    for step in 1..=5 {
        sim.step().unwrap();
        assert_eq!(sim.occlusion().contains(5), step == 3);
    }
    assert!(sim.road().segments()[5].is_observed());
}

/// Test that a segment hidden on the first frame it is inside the footprint
/// is observed on a later frame.
#[test]
fn later_frame_compensates_for_occlusion() {
    let mut sim = Simulation::new(short_road()).unwrap();
    // Paces the UAV, always hiding the segment at the front of the footprint
    sim.traffic_mut().add_vehicle(&vehicle(10.0), 2.0);

    for step in 1..=9 {
        sim.step().unwrap();
        let segments = sim.road().segments();
        assert_eq!(segments[step].status(), SegmentStatus::Occluded);
        assert_eq!(segments[step - 1].status(), SegmentStatus::Observed);
        assert!(sim.completeness() < 1.0);
    }

    assert_approx_eq!(sim.run().unwrap(), 1.0);
    assert_approx_eq!(sim.visible_rate(), 1.0);
}

/// Test that the observed count never decreases and completeness stays in range.
#[test]
fn visibility_is_monotonic() {
    let config = SimulationConfig {
        seed: Some(11),
        ..Default::default()
    };
    let mut sim = Simulation::new(config).unwrap();

    let mut observed = 0;
    while !sim.is_complete() {
        let outcome = sim.step().unwrap();
        let now = sim.road().observed_count();
        assert!(now >= observed);
        assert_eq!(now - observed, outcome.newly_observed);
        assert!((0.0..=1.0).contains(&outcome.completeness));
        assert!((0.0..=1.0).contains(&sim.visible_rate()));
        observed = now;
    }
}

/// Test that moving traffic cannot hide any segment for the whole pass of a slow UAV.
#[test]
fn moving_traffic_is_compensated() {
    let config = SimulationConfig {
        uav_speed: 0.5,
        seed: Some(3),
        traffic: TrafficConfig {
            boundary: RoadBoundary::Ring,
            initial_vehicles: 4,
            speed: SpeedDistribution {
                mean: 5.0,
                stddev: 0.0,
            },
            ..Default::default()
        },
        ..Default::default()
    };
    let mut sim = Simulation::new(config).unwrap();
    assert_approx_eq!(sim.run().unwrap(), 1.0);
    assert_eq!(sim.traffic().len(), 4);
}

/// Test that the default, fully populated ring road keeps moving, so a slow
/// UAV still sees every segment.
#[test]
fn dense_ring_road_is_compensated() {
    for seed in 0..3 {
        let config = SimulationConfig {
            uav_speed: 0.25,
            seed: Some(seed),
            ..Default::default()
        };
        let mut sim = Simulation::new(config).unwrap();
        assert_eq!(sim.traffic().len(), 20);
        assert_approx_eq!(sim.run().unwrap(), 1.0);
        assert!(sim.traffic().iter_vehicles().any(|v| v.vel() > 0.5));
    }
}

/// Test that the same seed gives the same run.
#[test]
fn seeded_runs_are_deterministic() {
    let config = SimulationConfig {
        seed: Some(99),
        ..Default::default()
    };
    let mut a = Simulation::new(config.clone()).unwrap();
    let mut b = Simulation::new(config).unwrap();
    for _ in 0..50 {
        assert_eq!(a.step().unwrap(), b.step().unwrap());
    }
    let extents = |sim: &Simulation| {
        sim.snapshot()
            .vehicles
            .iter()
            .map(|v| v.extent)
            .collect::<Vec<_>>()
    };
    assert_eq!(extents(&a), extents(&b));
}

/// Test that tall vehicles seen from above hide more road than their own length.
#[test]
fn projected_shadows_are_longer() {
    let config = |shadow: ShadowModel| SimulationConfig {
        road_length: 100.0,
        segment_width: 1.0,
        uav_speed: 10.0,
        footprint: 20.0,
        dt: 1.0,
        seed: Some(0),
        traffic: TrafficConfig {
            shadow,
            ..TrafficConfig::empty()
        },
        ..Default::default()
    };

    let mut flat = Simulation::new(config(ShadowModel::Footprint)).unwrap();
    let mut tall = Simulation::new(config(ShadowModel::Projected {
        vehicle_height: 2.0,
        uav_altitude: 20.0,
    }))
    .unwrap();

    for sim in [&mut flat, &mut tall] {
        sim.traffic_mut().add_vehicle(&vehicle(5.0), 45.0);
        sim.step().unwrap();
    }

    // The vehicle stands on [50, 55], the sensor is above 0. Its rear is on
    // a boundary, so segment 49 is hidden too.
    let flat = flat.occlusion().iter().collect::<Vec<_>>();
    let tall = tall.occlusion().iter().collect::<Vec<_>>();
    assert_eq!(flat, (49..55).collect::<Vec<_>>());
    assert_eq!(tall, (49..62).collect::<Vec<_>>());
}
