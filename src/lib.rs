pub use cgmath;
pub use config::{
    ArrivalProcess, RoadBoundary, ShadowModel, SimulationConfig, SpeedDistribution, TrafficConfig,
};
pub use error::{SimResult, SimulationError};
pub use road::{RoadModel, Segment};
pub use simulation::{Simulation, SimulationState, Snapshot, StepOutcome, VehicleState};
use slotmap::{new_key_type, SlotMap};
pub use slotmap::{Key, KeyData};
pub use sweep::{sweep, SweepResult};
pub use traffic::TrafficModel;
pub use uav::Uav;
pub use util::Interval;
pub use vehicle::{Vehicle, VehicleAttributes};
pub use visibility::{OcclusionSet, SegmentStatus, VisibilityAccumulator};

mod config;
mod debug;
mod error;
pub mod math;
mod road;
mod simulation;
mod sweep;
mod traffic;
mod uav;
mod util;
mod vehicle;
mod visibility;

new_key_type! {
    /// Unique ID of a [Vehicle].
    pub struct VehicleId;
}

type VehicleSet = SlotMap<VehicleId, Vehicle>;
