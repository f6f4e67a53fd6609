use self::following::{FollowingModel, ModelParams};
use crate::config::ShadowModel;
use crate::math::{project_to_ground, Point2d};
use crate::util::Interval;
use crate::VehicleId;

mod following;

/// A simulated vehicle.
#[derive(Clone, Debug)]
pub struct Vehicle {
    /// The vehicle's ID
    pub(crate) id: VehicleId,
    /// The vehicle's length in m.
    len: f64,
    /// The following model
    model: FollowingModel,
    /// The position of the rear of the vehicle along the road, in m.
    pos: f64,
    /// The velocity in m/s.
    vel: f64,
}

/// The attributes of a vehicle.
#[derive(Clone, Copy, Debug)]
pub struct VehicleAttributes {
    /// The vehicle length in m.
    pub length: f64,
    /// The speed the vehicle drives at on a clear road in m/s.
    pub desired_speed: f64,
    /// The desired gap between the vehicle and the one ahead in s.
    pub time_headway: f64,
}

impl Vehicle {
    /// Creates a new vehicle with its rear at `pos`.
    pub(crate) fn new(id: VehicleId, attributes: &VehicleAttributes, pos: f64) -> Self {
        Self {
            id,
            len: attributes.length,
            model: FollowingModel::new(&ModelParams {
                time_headway: attributes.time_headway,
                desired_speed: attributes.desired_speed,
            }),
            pos,
            vel: attributes.desired_speed,
        }
    }

    /// Gets the vehicle's ID.
    pub fn id(&self) -> VehicleId {
        self.id
    }

    /// The vehicle's length in m.
    pub fn length(&self) -> f64 {
        self.len
    }

    /// The position of the rear of the vehicle in m.
    pub fn pos_rear(&self) -> f64 {
        self.pos
    }

    /// The position of the front of the vehicle in m.
    pub fn pos_front(&self) -> f64 {
        self.pos + self.len
    }

    /// The stretch of road the vehicle stands on.
    pub fn extent(&self) -> Interval<f64> {
        Interval::new(self.pos_rear(), self.pos_front())
    }

    /// The vehicle's velocity in m/s.
    pub fn vel(&self) -> f64 {
        self.vel
    }

    /// The speed the vehicle drives at on a clear road in m/s.
    pub fn desired_vel(&self) -> f64 {
        self.model.desired_vel()
    }

    /// The stretch of road hidden by the vehicle from a sensor above `eye_pos`.
    pub fn shadow(&self, model: &ShadowModel, eye_pos: f64) -> Interval<f64> {
        let extent = self.extent();
        match *model {
            ShadowModel::Footprint => extent,
            ShadowModel::Projected {
                vehicle_height,
                uav_altitude,
            } => {
                let eye = Point2d::new(eye_pos, uav_altitude);
                let rear = project_to_ground(eye, Point2d::new(extent.min, vehicle_height));
                let front = project_to_ground(eye, Point2d::new(extent.max, vehicle_height));
                match (rear, front) {
                    (Some(rear), Some(front)) => extent.union(&Interval::new(rear, front)),
                    _ => extent,
                }
            }
        }
    }

    /// Chooses the vehicle's velocity for the next step.
    ///
    /// # Parameters
    /// * `leader_rear` - The position of the rear of the vehicle ahead, if there is one.
    pub(crate) fn follow(&mut self, leader_rear: Option<f64>) {
        self.vel = self.model.vel(leader_rear.map(|rear| rear - self.pos_front()));
    }

    /// Integrates the vehicle's position.
    ///
    /// # Parameters
    /// * `dt` - The time step in seconds
    pub(crate) fn integrate(&mut self, dt: f64) {
        self.pos += self.vel * dt;
    }

    /// Moves the vehicle back by one lap of a ring road of the given length,
    /// if it has passed the end. Returns `true` iff the vehicle wrapped.
    pub(crate) fn wrap(&mut self, length: f64) -> bool {
        if self.pos >= length {
            self.pos = self.pos.rem_euclid(length);
            true
        } else {
            false
        }
    }
}
