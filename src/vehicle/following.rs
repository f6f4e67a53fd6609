/// The car following model of a vehicle.
///
/// A vehicle drives at its desired speed unless that would take it closer
/// than its time headway to the vehicle ahead, in which case it drives at
/// the speed which covers the gap in exactly the time headway.
#[derive(Clone, Debug)]
pub struct FollowingModel {
    headway: f64,
    desired_vel: f64,
}

/// The parameters of the following model.
pub struct ModelParams {
    /// The desired gap between this and the vehicle ahead in seconds.
    pub time_headway: f64,
    /// The speed the vehicle drives at on a clear road in m/s.
    pub desired_speed: f64,
}

impl FollowingModel {
    /// Creates a new following model.
    pub fn new(params: &ModelParams) -> Self {
        FollowingModel {
            headway: params.time_headway,
            desired_vel: params.desired_speed,
        }
    }

    /// The speed the vehicle drives at on a clear road in m/s.
    pub fn desired_vel(&self) -> f64 {
        self.desired_vel
    }

    /// Calculates the velocity of the vehicle.
    ///
    /// # Arguments
    /// * `net_dist` - The distance between the front of this vehicle and the
    ///   rear of the vehicle ahead in metres, or `None` if the road ahead is clear.
    pub fn vel(&self, net_dist: Option<f64>) -> f64 {
        match net_dist {
            None => self.desired_vel,
            Some(dist) => f64::min(self.desired_vel, f64::max(dist, 0.0) / self.headway),
        }
    }
}
