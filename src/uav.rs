use crate::util::Interval;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The UAV scanning the road.
///
/// Its position is the trailing edge of the sensor footprint, so the
/// footprint covers `[pos, pos + footprint]`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Uav {
    /// The position of the trailing edge of the footprint, in m.
    pos: f64,
    /// The ground speed in m/s.
    vel: f64,
    /// The length of road covered by the sensor, in m.
    footprint: f64,
}

impl Uav {
    /// Creates a UAV whose footprint ends at the start of the road.
    pub fn new(vel: f64, footprint: f64) -> Self {
        Self {
            pos: -footprint,
            vel,
            footprint,
        }
    }

    /// The position of the trailing edge of the footprint, in m.
    pub fn pos(&self) -> f64 {
        self.pos
    }

    /// The ground speed in m/s.
    pub fn vel(&self) -> f64 {
        self.vel
    }

    /// The footprint width in m.
    pub fn footprint_width(&self) -> f64 {
        self.footprint
    }

    /// The stretch of road covered by the sensor.
    pub fn footprint(&self) -> Interval<f64> {
        Interval::new(self.pos, self.pos + self.footprint)
    }

    /// The position of the sensor above the road, at the centre of the footprint.
    pub fn sensor_pos(&self) -> f64 {
        self.footprint().midpoint()
    }

    /// Advances the UAV by `dt` seconds.
    pub(crate) fn integrate(&mut self, dt: f64) {
        self.pos += self.vel * dt;
    }
}
