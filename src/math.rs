//! Line-of-sight geometry in the vertical plane along the road.
//!
//! Points are `(x, y)` where `x` is the position along the road and `y` the
//! height above the road surface, both in m.

use cgmath::{Point2, Vector2};

/// A 2D point
pub type Point2d = Point2<f64>;

/// A 2D vector
pub type Vector2d = Vector2<f64>;

/// Extends the line of sight from `eye` through `point` until it meets the
/// road surface, returning the position along the road where it does.
///
/// Returns `None` if the line of sight does not descend towards the road.
pub fn project_to_ground(eye: Point2d, point: Point2d) -> Option<f64> {
    let dir: Vector2d = point - eye;
    if dir.y >= 0.0 {
        return None;
    }
    let t = -eye.y / dir.y;
    Some((eye + t * dir).x)
}
