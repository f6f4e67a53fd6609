use crate::util::Interval;
#[cfg(feature = "debug")]
use serde_json::json;

#[cfg(feature = "debug")]
thread_local!(
    static DEBUG_FRAME: std::cell::RefCell<Vec<serde_json::Value>> = Default::default();
);

/// Records a stretch of road in the current debug frame.
#[allow(unused)]
pub fn debug_interval(name: &str, interval: Interval<f64>) {
    #[cfg(feature = "debug")]
    DEBUG_FRAME.with(|frame| {
        frame.borrow_mut().push(json!({
            "type": "interval",
            "name": name,
            "min": interval.min,
            "max": interval.max,
        }))
    })
}

/// Records a position along the road in the current debug frame.
#[allow(unused)]
pub fn debug_point(name: &str, pos: f64) {
    #[cfg(feature = "debug")]
    DEBUG_FRAME.with(|frame| {
        frame.borrow_mut().push(json!({
            "type": "point",
            "name": name,
            "pos": pos,
        }))
    })
}

#[cfg(feature = "debug")]
pub fn take_debug_frame() -> serde_json::Value {
    json!(DEBUG_FRAME.with(|frame| frame.take()))
}
