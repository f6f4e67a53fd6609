//! Multi-frame visibility accumulation.
//!
//! A segment only needs to be seen unoccluded in a single frame to count as
//! observed, so occlusion in one frame is compensated for by any later frame
//! in which the segment is still inside the footprint and clear.

use crate::road::RoadModel;
use crate::util::Interval;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The visibility status of a road segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SegmentStatus {
    /// The segment has never been inside the footprint.
    Unvisited,
    /// The segment has been inside the footprint, but was always occluded.
    Occluded,
    /// The segment has been seen unoccluded at least once.
    Observed,
}

/// A set of segment indices.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct OcclusionSet {
    /// One flag per segment.
    flags: Vec<bool>,
    /// The number of set flags.
    count: usize,
}

impl OcclusionSet {
    /// Creates an empty set for a road with `len` segments.
    pub fn new(len: usize) -> Self {
        Self {
            flags: vec![false; len],
            count: 0,
        }
    }

    /// Adds a segment to the set. Indices past the end of the road are ignored.
    pub fn insert(&mut self, index: usize) {
        if let Some(flag) = self.flags.get_mut(index) {
            if !*flag {
                *flag = true;
                self.count += 1;
            }
        }
    }

    /// Whether the segment is occluded.
    pub fn contains(&self, index: usize) -> bool {
        self.flags.get(index).copied().unwrap_or(false)
    }

    /// The number of occluded segments.
    pub fn len(&self) -> usize {
        self.count
    }

    /// Whether no segment is occluded.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// The occluded segment indices in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.flags
            .iter()
            .enumerate()
            .filter(|(_, flag)| **flag)
            .map(|(idx, _)| idx)
    }

    /// Empties the set.
    pub fn clear(&mut self) {
        self.flags.iter_mut().for_each(|flag| *flag = false);
        self.count = 0;
    }
}

/// Accumulates which segments have been observed across frames.
#[derive(Clone, Debug)]
pub struct VisibilityAccumulator {
    /// The number of segments on the road.
    total: usize,
    /// The number of segments seen unoccluded.
    observed: usize,
    /// The number of segments which have been inside the footprint.
    visited: usize,
    /// The number of segments first observed by the latest frame.
    newly_observed: usize,
}

impl VisibilityAccumulator {
    /// Creates an accumulator for the given road, counting any segments it has already observed.
    pub fn new(road: &RoadModel) -> Self {
        Self {
            total: road.len(),
            observed: road.observed_count(),
            visited: road.segments().iter().filter(|s| s.is_visited()).count(),
            newly_observed: 0,
        }
    }

    /// Records one frame: marks every segment inside `footprint` as visited,
    /// and every such segment which is not occluded as observed.
    /// Returns the updated completeness.
    pub fn observe(
        &mut self,
        road: &mut RoadModel,
        footprint: Interval<f64>,
        occlusion: &OcclusionSet,
    ) -> f64 {
        self.newly_observed = 0;
        for idx in road.covered_span(footprint) {
            let segment = road.segment_mut(idx);
            if occlusion.contains(idx) {
                if segment.mark_visited() {
                    self.visited += 1;
                }
            } else {
                let was_visited = segment.is_visited();
                if segment.mark_observed() {
                    self.observed += 1;
                    self.newly_observed += 1;
                    if !was_visited {
                        self.visited += 1;
                    }
                }
            }
        }
        self.completeness()
    }

    /// The fraction of segments observed, in `[0, 1]`.
    pub fn completeness(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.observed as f64 / self.total as f64
        }
    }

    /// The fraction of visited segments that were observed, or 0 if none were visited.
    pub fn visible_rate(&self) -> f64 {
        if self.visited == 0 {
            0.0
        } else {
            self.observed as f64 / self.visited as f64
        }
    }

    /// The number of segments observed.
    pub fn observed(&self) -> usize {
        self.observed
    }

    /// The number of segments visited.
    pub fn visited(&self) -> usize {
        self.visited
    }

    /// The number of segments first observed by the latest frame.
    pub fn newly_observed(&self) -> usize {
        self.newly_observed
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn road() -> RoadModel {
        RoadModel::new(100.0, 10.0).unwrap()
    }

    #[test]
    fn marks_unoccluded_segments() {
        let mut road = road();
        let mut acc = VisibilityAccumulator::new(&road);
        let mut occlusion = OcclusionSet::new(road.len());
        occlusion.insert(3);

        let completeness = acc.observe(&mut road, Interval::new(20.0, 35.0), &occlusion);
        assert_approx_eq!(completeness, 0.1);
        assert_eq!(acc.visited(), 2);
        assert_eq!(acc.newly_observed(), 1);
        assert_eq!(road.segments()[2].status(), SegmentStatus::Observed);
        assert_eq!(road.segments()[3].status(), SegmentStatus::Occluded);
        assert_eq!(road.segments()[4].status(), SegmentStatus::Unvisited);
        assert_approx_eq!(acc.visible_rate(), 0.5);
    }

    #[test]
    fn later_frame_compensates_for_occlusion() {
        let mut road = road();
        let mut acc = VisibilityAccumulator::new(&road);
        let mut occlusion = OcclusionSet::new(road.len());
        occlusion.insert(3);
        acc.observe(&mut road, Interval::new(30.0, 35.0), &occlusion);
        assert!(!road.segments()[3].is_observed());

        occlusion.clear();
        acc.observe(&mut road, Interval::new(35.0, 39.0), &occlusion);
        assert!(road.segments()[3].is_observed());
        assert_eq!(acc.visited(), 1);
        assert_approx_eq!(acc.visible_rate(), 1.0);
    }

    #[test]
    fn observation_is_idempotent() {
        let mut road = road();
        let mut acc = VisibilityAccumulator::new(&road);
        let clear = OcclusionSet::new(road.len());
        acc.observe(&mut road, Interval::new(0.0, 5.0), &clear);
        assert_eq!(acc.observed(), 1);

        // Observing again, even while occluded, leaves the flag set
        let mut occlusion = OcclusionSet::new(road.len());
        occlusion.insert(0);
        acc.observe(&mut road, Interval::new(0.0, 5.0), &occlusion);
        acc.observe(&mut road, Interval::new(0.0, 5.0), &clear);
        assert!(road.segments()[0].is_observed());
        assert_eq!(acc.observed(), 1);
        assert_eq!(acc.newly_observed(), 0);
    }

    #[test]
    fn occlusion_set() {
        let mut set = OcclusionSet::new(4);
        set.insert(1);
        set.insert(1);
        set.insert(3);
        set.insert(7);
        assert_eq!(set.len(), 2);
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![1, 3]);
        set.clear();
        assert!(set.is_empty());
    }
}
