use crate::error::{SimResult, SimulationError};
use crate::util::Interval;
use crate::visibility::SegmentStatus;
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Tolerance used when dividing the road into segments.
const EPSILON: f64 = 1e-9;

/// A fixed-length piece of road, the unit of visibility accounting.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Segment {
    /// The segment's index along the road.
    index: usize,
    /// The half-open extent `[start, end)` of the segment in m.
    extent: Interval<f64>,
    /// Whether the segment has been inside the UAV's footprint.
    visited: bool,
    /// Whether the segment has been seen unoccluded.
    observed: bool,
}

impl Segment {
    /// The segment's index along the road.
    pub fn index(&self) -> usize {
        self.index
    }

    /// The position at which the segment starts, in m.
    pub fn start(&self) -> f64 {
        self.extent.min
    }

    /// The position at which the next segment starts, in m.
    pub fn end(&self) -> f64 {
        self.extent.max
    }

    /// The extent of the segment.
    pub fn extent(&self) -> Interval<f64> {
        self.extent
    }

    /// Whether the segment has been seen unoccluded at least once.
    pub fn is_observed(&self) -> bool {
        self.observed
    }

    /// Whether the segment has been inside the UAV's footprint at least once.
    pub fn is_visited(&self) -> bool {
        self.visited
    }

    /// The visibility status of the segment.
    pub fn status(&self) -> SegmentStatus {
        match (self.visited, self.observed) {
            (_, true) => SegmentStatus::Observed,
            (true, false) => SegmentStatus::Occluded,
            (false, false) => SegmentStatus::Unvisited,
        }
    }

    /// Marks the segment as having been inside the footprint.
    /// Returns `true` iff it was not visited before.
    pub(crate) fn mark_visited(&mut self) -> bool {
        !std::mem::replace(&mut self.visited, true)
    }

    /// Marks the segment as observed. Returns `true` iff it was not observed before.
    pub(crate) fn mark_observed(&mut self) -> bool {
        self.visited = true;
        !std::mem::replace(&mut self.observed, true)
    }
}

/// The road, divided into an ordered sequence of segments.
#[derive(Clone, Debug)]
pub struct RoadModel {
    /// The road length in m.
    length: f64,
    /// The nominal segment width in m.
    segment_width: f64,
    /// The segments, ordered by position.
    segments: Vec<Segment>,
}

impl RoadModel {
    /// Divides a road of the given `length` into segments of `segment_width`.
    /// The last segment is shortened to end at the end of the road.
    pub fn new(length: f64, segment_width: f64) -> SimResult<Self> {
        for (field, value) in [("road_length", length), ("segment_width", segment_width)] {
            if !(value > 0.0 && value.is_finite()) {
                return Err(SimulationError::InvalidConfiguration {
                    field,
                    reason: "must be positive and finite",
                });
            }
        }

        let count = ((length / segment_width) - EPSILON).ceil().max(1.0) as usize;
        let segments = (0..count)
            .map(|index| Segment {
                index,
                extent: Interval::new(
                    index as f64 * segment_width,
                    f64::min((index + 1) as f64 * segment_width, length),
                ),
                visited: false,
                observed: false,
            })
            .collect();

        Ok(Self {
            length,
            segment_width,
            segments,
        })
    }

    /// The road length in m.
    pub fn length(&self) -> f64 {
        self.length
    }

    /// The nominal segment width in m.
    pub fn segment_width(&self) -> f64 {
        self.segment_width
    }

    /// The number of segments.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Always `false`; a road has at least one segment.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// The segments, ordered by position.
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Gets the segment with the given index.
    pub fn segment(&self, index: usize) -> Option<&Segment> {
        self.segments.get(index)
    }

    pub(crate) fn segment_mut(&mut self, index: usize) -> &mut Segment {
        &mut self.segments[index]
    }

    /// The extent of the whole road.
    pub fn extent(&self) -> Interval<f64> {
        Interval::new(0.0, self.length)
    }

    /// The index of the segment containing `pos`. The end of the road belongs
    /// to the last segment; positions off the road have no segment.
    pub fn segment_at(&self, pos: f64) -> Option<usize> {
        if !self.extent().contains(pos) {
            return None;
        }
        let idx = (pos / self.segment_width).floor() as usize;
        Some(usize::min(idx, self.segments.len() - 1))
    }

    /// The segments occluded by a vehicle's shadow.
    ///
    /// A point exactly on a segment boundary belongs to the lower-indexed
    /// segment, so a vehicle whose rear is on a boundary also occludes the
    /// segment behind it, while its front on a boundary does not reach into
    /// the segment ahead. A shadow which only touches the road at one of its
    /// ends occludes nothing.
    pub fn occluded_span(&self, shadow: Interval<f64>) -> Range<usize> {
        let Some(clipped) = shadow.clip(&self.extent()) else {
            return 0..0;
        };
        if clipped.length() == 0.0 && shadow.length() > 0.0 {
            return 0..0;
        }
        let shadow = clipped;
        let last = ((shadow.max / self.segment_width).ceil() as usize).saturating_sub(1);
        let last = usize::min(last, self.segments.len() - 1);
        let first = ((shadow.min / self.segment_width).ceil() as usize).saturating_sub(1);
        usize::min(first, last)..last + 1
    }

    /// The segments touched by the UAV's footprint. Segments are half-open, so
    /// the footprint touching a segment's start covers it but touching its end does not.
    pub fn covered_span(&self, footprint: Interval<f64>) -> Range<usize> {
        let Some(footprint) = footprint.clip(&self.extent()) else {
            return 0..0;
        };
        if footprint.min >= self.length {
            return 0..0;
        }
        let first = (footprint.min / self.segment_width).floor() as usize;
        let last = usize::min(
            (footprint.max / self.segment_width).floor() as usize,
            self.segments.len() - 1,
        );
        if first > last {
            return 0..0;
        }
        first..last + 1
    }

    /// The number of observed segments.
    pub fn observed_count(&self) -> usize {
        self.segments.iter().filter(|s| s.observed).count()
    }
}
