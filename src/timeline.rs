//! Violation timeline segmentation.
//!
//! Violation periods are projected onto a fixed number of buckets spanning
//! the media duration and then run-length encoded. The resulting segments
//! are proportional widths that always sum to one, so a renderer only has
//! to lay them out left to right.
//!
//! Malformed periods never fail the segmentation:
//! - inverted or non-finite periods are skipped
//! - indices are clamped to the bucket range
//! - overlapping periods mark the same buckets once

use serde::Serialize;

use crate::detect::ViolationPeriod;

/// Number of discrete buckets the duration is split into.
pub const TIMELINE_RESOLUTION: usize = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SegmentKind {
    Compliant,
    Violation,
}

/// One run of equal buckets.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Segment {
    pub kind: SegmentKind,
    /// Share of the whole timeline, in (0, 1].
    pub width_fraction: f64,
    /// Number of buckets covered by this run.
    pub buckets: usize,
}

/// Run-length-minimal sequence of segments; adjacent kinds always differ.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Timeline {
    segments: Vec<Segment>,
}

impl Timeline {
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// True when the duration was unusable and nothing should be drawn.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Fraction of the timeline marked as violation.
    pub fn violation_fraction(&self) -> f64 {
        let buckets: usize = self
            .segments
            .iter()
            .filter(|segment| segment.kind == SegmentKind::Violation)
            .map(|segment| segment.buckets)
            .sum();
        buckets as f64 / TIMELINE_RESOLUTION as f64
    }
}

/// Segment `duration_s` of media into compliant and violation runs.
///
/// Returns an empty timeline when the duration is not a positive finite
/// number; callers suppress the timeline in that case.
pub fn segment(duration_s: f64, violation_periods: &[ViolationPeriod]) -> Timeline {
    if !duration_s.is_finite() || duration_s <= 0.0 {
        return Timeline::default();
    }

    let mut buckets = [SegmentKind::Compliant; TIMELINE_RESOLUTION];
    for period in violation_periods {
        if !is_well_formed(period) {
            log::warn!(
                "ignoring malformed violation period {}..{}",
                period.start,
                period.end
            );
            continue;
        }
        let Some(range) = bucket_range(duration_s, period) else {
            log::debug!(
                "violation period {:.2}..{:.2} falls outside the {:.2}s timeline",
                period.start,
                period.end,
                duration_s
            );
            continue;
        };
        for bucket in &mut buckets[range] {
            *bucket = SegmentKind::Violation;
        }
    }

    Timeline {
        segments: run_length_encode(&buckets),
    }
}

fn is_well_formed(period: &ViolationPeriod) -> bool {
    period.start.is_finite() && period.end.is_finite() && period.end >= period.start
}

/// Bucket index range covered by a well-formed period, or `None` when it
/// marks nothing.
fn bucket_range(duration_s: f64, period: &ViolationPeriod) -> Option<std::ops::Range<usize>> {
    let resolution = TIMELINE_RESOLUTION as f64;
    let start = clamp_index((period.start / duration_s * resolution).floor());
    let end = clamp_index((period.end / duration_s * resolution).ceil());
    if start >= end {
        return None;
    }
    Some(start..end)
}

fn clamp_index(position: f64) -> usize {
    position.clamp(0.0, TIMELINE_RESOLUTION as f64) as usize
}

fn run_length_encode(buckets: &[SegmentKind]) -> Vec<Segment> {
    let mut segments: Vec<Segment> = Vec::new();
    for &kind in buckets {
        match segments.last_mut() {
            Some(run) if run.kind == kind => run.buckets += 1,
            _ => segments.push(Segment {
                kind,
                width_fraction: 0.0,
                buckets: 1,
            }),
        }
    }
    for run in &mut segments {
        run.width_fraction = run.buckets as f64 / buckets.len() as f64;
    }
    segments
}
