use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Structured result returned by the detection service for one media file.
///
/// Every field is optional on the wire. Counts default to zero, `null` is
/// treated the same as an absent key, and unknown keys are ignored.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct DetectionResult {
    #[serde(default, deserialize_with = "null_as_default")]
    pub violations: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub compliant: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total_detections: u64,
    /// Media length in seconds (video only).
    #[serde(default, rename = "video_duration", skip_serializing_if = "Option::is_none")]
    pub video_duration_s: Option<f64>,
    /// Violation intervals as reported; may be unsorted, overlapping or out of range.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub violation_periods: Option<Vec<ViolationPeriod>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub personnel_details: Option<Vec<PersonRecord>>,
    /// Mean confidence over counted tracks, 0..=1. Zero is a real value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overall_confidence: Option<f64>,
    /// Percentage of frames the detector ran on, 0..=100.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frame_coverage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unique_people_tracked: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filtered_tracks: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frames_processed: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fps: Option<f64>,
    /// File name of the annotated still, served under `/annotated/images/`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotated_image: Option<String>,
    /// File name of the annotated clip, served under `/annotated/videos/`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub annotated_video: Option<String>,
}

impl DetectionResult {
    pub fn violation_periods(&self) -> &[ViolationPeriod] {
        self.violation_periods.as_deref().unwrap_or_default()
    }

    pub fn personnel(&self) -> &[PersonRecord] {
        self.personnel_details.as_deref().unwrap_or_default()
    }

    /// Person records classified as violations, in reported order.
    pub fn violators(&self) -> impl Iterator<Item = &PersonRecord> {
        self.personnel()
            .iter()
            .filter(|person| person.classification.is_violation())
    }
}

/// A closed interval, in seconds from media start, during which a tracked
/// worker was classified as non-compliant.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct ViolationPeriod {
    #[serde(default, deserialize_with = "null_as_default")]
    pub start: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub end: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_id: Option<TrackId>,
}

impl ViolationPeriod {
    pub fn new(start: f64, end: f64) -> Self {
        Self {
            start,
            end,
            track_id: None,
        }
    }

    pub fn length_s(&self) -> f64 {
        self.end - self.start
    }
}

/// Per-track classification summary produced by the tracker.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct PersonRecord {
    /// Absent when the tracker lost the identity; the record is still reported.
    #[serde(
        default,
        deserialize_with = "null_as_default",
        skip_serializing_if = "Option::is_none"
    )]
    pub track_id: Option<TrackId>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub classification: Classification,
    /// Seconds between first and last appearance.
    #[serde(default, deserialize_with = "null_as_default")]
    pub duration: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_appearance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_appearance: Option<f64>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub confidence: f64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub observations: u64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub video_percentage: f64,
}

#[derive(Clone, Copy, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    Violation,
    Compliant,
    #[default]
    #[serde(other)]
    Unknown,
}

impl Classification {
    pub fn is_violation(self) -> bool {
        self == Classification::Violation
    }
}

/// Tracker identity. The service emits integers but string ids are accepted.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum TrackId {
    Number(i64),
    Text(String),
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrackId::Number(id) => write!(f, "{}", id),
            TrackId::Text(id) => f.write_str(id),
        }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
