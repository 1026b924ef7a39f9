//! Incident summary composition.
//!
//! A summary is an ordered list of sections built from a fixed rule table.
//! Each rule pairs an eligibility check with a builder; rules are evaluated
//! in table order and each contributes at most one section. Missing
//! optional fields in the detection result skip or default, they never
//! fail the summary.

mod format;
mod sections;

use serde::Serialize;

use crate::detect::DetectionResult;

pub use format::{fixed, format_duration, format_time, percent, plural, seconds_label};
pub use sections::{
    COVERAGE_TYPE, DETECTED_PERSONNEL, DETECTION_QUALITY, DETECTION_SUMMARY, IMMEDIATE_ACTION,
    SYSTEM_NOTES, VIOLATION_TIMELINE,
};

const DEFAULT_CONFIDENCE_THRESHOLD: f64 = 0.5;
const DEFAULT_MIN_VISIBILITY_S: f64 = 4.0;
const DEFAULT_FRAGMENTATION_THRESHOLD: u64 = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Warning,
    Success,
    Info,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Critical => "critical",
            Severity::Warning => "warning",
            Severity::Success => "success",
            Severity::Info => "info",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SummarySection {
    pub icon: &'static str,
    pub title: &'static str,
    pub text: String,
    pub severity: Severity,
}

/// Detection service thresholds quoted in the System Notes section.
#[derive(Clone, Debug, PartialEq)]
pub struct ReportSettings {
    /// Minimum per-detection confidence, 0..=1.
    pub confidence_threshold: f64,
    /// Seconds a track must stay visible to be counted.
    pub min_visibility_s: f64,
    /// Totals above this may include tracking duplicates.
    pub fragmentation_threshold: u64,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            min_visibility_s: DEFAULT_MIN_VISIBILITY_S,
            fragmentation_threshold: DEFAULT_FRAGMENTATION_THRESHOLD,
        }
    }
}

/// Everything a section rule may look at.
pub(crate) struct ReportInput<'a> {
    pub violations: u64,
    pub compliant: u64,
    pub total: u64,
    pub result: &'a DetectionResult,
    pub is_video: bool,
    pub settings: &'a ReportSettings,
}

#[derive(Clone, Debug, Default)]
pub struct ReportComposer {
    settings: ReportSettings,
}

impl ReportComposer {
    pub fn new(settings: ReportSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ReportSettings {
        &self.settings
    }

    /// Build the ordered summary for one detection result.
    pub fn compose(
        &self,
        violations: u64,
        compliant: u64,
        total: u64,
        result: &DetectionResult,
        is_video: bool,
    ) -> Vec<SummarySection> {
        let input = ReportInput {
            violations,
            compliant,
            total,
            result,
            is_video,
            settings: &self.settings,
        };
        let summary: Vec<SummarySection> = sections::SECTION_RULES
            .iter()
            .filter(|rule| (rule.applies)(&input))
            .map(|rule| (rule.build)(&input))
            .collect();
        log::debug!(
            "composed {} summary sections ({})",
            summary.len(),
            summary
                .iter()
                .map(|section| section.title)
                .collect::<Vec<_>>()
                .join(", ")
        );
        summary
    }
}

/// `ReportComposer::default().compose(..)`.
pub fn compose(
    violations: u64,
    compliant: u64,
    total: u64,
    result: &DetectionResult,
    is_video: bool,
) -> Vec<SummarySection> {
    ReportComposer::default().compose(violations, compliant, total, result, is_video)
}
