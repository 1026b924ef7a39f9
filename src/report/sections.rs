use crate::detect::{Classification, PersonRecord, TrackId};
use crate::report::format::{fixed, format_duration, format_time, percent, plural, seconds_label};
use crate::report::{ReportInput, Severity, SummarySection};

pub const IMMEDIATE_ACTION: &str = "Immediate Action";
pub const VIOLATION_TIMELINE: &str = "Violation Timeline";
pub const DETECTED_PERSONNEL: &str = "Detected Personnel";
pub const DETECTION_SUMMARY: &str = "Detection Summary";
pub const DETECTION_QUALITY: &str = "Detection Quality";
pub const COVERAGE_TYPE: &str = "Coverage Type";
pub const SYSTEM_NOTES: &str = "System Notes";

const ICON_ALERT: &str = "⚠️";
const ICON_CHART: &str = "📊";
const ICON_WORKER: &str = "👷";
const ICON_OK: &str = "✅";
const ICON_INFO: &str = "ℹ️";
const ICON_VIDEO: &str = "🎥";
const ICON_PHOTO: &str = "📸";

const INTERVENTION: &str = "Immediate intervention required.";
const NO_PERSONNEL: &str = "No personnel detected in monitored area.";

pub(crate) struct SectionRule {
    pub applies: fn(&ReportInput) -> bool,
    pub build: fn(&ReportInput) -> SummarySection,
}

/// Summary rules in emission order.
pub(crate) const SECTION_RULES: [SectionRule; 7] = [
    SectionRule {
        applies: video_with_violations,
        build: immediate_action,
    },
    SectionRule {
        applies: video_with_periods,
        build: violation_timeline,
    },
    SectionRule {
        applies: video_with_personnel,
        build: detected_personnel,
    },
    SectionRule {
        applies: always,
        build: detection_summary,
    },
    SectionRule {
        applies: video_with_confidence,
        build: detection_quality,
    },
    SectionRule {
        applies: always,
        build: coverage_type,
    },
    SectionRule {
        applies: anyone_detected,
        build: system_notes,
    },
];

fn always(_: &ReportInput) -> bool {
    true
}

fn video_with_violations(input: &ReportInput) -> bool {
    input.is_video && input.violations > 0
}

fn video_with_periods(input: &ReportInput) -> bool {
    input.is_video && !input.result.violation_periods().is_empty()
}

fn video_with_personnel(input: &ReportInput) -> bool {
    input.is_video && !input.result.personnel().is_empty()
}

// zero is a reported confidence, only absence skips the section
fn video_with_confidence(input: &ReportInput) -> bool {
    input.is_video && input.result.overall_confidence.is_some()
}

fn anyone_detected(input: &ReportInput) -> bool {
    input.total > 0
}

fn immediate_action(input: &ReportInput) -> SummarySection {
    let violators: Vec<&PersonRecord> = input.result.violators().collect();
    let text = match violators.first() {
        Some(primary) => {
            let mut text = format!(
                "Worker without helmet observed for {} ({}% of monitoring period). ",
                format_duration(primary.duration),
                fixed(primary.video_percentage, 0)
            );
            text.push_str(&format!(
                "Detection confidence: {}%. ",
                percent(primary.confidence)
            ));
            if violators.len() > 1 {
                text.push_str(&format!("{} total violations detected. ", violators.len()));
            }
            text.push_str(INTERVENTION);
            text
        }
        None => {
            if !input.result.personnel().is_empty() {
                log::warn!(
                    "{} violations reported but no personnel record is classified as a violation",
                    input.violations
                );
            }
            format!(
                "{} safety {} detected. {}",
                input.violations,
                plural(input.violations, "violation", "violations"),
                INTERVENTION
            )
        }
    };
    SummarySection {
        icon: ICON_ALERT,
        title: IMMEDIATE_ACTION,
        text,
        severity: Severity::Critical,
    }
}

fn violation_timeline(input: &ReportInput) -> SummarySection {
    let periods = input.result.violation_periods();
    let text = match periods {
        [period] => format!(
            "Violation observed from {} to {}. Duration: {}.",
            format_time(period.start),
            format_time(period.end),
            format_duration(period.length_s())
        ),
        _ => {
            let mut lines = vec!["Multiple violation windows detected:".to_string()];
            lines.extend(periods.iter().map(|period| {
                format!(
                    "• {} - {} ({})",
                    format_time(period.start),
                    format_time(period.end),
                    format_duration(period.length_s())
                )
            }));
            lines.join("\n")
        }
    };
    SummarySection {
        icon: ICON_CHART,
        title: VIOLATION_TIMELINE,
        text,
        severity: Severity::Warning,
    }
}

fn detected_personnel(input: &ReportInput) -> SummarySection {
    let text = input
        .result
        .personnel()
        .iter()
        .map(|person| {
            format!(
                "Track {} ({}) - {} visible\n  └─ {} observations, {}% confidence, {}% of video",
                track_label(person.track_id.as_ref()),
                status_label(person.classification),
                format_duration(person.duration),
                person.observations,
                percent(person.confidence),
                fixed(person.video_percentage, 0)
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    SummarySection {
        icon: ICON_WORKER,
        title: DETECTED_PERSONNEL,
        text,
        severity: Severity::Info,
    }
}

fn track_label(track_id: Option<&TrackId>) -> String {
    match track_id {
        Some(id) => id.to_string(),
        None => "?".to_string(),
    }
}

fn status_label(classification: Classification) -> &'static str {
    match classification {
        Classification::Violation => "🔴 Violation",
        Classification::Compliant => "🟢 Compliant",
        Classification::Unknown => "⚪ Unclassified",
    }
}

fn detection_summary(input: &ReportInput) -> SummarySection {
    if input.total == 0 {
        return SummarySection {
            icon: ICON_INFO,
            title: DETECTION_SUMMARY,
            text: NO_PERSONNEL.to_string(),
            severity: Severity::Info,
        };
    }
    let compliance_rate = input.compliant as f64 / input.total as f64 * 100.0;
    let text = format!(
        "{} {} detected. {} {}, {} compliant. Compliance rate: {}%.",
        input.total,
        plural(input.total, "person", "personnel"),
        input.violations,
        plural(input.violations, "violation", "violations"),
        input.compliant,
        fixed(compliance_rate, 1)
    );
    let (icon, severity) = if input.violations > 0 {
        (ICON_ALERT, Severity::Warning)
    } else {
        (ICON_OK, Severity::Success)
    };
    SummarySection {
        icon,
        title: DETECTION_SUMMARY,
        text,
        severity,
    }
}

fn detection_quality(input: &ReportInput) -> SummarySection {
    let result = input.result;
    let overall = result.overall_confidence.unwrap_or_default();
    let filtered = result.filtered_tracks.unwrap_or(0);
    let stable = result
        .unique_people_tracked
        .unwrap_or(0)
        .saturating_sub(filtered);

    let mut text = format!("Overall confidence: {}%. ", percent(overall));
    text.push_str(&format!(
        "Tracking: {} stable {}",
        stable,
        plural(stable, "track", "tracks")
    ));
    if filtered > 0 {
        text.push_str(&format!(
            ", {} {} filtered",
            filtered,
            plural(filtered, "fragment", "fragments")
        ));
    }
    text.push_str(&format!(
        ". Frame coverage: {}%.",
        fixed(result.frame_coverage.unwrap_or(0.0), 1)
    ));
    SummarySection {
        icon: ICON_INFO,
        title: DETECTION_QUALITY,
        text,
        severity: Severity::Info,
    }
}

fn coverage_type(input: &ReportInput) -> SummarySection {
    let (icon, text) = if input.is_video {
        (
            ICON_VIDEO,
            "Continuous video monitoring with temporal tracking across frames.",
        )
    } else {
        (
            ICON_PHOTO,
            "Single frame capture. Snapshot analysis of site at moment of capture.",
        )
    };
    SummarySection {
        icon,
        title: COVERAGE_TYPE,
        text: text.to_string(),
        severity: Severity::Info,
    }
}

fn system_notes(input: &ReportInput) -> SummarySection {
    let settings = input.settings;
    let mut notes = vec![format!(
        "Detection confidence threshold set at {}%",
        percent(settings.confidence_threshold)
    )];
    if input.is_video {
        notes.push("Track IDs may change if personnel exit and re-enter frame".to_string());
        if input.total > settings.fragmentation_threshold {
            notes.push(
                "Personnel count may include duplicates due to tracking fragmentation".to_string(),
            );
        }
        notes.push(format!(
            "Minimum {}-second visibility required for counting",
            seconds_label(settings.min_visibility_s)
        ));
    }
    notes.push("Model accuracy affected by viewing angle, occlusion, and movement".to_string());
    SummarySection {
        icon: ICON_INFO,
        title: SYSTEM_NOTES,
        text: format!("{}.", notes.join(". ")),
        severity: Severity::Info,
    }
}
