//! Summary composition over realistic detection service payloads.

use anyhow::Result;
use serde_json::json;

use ppe_report::report::{
    COVERAGE_TYPE, DETECTED_PERSONNEL, DETECTION_QUALITY, DETECTION_SUMMARY, IMMEDIATE_ACTION,
    SYSTEM_NOTES, VIOLATION_TIMELINE,
};
use ppe_report::{compose, DetectionResult, Severity, SummarySection};

fn video_payload() -> serde_json::Value {
    json!({
        "annotated_video": "annotated_scaffold.mp4",
        "violations": 1,
        "compliant": 2,
        "total_detections": 3,
        "video_duration": 95.0,
        "fps": 30.0,
        "unique_people_tracked": 5,
        "filtered_tracks": 2,
        "frame_coverage": 100.0,
        "overall_confidence": 0.83,
        "violation_periods": [
            { "start": 12.4, "end": 31.9, "track_id": 4 }
        ],
        "personnel_details": [
            {
                "track_id": 2,
                "classification": "compliant",
                "duration": 80.2,
                "confidence": 0.88,
                "observations": 2406,
                "video_percentage": 84.4
            },
            {
                "track_id": 4,
                "classification": "violation",
                "duration": 19.5,
                "confidence": 0.74,
                "observations": 585,
                "video_percentage": 20.5
            },
            {
                "track_id": 6,
                "classification": "compliant",
                "duration": 41.0,
                "confidence": 0.87,
                "observations": 1230,
                "video_percentage": 43.2
            }
        ]
    })
}

fn parse(value: serde_json::Value) -> Result<DetectionResult> {
    ppe_report::detect::parse_detection_value(value)
}

fn titles(sections: &[SummarySection]) -> Vec<&'static str> {
    sections.iter().map(|section| section.title).collect()
}

fn find<'a>(sections: &'a [SummarySection], title: &str) -> &'a SummarySection {
    sections
        .iter()
        .find(|section| section.title == title)
        .unwrap_or_else(|| panic!("missing section {}", title))
}

#[test]
fn full_video_result_emits_every_section_in_order() -> Result<()> {
    let result = parse(video_payload())?;
    let sections = compose(1, 2, 3, &result, true);

    assert_eq!(
        titles(&sections),
        vec![
            IMMEDIATE_ACTION,
            VIOLATION_TIMELINE,
            DETECTED_PERSONNEL,
            DETECTION_SUMMARY,
            DETECTION_QUALITY,
            COVERAGE_TYPE,
            SYSTEM_NOTES
        ]
    );
    assert_eq!(
        sections.iter().map(|s| s.severity).collect::<Vec<_>>(),
        vec![
            Severity::Critical,
            Severity::Warning,
            Severity::Info,
            Severity::Warning,
            Severity::Info,
            Severity::Info,
            Severity::Info
        ]
    );
    Ok(())
}

#[test]
fn full_video_result_texts() -> Result<()> {
    let result = parse(video_payload())?;
    let sections = compose(1, 2, 3, &result, true);

    assert_eq!(
        find(&sections, IMMEDIATE_ACTION).text,
        "Worker without helmet observed for 19.5s (21% of monitoring period). \
         Detection confidence: 74%. Immediate intervention required."
    );
    assert_eq!(
        find(&sections, VIOLATION_TIMELINE).text,
        "Violation observed from 0:12 to 0:31. Duration: 19.5s."
    );
    assert_eq!(
        find(&sections, DETECTED_PERSONNEL).text.lines().next(),
        Some("Track 2 (🟢 Compliant) - 1m 20s visible")
    );
    assert_eq!(
        find(&sections, DETECTION_SUMMARY).text,
        "3 personnel detected. 1 violation, 2 compliant. Compliance rate: 66.7%."
    );
    assert_eq!(
        find(&sections, DETECTION_QUALITY).text,
        "Overall confidence: 83%. Tracking: 3 stable tracks, 2 fragments filtered. Frame coverage: 100.0%."
    );
    assert_eq!(
        find(&sections, COVERAGE_TYPE).text,
        "Continuous video monitoring with temporal tracking across frames."
    );
    assert_eq!(
        find(&sections, SYSTEM_NOTES).text,
        "Detection confidence threshold set at 50%. \
         Track IDs may change if personnel exit and re-enter frame. \
         Minimum 4-second visibility required for counting. \
         Model accuracy affected by viewing angle, occlusion, and movement."
    );
    Ok(())
}

#[test]
fn empty_image_result_has_fixed_summary() {
    let sections = compose(0, 0, 0, &DetectionResult::default(), false);

    assert_eq!(titles(&sections), vec![DETECTION_SUMMARY, COVERAGE_TYPE]);
    let summary = find(&sections, DETECTION_SUMMARY);
    assert_eq!(summary.text, "No personnel detected in monitored area.");
    assert_eq!(summary.severity, Severity::Info);
    assert_eq!(
        find(&sections, COVERAGE_TYPE).text,
        "Single frame capture. Snapshot analysis of site at moment of capture."
    );
}

#[test]
fn compliance_rate_has_one_decimal() {
    let sections = compose(1, 3, 4, &DetectionResult::default(), false);
    let summary = find(&sections, DETECTION_SUMMARY);
    assert!(summary.text.contains("75.0%"), "{}", summary.text);
    assert_eq!(summary.severity, Severity::Warning);
    assert_eq!(summary.icon, "⚠️");
}

#[test]
fn all_compliant_single_person_is_success() {
    let sections = compose(0, 1, 1, &DetectionResult::default(), false);
    let summary = find(&sections, DETECTION_SUMMARY);
    assert_eq!(
        summary.text,
        "1 person detected. 0 violations, 1 compliant. Compliance rate: 100.0%."
    );
    assert_eq!(summary.severity, Severity::Success);
}

#[test]
fn detection_summary_appears_exactly_once() -> Result<()> {
    let video = parse(video_payload())?;
    let cases = [
        (0, 0, 0, DetectionResult::default(), false),
        (0, 0, 0, DetectionResult::default(), true),
        (2, 0, 2, DetectionResult::default(), true),
        (1, 2, 3, video.clone(), true),
        (1, 2, 3, video, false),
    ];
    for (violations, compliant, total, result, is_video) in cases {
        let sections = compose(violations, compliant, total, &result, is_video);
        let count = sections
            .iter()
            .filter(|section| section.title == DETECTION_SUMMARY)
            .count();
        assert_eq!(count, 1);
    }
    Ok(())
}

#[test]
fn image_ignores_video_only_fields() -> Result<()> {
    let result = parse(video_payload())?;
    let sections = compose(1, 2, 3, &result, false);
    assert_eq!(
        titles(&sections),
        vec![DETECTION_SUMMARY, COVERAGE_TYPE, SYSTEM_NOTES]
    );
    Ok(())
}

#[test]
fn zero_overall_confidence_still_reports_quality() -> Result<()> {
    let result = parse(json!({ "overall_confidence": 0 }))?;
    let sections = compose(0, 0, 0, &result, true);
    assert_eq!(
        titles(&sections),
        vec![DETECTION_SUMMARY, DETECTION_QUALITY, COVERAGE_TYPE]
    );
    assert_eq!(
        find(&sections, DETECTION_QUALITY).text,
        "Overall confidence: 0%. Tracking: 0 stable tracks. Frame coverage: 0.0%."
    );
    Ok(())
}

#[test]
fn violations_without_violator_record_fall_back_to_counts() -> Result<()> {
    let mut payload = video_payload();
    payload["personnel_details"] = json!([
        { "track_id": 2, "classification": "compliant", "duration": 80.2,
          "confidence": 0.88, "observations": 2406, "video_percentage": 84.4 }
    ]);
    let result = parse(payload)?;
    let sections = compose(2, 1, 3, &result, true);
    assert_eq!(
        find(&sections, IMMEDIATE_ACTION).text,
        "2 safety violations detected. Immediate intervention required."
    );
    Ok(())
}

#[test]
fn fragmentation_note_only_above_five() {
    let notes = |total| {
        let sections = compose(0, total, total, &DetectionResult::default(), true);
        find(&sections, SYSTEM_NOTES).text.clone()
    };
    assert!(!notes(5).contains("tracking fragmentation"));
    assert!(notes(6).contains("Personnel count may include duplicates due to tracking fragmentation"));
}

#[test]
fn composing_twice_is_identical() -> Result<()> {
    let result = parse(video_payload())?;
    assert_eq!(compose(1, 2, 3, &result, true), compose(1, 2, 3, &result, true));
    Ok(())
}
