//! Terminal and JSON rendering of an analysis.

use anyhow::Result;

use crate::analysis::Analysis;
use crate::timeline::{SegmentKind, Timeline};

const VIOLATION_CELL: char = '█';
const COMPLIANT_CELL: char = '░';

/// Draw the timeline as exactly `columns` cells.
///
/// Each segment gets its rounded share of cells; the last segment absorbs
/// the rounding remainder so the bar never changes width. A non-empty
/// segment always keeps at least one cell while cells remain.
pub fn timeline_bar(timeline: &Timeline, columns: usize) -> String {
    let segments = timeline.segments();
    let mut bar = String::with_capacity(columns * 3);
    let mut used = 0usize;
    for (index, segment) in segments.iter().enumerate() {
        let remaining = columns - used;
        let cells = if index + 1 == segments.len() {
            remaining
        } else {
            let share = (segment.width_fraction * columns as f64).round() as usize;
            share.max(1).min(remaining)
        };
        let cell = match segment.kind {
            SegmentKind::Violation => VIOLATION_CELL,
            SegmentKind::Compliant => COMPLIANT_CELL,
        };
        bar.extend(std::iter::repeat(cell).take(cells));
        used += cells;
    }
    bar
}

/// Plain-text report in section order.
pub fn render_text(analysis: &Analysis, timeline_columns: usize, base_url: Option<&str>) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "Violations: {}  Compliant: {}  Total: {}\n",
        analysis.violations, analysis.compliant, analysis.total
    ));
    if analysis.alert.badge {
        out.push_str("!! SAFETY VIOLATION DETECTED !!\n");
    }
    if let (Some(media), Some(base_url)) = (&analysis.annotated, base_url) {
        out.push_str(&format!("Annotated media: {}\n", media.url(base_url)));
    }
    if let Some(timeline) = &analysis.timeline {
        out.push_str(&format!(
            "Timeline [{}] {}% violation\n",
            timeline_bar(timeline, timeline_columns),
            crate::report::percent(timeline.violation_fraction())
        ));
    }

    for section in &analysis.sections {
        out.push('\n');
        out.push_str(&format!(
            "[{}] {} {}\n",
            section.severity.as_str().to_uppercase(),
            section.icon,
            section.title
        ));
        for line in section.text.lines() {
            out.push_str("  ");
            out.push_str(line);
            out.push('\n');
        }
    }
    out
}

pub fn render_json(analysis: &Analysis) -> Result<String> {
    Ok(serde_json::to_string_pretty(analysis)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::MediaKind;
    use crate::detect::{DetectionResult, ViolationPeriod};
    use crate::report::ReportComposer;
    use crate::timeline::segment;

    #[test]
    fn bar_keeps_its_width() {
        let timeline = segment(100.0, &[ViolationPeriod::new(10.0, 20.0)]);
        let bar = timeline_bar(&timeline, 50);
        assert_eq!(bar.chars().count(), 50);
        assert_eq!(
            bar,
            format!("{}{}{}", "░".repeat(5), "█".repeat(5), "░".repeat(40))
        );

        let sliver = segment(100.0, &[ViolationPeriod::new(50.0, 50.5)]);
        let bar = timeline_bar(&sliver, 10);
        assert_eq!(bar.chars().count(), 10);
        assert_eq!(bar.chars().filter(|c| *c == '█').count(), 1);
    }

    #[test]
    fn text_lists_sections_with_severity() {
        let result = DetectionResult {
            violations: 1,
            compliant: 0,
            total_detections: 1,
            video_duration_s: Some(10.0),
            violation_periods: Some(vec![ViolationPeriod::new(0.0, 10.0)]),
            annotated_video: Some("annotated_clip.mp4".to_string()),
            ..DetectionResult::default()
        };
        let analysis = Analysis::from_result(&result, MediaKind::Video, &ReportComposer::default());
        let text = render_text(&analysis, 20, Some("http://127.0.0.1:8000"));

        assert!(text.starts_with("Violations: 1  Compliant: 0  Total: 1\n"));
        assert!(text.contains("!! SAFETY VIOLATION DETECTED !!"));
        assert!(text.contains("Annotated media: http://127.0.0.1:8000/annotated/videos/annotated_clip.mp4"));
        assert!(text.contains(&format!("Timeline [{}] 100% violation", "█".repeat(20))));
        assert!(text.contains("[CRITICAL] ⚠️ Immediate Action\n  1 safety violation detected."));
        assert!(text.contains("[INFO] 🎥 Coverage Type\n"));
    }

    #[test]
    fn json_uses_lowercase_tags() -> Result<()> {
        let analysis = Analysis::from_result(
            &DetectionResult::default(),
            MediaKind::Image,
            &ReportComposer::default(),
        );
        let value: serde_json::Value = serde_json::from_str(&render_json(&analysis)?)?;
        assert_eq!(value["kind"], "image");
        assert_eq!(value["sections"][0]["title"], "Detection Summary");
        assert_eq!(value["sections"][0]["severity"], "info");
        assert!(value.get("timeline").is_none());
        Ok(())
    }
}
