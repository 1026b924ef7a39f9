//! Caller-owned analysis state.
//!
//! One `AnalysisSession` holds the media the user selected and the latest
//! derived `Analysis`. Both core components are pure; this module only
//! threads their inputs and outputs.

use anyhow::{anyhow, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::detect::DetectionResult;
use crate::report::{ReportComposer, SummarySection};
use crate::timeline::{self, Timeline};

const IMAGE_EXTENSIONS: [&str; 8] = ["jpg", "jpeg", "png", "bmp", "gif", "webp", "tif", "tiff"];
const VIDEO_EXTENSIONS: [&str; 9] = [
    "mp4", "mov", "avi", "mkv", "webm", "m4v", "mpg", "mpeg", "wmv",
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Classify a media file by extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_default();
        if IMAGE_EXTENSIONS.contains(&extension.as_str()) {
            Ok(MediaKind::Image)
        } else if VIDEO_EXTENSIONS.contains(&extension.as_str()) {
            Ok(MediaKind::Video)
        } else {
            Err(anyhow!(
                "Please upload an image or video file ({} is neither)",
                path.display()
            ))
        }
    }

    pub fn is_video(self) -> bool {
        self == MediaKind::Video
    }

    /// Service endpoint path for this kind.
    pub fn endpoint(self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }

    fn annotated_dir(self) -> &'static str {
        match self {
            MediaKind::Image => "annotated/images",
            MediaKind::Video => "annotated/videos",
        }
    }
}

/// A media file chosen for analysis.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MediaSubmission {
    pub path: PathBuf,
    pub kind: MediaKind,
}

impl MediaSubmission {
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let kind = MediaKind::from_path(&path)?;
        Ok(Self { path, kind })
    }

    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string())
    }
}

/// Visual alert state for the results view.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct AlertState {
    /// Pulsing violation badge on the annotated media.
    pub badge: bool,
    /// Highlight on the violation counter.
    pub violation_highlight: bool,
}

/// Annotated output produced by the service, addressed relative to its base URL.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AnnotatedMedia {
    pub kind: MediaKind,
    pub file_name: String,
}

impl AnnotatedMedia {
    pub fn url(&self, base_url: &str) -> String {
        format!(
            "{}/{}/{}",
            base_url.trim_end_matches('/'),
            self.kind.annotated_dir(),
            self.file_name
        )
    }
}

/// Everything the results view renders for one detection result.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Analysis {
    pub kind: MediaKind,
    pub violations: u64,
    pub compliant: u64,
    pub total: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeline: Option<Timeline>,
    pub sections: Vec<SummarySection>,
    pub alert: AlertState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annotated: Option<AnnotatedMedia>,
}

impl Analysis {
    pub fn from_result(
        result: &DetectionResult,
        kind: MediaKind,
        composer: &ReportComposer,
    ) -> Self {
        let violations = result.violations;
        let compliant = result.compliant;
        let total = result.total_detections;
        let is_video = kind.is_video();

        let timeline = match (is_video, result.video_duration_s, &result.violation_periods) {
            (true, Some(duration_s), Some(periods)) => {
                Some(timeline::segment(duration_s, periods)).filter(|t| !t.is_empty())
            }
            _ => None,
        };
        let sections = composer.compose(violations, compliant, total, result, is_video);
        let alert = AlertState {
            badge: is_video && violations > 0,
            violation_highlight: violations > 0,
        };
        let annotated = result
            .annotated_image
            .as_ref()
            .map(|name| AnnotatedMedia {
                kind: MediaKind::Image,
                file_name: name.clone(),
            })
            .or_else(|| {
                result.annotated_video.as_ref().map(|name| AnnotatedMedia {
                    kind: MediaKind::Video,
                    file_name: name.clone(),
                })
            });

        Self {
            kind,
            violations,
            compliant,
            total,
            timeline,
            sections,
            alert,
            annotated,
        }
    }

    pub fn section(&self, title: &str) -> Option<&SummarySection> {
        self.sections.iter().find(|section| section.title == title)
    }
}

/// Application state for one user: the selected media and the last result.
#[derive(Debug, Default)]
pub struct AnalysisSession {
    current: Option<MediaSubmission>,
    latest: Option<Analysis>,
}

impl AnalysisSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a new media file, discarding any previous analysis.
    pub fn select(&mut self, path: impl Into<PathBuf>) -> Result<&MediaSubmission> {
        let submission = MediaSubmission::from_path(path)?;
        self.latest = None;
        Ok(&*self.current.insert(submission))
    }

    pub fn current(&self) -> Option<&MediaSubmission> {
        self.current.as_ref()
    }

    /// The submission to analyse; errors when nothing is selected.
    pub fn require_current(&self) -> Result<&MediaSubmission> {
        self.current
            .as_ref()
            .ok_or_else(|| anyhow!("Please select a file first"))
    }

    /// Derive and store the analysis for the current submission.
    pub fn record(&mut self, result: &DetectionResult, composer: &ReportComposer) -> Result<&Analysis> {
        let kind = self.require_current()?.kind;
        let analysis = Analysis::from_result(result, kind, composer);
        Ok(&*self.latest.insert(analysis))
    }

    pub fn latest(&self) -> Option<&Analysis> {
        self.latest.as_ref()
    }

    /// Reset for a new analysis.
    pub fn clear(&mut self) {
        self.current = None;
        self.latest = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::ViolationPeriod;
    use crate::report::{DETECTION_SUMMARY, IMMEDIATE_ACTION};

    fn video_result() -> DetectionResult {
        DetectionResult {
            violations: 1,
            compliant: 1,
            total_detections: 2,
            video_duration_s: Some(20.0),
            violation_periods: Some(vec![ViolationPeriod::new(5.0, 10.0)]),
            annotated_video: Some("annotated_gate.mp4".to_string()),
            ..DetectionResult::default()
        }
    }

    #[test]
    fn media_kind_from_extension() -> Result<()> {
        assert_eq!(MediaKind::from_path(Path::new("site/IMG_0042.JPG"))?, MediaKind::Image);
        assert_eq!(MediaKind::from_path(Path::new("gate.mp4"))?, MediaKind::Video);
        let err = MediaKind::from_path(Path::new("notes.pdf")).unwrap_err();
        assert!(err.to_string().contains("Please upload an image or video file"));
        assert!(MediaKind::from_path(Path::new("no_extension")).is_err());
        Ok(())
    }

    #[test]
    fn video_analysis_builds_timeline_and_alerts() {
        let analysis = Analysis::from_result(&video_result(), MediaKind::Video, &ReportComposer::default());
        let timeline = analysis.timeline.as_ref().expect("timeline");
        assert_eq!(timeline.len(), 3);
        assert!(analysis.alert.badge);
        assert!(analysis.alert.violation_highlight);
        assert!(analysis.section(IMMEDIATE_ACTION).is_some());
        assert_eq!(
            analysis.annotated.as_ref().map(|media| media.url("http://127.0.0.1:8000/")),
            Some("http://127.0.0.1:8000/annotated/videos/annotated_gate.mp4".to_string())
        );
    }

    #[test]
    fn image_analysis_has_no_timeline_or_badge() {
        let mut result = video_result();
        result.annotated_video = None;
        result.annotated_image = Some("annotated_site.jpg".to_string());
        let analysis = Analysis::from_result(&result, MediaKind::Image, &ReportComposer::default());
        assert!(analysis.timeline.is_none());
        assert!(!analysis.alert.badge);
        assert!(analysis.alert.violation_highlight);
        assert!(analysis.section(IMMEDIATE_ACTION).is_none());
        assert_eq!(
            analysis.annotated.map(|media| media.url("http://svc:8000")),
            Some("http://svc:8000/annotated/images/annotated_site.jpg".to_string())
        );
    }

    #[test]
    fn timeline_needs_duration_and_period_list() {
        let composer = ReportComposer::default();
        let mut result = video_result();
        result.video_duration_s = None;
        assert!(Analysis::from_result(&result, MediaKind::Video, &composer).timeline.is_none());

        let mut result = video_result();
        result.video_duration_s = Some(0.0);
        assert!(Analysis::from_result(&result, MediaKind::Video, &composer).timeline.is_none());

        let mut result = video_result();
        result.violation_periods = Some(vec![]);
        let analysis = Analysis::from_result(&result, MediaKind::Video, &composer);
        assert_eq!(analysis.timeline.map(|t| t.len()), Some(1));
    }

    #[test]
    fn session_tracks_selection_and_reset() -> Result<()> {
        let mut session = AnalysisSession::new();
        assert!(session.require_current().is_err());
        assert!(session.record(&video_result(), &ReportComposer::default()).is_err());

        session.select("clips/gate.mov")?;
        assert_eq!(session.current().map(|s| s.kind), Some(MediaKind::Video));
        assert_eq!(session.current().map(|s| s.file_name()), Some("gate.mov".to_string()));
        let analysis = session.record(&video_result(), &ReportComposer::default())?;
        assert!(analysis.section(DETECTION_SUMMARY).is_some());
        assert!(session.latest().is_some());

        session.select("stills/site.png")?;
        assert!(session.latest().is_none());

        session.clear();
        assert!(session.current().is_none());
        assert!(session.select("archive.zip").is_err());
        Ok(())
    }
}
