//! PPE compliance report
//!
//! Turns a helmet-detection result into the two artifacts a site supervisor
//! reads: a compressed violation timeline and a prioritized incident
//! summary.
//!
//! # Module Structure
//!
//! - `detect`: Detection service payload (DetectionResult, ServiceError)
//! - `timeline`: Violation periods to run-length timeline segments
//! - `report`: Rule-driven summary sections and their formatting
//! - `analysis`: Caller-owned state (MediaSubmission, Analysis, AnalysisSession)
//! - `client`: Multipart upload to the detection service
//! - `render`: Text and JSON output
//! - `config`: File + environment configuration
//!
//! `timeline::segment` and `report::compose` are pure; everything that
//! touches the network or the filesystem lives in `client` and `config`.

pub mod analysis;
pub mod client;
pub mod config;
pub mod detect;
pub mod render;
pub mod report;
pub mod timeline;

pub use analysis::{AlertState, Analysis, AnalysisSession, AnnotatedMedia, MediaKind, MediaSubmission};
pub use client::{DetectionService, HttpDetectionService};
pub use config::ReportConfig;
pub use detect::{
    parse_detection_payload, Classification, DetectionResult, PersonRecord, ServiceError, TrackId,
    ViolationPeriod,
};
pub use report::{compose, ReportComposer, ReportSettings, Severity, SummarySection};
pub use timeline::{segment, Segment, SegmentKind, Timeline, TIMELINE_RESOLUTION};
