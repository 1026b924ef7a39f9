//! Detection service client.
//!
//! The service accepts one media file per request as `multipart/form-data`
//! (field `file`) on `POST <base>/image` or `POST <base>/video` and answers
//! with a JSON detection result or an `{"error": ...}` object.
//!
//! Every failure on this path is a `ServiceError` so callers can offer a
//! retry instead of rendering a partial report.

use anyhow::{anyhow, Result};
use rand::RngCore;
use std::io::Read;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::analysis::MediaSubmission;
use crate::config::{normalize_service_url, ServiceSettings};
use crate::detect::{
    parse_detection_payload, DetectionResult, ServiceError, MALFORMED_RESULT, SERVICE_STATUS,
    SERVICE_UNREACHABLE,
};

/// Anything that turns a media submission into a detection result.
pub trait DetectionService {
    fn analyze(&self, submission: &MediaSubmission) -> Result<DetectionResult>;
}

/// Blocking HTTP client for the detection service.
#[derive(Debug, Clone)]
pub struct HttpDetectionService {
    base_url: String,
    agent: ureq::Agent,
}

impl HttpDetectionService {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let base_url = normalize_service_url(base_url)?;
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Ok(Self { base_url, agent })
    }

    pub fn from_settings(settings: &ServiceSettings) -> Result<Self> {
        Self::new(&settings.url, settings.timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Upload raw media bytes and parse the response.
    pub fn analyze_bytes(
        &self,
        submission: &MediaSubmission,
        media: &[u8],
    ) -> Result<DetectionResult> {
        let url = format!("{}/{}", self.base_url, submission.kind.endpoint());
        let boundary = multipart_boundary(media);
        let body = multipart_body(&boundary, &submission.file_name(), media);
        log::info!(
            "submitting {} ({} bytes) to {}",
            submission.file_name(),
            media.len(),
            url
        );

        let response = self
            .agent
            .post(&url)
            .set(
                "Content-Type",
                &format!("multipart/form-data; boundary={}", boundary),
            )
            .set("Accept", "application/json")
            .send_bytes(&body);

        let response = match response {
            Ok(response) => response,
            Err(ureq::Error::Status(status, response)) => {
                let text = response.into_string().unwrap_or_default();
                return Err(ServiceError::new(
                    SERVICE_STATUS,
                    format!("Server returned {}: {}", status, text.trim()),
                )
                .into());
            }
            Err(err) => {
                return Err(ServiceError::new(
                    SERVICE_UNREACHABLE,
                    format!("could not reach detection service at {}: {}", url, err),
                )
                .into());
            }
        };

        let mut payload = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut payload)
            .map_err(|e| {
                ServiceError::new(MALFORMED_RESULT, format!("failed to read response: {}", e))
            })?;
        log::debug!("detection service answered with {} bytes", payload.len());
        parse_detection_payload(&payload)
    }
}

impl DetectionService for HttpDetectionService {
    fn analyze(&self, submission: &MediaSubmission) -> Result<DetectionResult> {
        let media = std::fs::read(&submission.path).map_err(|e| {
            anyhow!(
                "failed to read media file {}: {}",
                submission.path.display(),
                e
            )
        })?;
        if media.is_empty() {
            return Err(anyhow!(
                "media file {} is empty",
                submission.path.display()
            ));
        }
        self.analyze_bytes(submission, &media)
    }
}

/// Boundary that does not occur anywhere in `media`.
fn multipart_boundary(media: &[u8]) -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_nanos())
        .unwrap_or_default();
    let mut rng = rand::thread_rng();
    loop {
        let boundary = format!("ppe-report-{:x}-{:016x}", nanos, rng.next_u64());
        if !contains(media, boundary.as_bytes()) {
            return boundary;
        }
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|window| window == needle)
}

fn multipart_body(boundary: &str, file_name: &str, media: &[u8]) -> Vec<u8> {
    let file_name = file_name.replace(['"', '\r', '\n'], "_");
    let mut body = Vec::with_capacity(media.len() + 256);
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n",
            file_name
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(media);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
    body
}
