use anyhow::Result;
use serde_json::Value;

use crate::detect::result::DetectionResult;

pub const SERVICE_UNREACHABLE: &str = "SERVICE_UNREACHABLE";
pub const SERVICE_STATUS: &str = "SERVICE_STATUS";
pub const SERVICE_ERROR: &str = "SERVICE_ERROR";
pub const MALFORMED_RESULT: &str = "MALFORMED_RESULT";

/// Upstream failure of the detection service.
///
/// Fatal to the current analysis but recoverable by resubmitting. Travels
/// inside `anyhow::Error`; callers tell it apart with
/// `err.downcast_ref::<ServiceError>()`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceError {
    pub code: &'static str,
    pub message: String,
}

impl ServiceError {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Every upstream failure is worth another attempt by the user.
    pub fn is_retryable(&self) -> bool {
        true
    }
}

impl std::fmt::Display for ServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}
impl std::error::Error for ServiceError {}

/// Parse a raw service response body into a `DetectionResult`.
pub fn parse_detection_payload(body: &[u8]) -> Result<DetectionResult> {
    let value: Value = serde_json::from_slice(body).map_err(|e| {
        ServiceError::new(MALFORMED_RESULT, format!("response is not valid JSON: {}", e))
    })?;
    parse_detection_value(value)
}

/// Validate an already-decoded payload.
///
/// An `error` key signals a service-side failure and is never summarized,
/// whatever else the object carries.
pub fn parse_detection_value(value: Value) -> Result<DetectionResult> {
    let obj = value
        .as_object()
        .ok_or_else(|| ServiceError::new(MALFORMED_RESULT, "response must be a JSON object"))?;

    if let Some(error) = obj.get("error") {
        if !error.is_null() {
            let message = match error {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            };
            return Err(ServiceError::new(SERVICE_ERROR, format!("Server error: {}", message)).into());
        }
    }

    let result: DetectionResult = serde_json::from_value(value).map_err(|e| {
        ServiceError::new(MALFORMED_RESULT, format!("unexpected result shape: {}", e))
    })?;
    if result.violations.saturating_add(result.compliant) != result.total_detections {
        log::warn!(
            "detection counts do not reconcile: {} violations + {} compliant != {} total",
            result.violations,
            result.compliant,
            result.total_detections
        );
    }
    Ok(result)
}
