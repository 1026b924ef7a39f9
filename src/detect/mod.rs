mod payload;
mod result;

pub use payload::{
    parse_detection_payload, parse_detection_value, ServiceError, MALFORMED_RESULT, SERVICE_ERROR,
    SERVICE_STATUS, SERVICE_UNREACHABLE,
};
pub use result::{Classification, DetectionResult, PersonRecord, TrackId, ViolationPeriod};
