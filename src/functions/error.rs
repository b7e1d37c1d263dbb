use std::fmt::{Display, Formatter};

use serde_json::Value as JsonValue;

/// Error codes shared with the Cloud Functions backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FunctionsErrorCode {
    Cancelled,
    Unknown,
    InvalidArgument,
    DeadlineExceeded,
    NotFound,
    AlreadyExists,
    PermissionDenied,
    ResourceExhausted,
    FailedPrecondition,
    Aborted,
    OutOfRange,
    Unimplemented,
    Internal,
    Unavailable,
    DataLoss,
    Unauthenticated,
}

impl FunctionsErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FunctionsErrorCode::Cancelled => "functions/cancelled",
            FunctionsErrorCode::Unknown => "functions/unknown",
            FunctionsErrorCode::InvalidArgument => "functions/invalid-argument",
            FunctionsErrorCode::DeadlineExceeded => "functions/deadline-exceeded",
            FunctionsErrorCode::NotFound => "functions/not-found",
            FunctionsErrorCode::AlreadyExists => "functions/already-exists",
            FunctionsErrorCode::PermissionDenied => "functions/permission-denied",
            FunctionsErrorCode::ResourceExhausted => "functions/resource-exhausted",
            FunctionsErrorCode::FailedPrecondition => "functions/failed-precondition",
            FunctionsErrorCode::Aborted => "functions/aborted",
            FunctionsErrorCode::OutOfRange => "functions/out-of-range",
            FunctionsErrorCode::Unimplemented => "functions/unimplemented",
            FunctionsErrorCode::Internal => "functions/internal",
            FunctionsErrorCode::Unavailable => "functions/unavailable",
            FunctionsErrorCode::DataLoss => "functions/data-loss",
            FunctionsErrorCode::Unauthenticated => "functions/unauthenticated",
        }
    }

    /// Maps a backend status name (`"NOT_FOUND"`, `"INVALID_ARGUMENT"`, ...) to a code.
    ///
    /// Returns `None` for `OK` and for names the backend is not expected to send.
    pub fn from_status_name(status: &str) -> Option<Self> {
        let code = match status {
            "CANCELLED" => FunctionsErrorCode::Cancelled,
            "UNKNOWN" => FunctionsErrorCode::Unknown,
            "INVALID_ARGUMENT" => FunctionsErrorCode::InvalidArgument,
            "DEADLINE_EXCEEDED" => FunctionsErrorCode::DeadlineExceeded,
            "NOT_FOUND" => FunctionsErrorCode::NotFound,
            "ALREADY_EXISTS" => FunctionsErrorCode::AlreadyExists,
            "PERMISSION_DENIED" => FunctionsErrorCode::PermissionDenied,
            "RESOURCE_EXHAUSTED" => FunctionsErrorCode::ResourceExhausted,
            "FAILED_PRECONDITION" => FunctionsErrorCode::FailedPrecondition,
            "ABORTED" => FunctionsErrorCode::Aborted,
            "OUT_OF_RANGE" => FunctionsErrorCode::OutOfRange,
            "UNIMPLEMENTED" => FunctionsErrorCode::Unimplemented,
            "INTERNAL" => FunctionsErrorCode::Internal,
            "UNAVAILABLE" => FunctionsErrorCode::Unavailable,
            "DATA_LOSS" => FunctionsErrorCode::DataLoss,
            "UNAUTHENTICATED" => FunctionsErrorCode::Unauthenticated,
            _ => return None,
        };
        Some(code)
    }

    /// Maps an HTTP status to a code. Success statuses yield `None`.
    pub fn from_http_status(status: u16) -> Option<Self> {
        if (200..300).contains(&status) {
            return None;
        }
        let code = match status {
            400 => FunctionsErrorCode::InvalidArgument,
            401 => FunctionsErrorCode::Unauthenticated,
            403 => FunctionsErrorCode::PermissionDenied,
            404 => FunctionsErrorCode::NotFound,
            409 => FunctionsErrorCode::Aborted,
            429 => FunctionsErrorCode::ResourceExhausted,
            499 => FunctionsErrorCode::Cancelled,
            500 => FunctionsErrorCode::Internal,
            501 => FunctionsErrorCode::Unimplemented,
            503 => FunctionsErrorCode::Unavailable,
            504 => FunctionsErrorCode::DeadlineExceeded,
            _ => FunctionsErrorCode::Unknown,
        };
        Some(code)
    }
}

#[derive(Clone, Debug)]
pub struct FunctionsError {
    pub code: FunctionsErrorCode,
    message: String,
    details: Option<JsonValue>,
}

impl FunctionsError {
    pub fn new(code: FunctionsErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: JsonValue) -> Self {
        self.details = Some(details);
        self
    }

    pub fn code_str(&self) -> &'static str {
        self.code.as_str()
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// Extra payload the backend attached to the error, if any.
    pub fn details(&self) -> Option<&JsonValue> {
        self.details.as_ref()
    }
}

impl Display for FunctionsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.message, self.code_str())
    }
}

impl std::error::Error for FunctionsError {}

pub type FunctionsResult<T> = Result<T, FunctionsError>;

pub fn invalid_argument(message: impl Into<String>) -> FunctionsError {
    FunctionsError::new(FunctionsErrorCode::InvalidArgument, message)
}

pub fn internal_error(message: impl Into<String>) -> FunctionsError {
    FunctionsError::new(FunctionsErrorCode::Internal, message)
}

pub fn failed_precondition(message: impl Into<String>) -> FunctionsError {
    FunctionsError::new(FunctionsErrorCode::FailedPrecondition, message)
}

/// Builds the error for a non-successful HTTP response, or `None` when the status is 2xx.
///
/// The body may refine the code and message through either
/// `{"error": {"status": "...", "message": "...", "details": ...}}` or `{"error": "..."}`.
pub fn error_for_http_response(status: u16, body: Option<&JsonValue>) -> Option<FunctionsError> {
    let mut code = FunctionsErrorCode::from_http_status(status)?;
    let mut message = default_message(code).to_string();
    let mut details = None;

    match body.and_then(|value| value.get("error")) {
        Some(JsonValue::Object(error)) => {
            if let Some(status_name) = error.get("status").and_then(JsonValue::as_str) {
                match FunctionsErrorCode::from_status_name(status_name) {
                    Some(parsed) => code = parsed,
                    None => {
                        return Some(internal_error(format!(
                            "Function returned an unrecognised status `{status_name}`"
                        )))
                    }
                }
                message = default_message(code).to_string();
            }
            if let Some(text) = error.get("message").and_then(JsonValue::as_str) {
                message = text.to_string();
            }
            details = error.get("details").cloned();
        }
        Some(JsonValue::String(text)) if !text.is_empty() => message = text.clone(),
        _ => {}
    }

    let error = FunctionsError::new(code, message);
    Some(match details {
        Some(details) => error.with_details(details),
        None => error,
    })
}

fn default_message(code: FunctionsErrorCode) -> &'static str {
    match code {
        FunctionsErrorCode::InvalidArgument => "Function rejected the request arguments",
        FunctionsErrorCode::Unauthenticated => "Function requires authentication",
        FunctionsErrorCode::PermissionDenied => "Function denied access",
        FunctionsErrorCode::NotFound => "Function was not found",
        FunctionsErrorCode::ResourceExhausted => "Function quota exhausted",
        FunctionsErrorCode::Unavailable => "Function is unavailable",
        FunctionsErrorCode::DeadlineExceeded => "Function timed out",
        FunctionsErrorCode::Internal => "Function failed with an internal error",
        _ => "Function call failed",
    }
}
