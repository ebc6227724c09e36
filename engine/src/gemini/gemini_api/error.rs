use serde::Deserialize;
use thiserror::Error;

/// Errors returned by the Gemini API
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Invalid argument (400): {message}")]
    InvalidArgument { message: String },

    #[error("Failed precondition (400): {message}")]
    FailedPrecondition { message: String },

    #[error("Authentication error (401): {message}")]
    Unauthenticated { message: String },

    #[error("Permission denied (403): {message}")]
    PermissionDenied { message: String },

    #[error("Not found (404): {message}")]
    NotFound { message: String },

    #[error("Resource exhausted (429): {message}")]
    ResourceExhausted { message: String },

    #[error("Internal API error (500): {message}")]
    Internal { message: String },

    #[error("Service unavailable (503): {message}")]
    Unavailable { message: String },

    #[error("Deadline exceeded (504): {message}")]
    DeadlineExceeded { message: String },

    /// Catch-all for unexpected statuses
    #[error("Unexpected API error {code}: {message}")]
    Unexpected { code: u16, message: String },
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

impl ApiError {
    pub fn from_status(status: &str, message: impl Into<String>, code: u16) -> Self {
        let message = message.into();

        match status {
            "INVALID_ARGUMENT" => Self::InvalidArgument { message },
            "FAILED_PRECONDITION" => Self::FailedPrecondition { message },
            "UNAUTHENTICATED" => Self::Unauthenticated { message },
            "PERMISSION_DENIED" => Self::PermissionDenied { message },
            "NOT_FOUND" => Self::NotFound { message },
            "RESOURCE_EXHAUSTED" => Self::ResourceExhausted { message },
            "INTERNAL" => Self::Internal { message },
            "UNAVAILABLE" => Self::Unavailable { message },
            "DEADLINE_EXCEEDED" => Self::DeadlineExceeded { message },
            _ => Self::Unexpected { code, message },
        }
    }

    /// Classifies a non-success response. Bodies that aren't Google's error envelope are kept
    /// verbatim.
    pub fn from_response(code: u16, body: &str) -> Self {
        match serde_json::from_str::<ErrorEnvelope>(body) {
            Ok(ErrorEnvelope { error }) => Self::from_status(&error.status, error.message, code),
            Err(_) => Self::Unexpected {
                code,
                message: body.to_string(),
            },
        }
    }
}
