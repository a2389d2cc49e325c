use reqwest::StatusCode;
use thiserror::Error;

/// Failure of a backend call. `Display` is the message shown to the user.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error(
        "Cannot connect to backend server at {base_url}. \
         Check that the server is running and the URL is correct."
    )]
    Unreachable { base_url: String },

    #[error("Authentication failed. Please log in again.")]
    Unauthorized,

    #[error(
        "Backend Firebase is not configured. Please set up Firebase Admin SDK on the backend server."
    )]
    BackendNotConfigured,

    #[error("{message}")]
    Rejected { status: StatusCode, message: String },

    #[error("Unexpected response from backend: {0}")]
    Decode(String),

    #[error("User not logged in")]
    NotLoggedIn,

    #[error("You must be logged in as a seller to submit properties.")]
    NotSeller,

    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),
}

impl ApiError {
    /// Build the error for a non-2xx response from its status and (possibly empty) JSON body
    pub fn from_response(status: StatusCode, body: &serde_json::Value, action: &str) -> Self {
        let body_message = ["message", "error"]
            .iter()
            .find_map(|key| body.get(*key).and_then(|v| v.as_str()))
            .map(String::from);

        if status == StatusCode::SERVICE_UNAVAILABLE
            && body.get("error").and_then(|v| v.as_str()) == Some("firebase_not_initialized")
        {
            return ApiError::BackendNotConfigured;
        }
        if status == StatusCode::UNAUTHORIZED {
            return ApiError::Unauthorized;
        }

        let message = body_message.unwrap_or_else(|| {
            format!(
                "Failed to {}: {}",
                action,
                status.canonical_reason().unwrap_or(status.as_str())
            )
        });
        ApiError::Rejected { status, message }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Unauthorized => Some(StatusCode::UNAUTHORIZED),
            ApiError::BackendNotConfigured => Some(StatusCode::SERVICE_UNAVAILABLE),
            ApiError::Rejected { status, .. } => Some(*status),
            _ => None,
        }
    }
}
