use http::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// A non-2xx response from the Aptly API.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message} ({status})")]
pub struct ApiError {
    /// The HTTP status code.
    pub status: StatusCode,
    /// The server's message, or the raw body when it wasn't Aptly's JSON.
    pub message: String,
}

/// Aptly reports errors as `{"error": ...}`, or a list of those for
/// validation failures.
#[derive(Deserialize)]
#[serde(untagged)]
enum ErrorPayload {
    One(ErrorBody),
    Many(Vec<ErrorBody>),
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    /// Build an error from a response body, preferring Aptly's JSON message.
    pub fn from_body(status: StatusCode, body: &str) -> Self {
        let message = match serde_json::from_str::<ErrorPayload>(body) {
            Ok(ErrorPayload::One(error)) => error.error,
            Ok(ErrorPayload::Many(errors)) if !errors.is_empty() => errors
                .into_iter()
                .map(|e| e.error)
                .collect::<Vec<_>>()
                .join("; "),
            _ if body.trim().is_empty() => status
                .canonical_reason()
                .unwrap_or("empty response")
                .to_string(),
            _ => body.trim().to_string(),
        };
        Self::new(status, message)
    }

    pub fn is_not_found(&self) -> bool {
        self.status == StatusCode::NOT_FOUND
    }

    /// A 404 from the HTTP router rather than from an Aptly handler, which
    /// usually means the configured URL doesn't point at the API.
    pub fn is_page_not_found(&self) -> bool {
        self.is_not_found() && self.message.to_lowercase().contains("page not found")
    }
}
