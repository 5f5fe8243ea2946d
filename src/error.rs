//! Error types for image generation.

use serde::Serialize;
use std::fmt;

/// Maximum number of characters of an error body kept in messages.
const MAX_BODY_CHARS: usize = 200;

/// Errors that can occur while generating and saving images.
#[derive(Debug, thiserror::Error)]
pub enum BrandGenError {
    /// API key missing, or other fatal setup problem.
    #[error("configuration error: {0}")]
    Config(String),

    /// The generation endpoint returned a non-success status.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Downloading the image from the returned URL failed.
    #[error("download failed: {status} - {message}")]
    Download { status: u16, message: String },

    /// Network or HTTP error (including timeouts).
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Response did not have the expected shape.
    #[error("unexpected response: {0}")]
    UnexpectedResponse(String),

    /// Failed to decode base64 data.
    #[error("failed to decode: {0}")]
    Decode(String),

    /// I/O error (e.g., saving file).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid manifest or request parameters.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl BrandGenError {
    /// Classifies this error as a per-item failure reason.
    ///
    /// Returns `None` for errors that are fatal to the whole run
    /// (configuration and invalid input) rather than to a single image.
    pub fn reason(&self) -> Option<FailureReason> {
        match self {
            Self::Api { status, .. } => Some(FailureReason::Request { status: *status }),
            Self::Download { status, .. } => Some(FailureReason::Download { status: *status }),
            Self::Network(_) => Some(FailureReason::Transport),
            Self::UnexpectedResponse(_) | Self::Decode(_) | Self::Json(_) => {
                Some(FailureReason::MalformedResponse)
            }
            Self::Io(_) => Some(FailureReason::Write),
            Self::Config(_) | Self::InvalidRequest(_) => None,
        }
    }
}

/// Why a single generation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FailureReason {
    /// The generation endpoint answered with a non-success status.
    Request { status: u16 },
    /// Network fault or timeout on either request.
    Transport,
    /// The response body had no usable image payload.
    MalformedResponse,
    /// The follow-up download of a returned URL failed.
    Download { status: u16 },
    /// The image could not be written to disk.
    Write,
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Request { status } => write!(f, "request failed ({status})"),
            Self::Transport => write!(f, "transport error"),
            Self::MalformedResponse => write!(f, "malformed response"),
            Self::Download { status } => write!(f, "download failed ({status})"),
            Self::Write => write!(f, "write failed"),
        }
    }
}

/// Truncates an error body so it can be logged and reported.
pub(crate) fn truncate_body(text: &str) -> String {
    let text = text.trim();
    match text.char_indices().nth(MAX_BODY_CHARS) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

/// Result type alias for image generation operations.
pub type Result<T> = std::result::Result<T, BrandGenError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_classification() {
        let err = BrandGenError::Api {
            status: 500,
            message: "boom".into(),
        };
        assert_eq!(err.reason(), Some(FailureReason::Request { status: 500 }));

        let err = BrandGenError::Download {
            status: 404,
            message: "gone".into(),
        };
        assert_eq!(err.reason(), Some(FailureReason::Download { status: 404 }));

        assert_eq!(
            BrandGenError::Decode("bad base64".into()).reason(),
            Some(FailureReason::MalformedResponse)
        );
        assert_eq!(
            BrandGenError::UnexpectedResponse("no data".into()).reason(),
            Some(FailureReason::MalformedResponse)
        );
        assert_eq!(
            BrandGenError::Io(std::io::Error::other("disk full")).reason(),
            Some(FailureReason::Write)
        );
        assert_eq!(BrandGenError::Config("no key".into()).reason(), None);
    }

    #[test]
    fn test_error_display() {
        let err = BrandGenError::Api {
            status: 404,
            message: "Not found".into(),
        };
        assert_eq!(err.to_string(), "API error: 404 - Not found");

        let err = BrandGenError::Config("OPENAI_API_KEY not set".into());
        assert_eq!(err.to_string(), "configuration error: OPENAI_API_KEY not set");
    }

    #[test]
    fn test_truncate_body() {
        assert_eq!(truncate_body("  short  "), "short");

        let long = "x".repeat(500);
        let truncated = truncate_body(&long);
        assert_eq!(truncated.len(), MAX_BODY_CHARS + 3);
        assert!(truncated.ends_with("..."));

        // multi-byte characters are not split
        let wide = "é".repeat(300);
        assert_eq!(truncate_body(&wide).chars().count(), MAX_BODY_CHARS + 3);
    }

    #[test]
    fn test_reason_display_and_json() {
        assert_eq!(
            FailureReason::Request { status: 429 }.to_string(),
            "request failed (429)"
        );
        let json = serde_json::to_value(FailureReason::Download { status: 410 }).unwrap();
        assert_eq!(json["kind"], "download");
        assert_eq!(json["status"], 410);
    }
}
