//! Error types for the remote conversion client.
//!
//! The service reports failures as `{ "detail": ... }` where `detail` is
//! either a plain string or an object carrying `error` and/or `message`.
//! Message extraction precedence is fixed: string detail, then
//! `detail.error`, then `detail.message`, then a generic fallback.

use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

/// Shown when no message can be extracted from a failure response.
pub const FALLBACK_MESSAGE: &str = "Conversion failed";

#[derive(Debug, Error)]
pub enum ConvertError {
    /// Failure reported by the conversion service, message verbatim.
    #[error("{0}")]
    Service(String),

    #[error("Conversion request timed out after {0:?}")]
    TimedOut(Duration),

    #[error("Conversion request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Body shape of a failure response.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<ErrorDetail>,
}

/// The `detail` field: a plain string or a structured object.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ErrorDetail {
    Text(String),
    Structured {
        #[serde(default)]
        error: Option<String>,
        #[serde(default)]
        message: Option<String>,
    },
}

impl ErrorDetail {
    /// Best available message, by the documented precedence.
    pub fn message(&self) -> Option<&str> {
        match self {
            ErrorDetail::Text(s) => Some(s),
            ErrorDetail::Structured { error, message } => error.as_deref().or(message.as_deref()),
        }
    }
}

/// Extract the failure message from a raw response body, falling back to
/// [`FALLBACK_MESSAGE`] when the body is not the expected shape.
pub(crate) fn extract_message(body: &[u8]) -> String {
    serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.detail)
        .and_then(|d| d.message().map(str::to_owned))
        .unwrap_or_else(|| FALLBACK_MESSAGE.to_string())
}
