//! Error types for photo editing sessions.

use std::time::Duration;

/// Longest provider error body kept in an error message.
const MAX_ERROR_MESSAGE_LEN: usize = 500;

/// Errors that can occur while loading or editing an image.
#[derive(Debug, thiserror::Error)]
pub enum LuminaError {
    /// The selected file is not an image.
    #[error("not an image: {0}")]
    Validation(String),

    /// The AI response carried no content parts.
    #[error("no content returned from AI")]
    NoContent,

    /// The AI response had content but no inline image part.
    #[error("no image part found in AI response")]
    NoImageInResponse,

    /// API key missing or rejected.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Sanitized response body.
        message: String,
    },

    /// Rate limit exceeded.
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited {
        /// Server-suggested delay, if any.
        retry_after: Option<Duration>,
    },

    /// Billing is not enabled for the API key.
    #[error("billing error: {0}")]
    Billing(String),

    /// Network or HTTP error.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Content was blocked by safety filters.
    #[error("content blocked: {0}")]
    ContentBlocked(String),

    /// Invalid request parameters.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// An edit is already in flight for this session.
    #[error("an edit is already in progress")]
    Busy,

    /// No image has been loaded into the session.
    #[error("no image loaded")]
    NoImageLoaded,

    /// The edit prompt was blank.
    #[error("edit prompt is empty")]
    EmptyPrompt,

    /// No history entry with the given id.
    #[error("no history item with id {0}")]
    UnknownHistoryItem(String),

    /// Failed to decode base64 data or a data URI.
    #[error("failed to decode: {0}")]
    Decode(String),

    /// I/O error (reading an upload, saving an export).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LuminaError {
    /// Returns true for failures of the call to the generation service itself
    /// (network, authentication, quota, HTTP status).
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            Self::Auth(_)
                | Self::Api { .. }
                | Self::RateLimited { .. }
                | Self::Billing(_)
                | Self::Network(_)
        )
    }

    /// Returns the message shown to the user when an edit fails.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(_) => "Please select an image file.".into(),
            Self::NoContent => "The AI returned an empty response. Please try again.".into(),
            Self::NoImageInResponse => {
                "The AI answered without an image. Try rephrasing your instruction.".into()
            }
            Self::Auth(_) => "The AI service rejected the API key. Check your credentials.".into(),
            Self::RateLimited {
                retry_after: Some(delay),
            } => format!(
                "Too many requests. Please wait {}s and try again.",
                delay.as_secs().max(1)
            ),
            Self::RateLimited { retry_after: None } => {
                "Too many requests. Please wait a moment and try again.".into()
            }
            Self::Billing(_) => "Billing is not enabled for this API key.".into(),
            Self::Api { .. } | Self::Network(_) => {
                "Failed to reach the AI service. Please try again.".into()
            }
            Self::ContentBlocked(_) => {
                "The request was blocked by the AI safety filter. Try a different image or instruction."
                    .into()
            }
            Self::InvalidRequest(msg) => format!("The AI service rejected the request: {msg}"),
            Self::Busy => "An edit is already in progress.".into(),
            Self::NoImageLoaded => "Upload a photo first.".into(),
            Self::EmptyPrompt => "Describe the edit you want first.".into(),
            Self::UnknownHistoryItem(_) => "That history entry is no longer available.".into(),
            Self::Decode(_) | Self::Json(_) => {
                "The AI returned an image that could not be read. Please try again.".into()
            }
            Self::Io(e) => format!("File error: {e}"),
        }
    }
}

/// Result type alias for editing operations.
pub type Result<T> = std::result::Result<T, LuminaError>;

/// Parses a `Retry-After` header given in whole seconds.
pub(crate) fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}

/// Reduces a provider error body to something safe to show and log.
///
/// Extracts `error.message` from Google-style JSON bodies, redacts anything
/// that looks like a Google API key, and caps the length.
pub(crate) fn sanitize_error_message(text: &str) -> String {
    let extracted = serde_json::from_str::<serde_json::Value>(text)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| text.trim().to_string());

    let redacted = extracted
        .split(' ')
        .map(|word| {
            if word.contains("AIza") {
                "[REDACTED]"
            } else {
                word
            }
        })
        .collect::<Vec<_>>()
        .join(" ");

    match redacted.char_indices().nth(MAX_ERROR_MESSAGE_LEN) {
        Some((idx, _)) => format!("{}...", &redacted[..idx]),
        None => redacted,
    }
}
