//! Error types for history assembly and Fate classification
//!
//! Errors are classified by recoverability:
//! - Retryable: transport failures, timeouts, rate limits, upstream 5xx
//! - NonRetryable: bad records, empty histories, misconfiguration
//!
//! The core never retries on its own; `is_retryable` is a hint for callers
//! that wrap `classify_history` in their own retry policy.

use thiserror::Error;

/// Failure talking to one of the Chronicler feeds.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Chronicler error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Failed to decode Chronicler response: {0}")]
    Decode(String),

    #[error("Invalid Chronicler base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("Pagination did not finish within {limit} pages")]
    PageLimitExceeded { limit: usize },
}

impl FetchError {
    /// Returns true if an outer retry policy could reasonably try again.
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Http(err) => err.is_timeout() || err.is_connect(),
            FetchError::Api { status, .. } => *status == 429 || *status == 408 || *status >= 500,
            FetchError::Decode(_)
            | FetchError::InvalidBaseUrl(_)
            | FetchError::PageLimitExceeded { .. } => false,
        }
    }
}

/// Everything `classify_history` can fail with.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error("No trackable Fate history for player {player_id}")]
    EmptyHistory { player_id: String },

    #[error("Malformed update record #{index}: {reason}")]
    MalformedRecord { index: usize, reason: String },
}

impl HistoryError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, HistoryError::Fetch(err) if err.is_retryable())
    }

    /// Get a user-friendly recovery suggestion
    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            HistoryError::Fetch(FetchError::InvalidBaseUrl(_)) => {
                "Check chronicler.baseUrl in ~/.fatetrace/config.json"
            }
            HistoryError::Fetch(FetchError::PageLimitExceeded { .. }) => {
                "Chronicler kept returning new pages. Raise chronicler.maxPages or try later."
            }
            HistoryError::Fetch(err) if err.is_retryable() => {
                "Chronicler is unreachable or busy. Wait a moment and try again."
            }
            HistoryError::Fetch(_) => "Chronicler rejected the request. Check the player ID.",
            HistoryError::EmptyHistory { .. } => {
                "Chronicler has no Fate records for this player yet."
            }
            HistoryError::MalformedRecord { .. } => {
                "Chronicler returned a record this version cannot read."
            }
        }
    }
}

/// Serializable error representation for presentation layers
#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorPayload {
    pub message: String,
    pub error_type: ErrorType,
    pub can_retry: bool,
    pub recovery_suggestion: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    FetchFailure,
    EmptyHistory,
    MalformedRecord,
}

impl From<&HistoryError> for ErrorPayload {
    fn from(err: &HistoryError) -> Self {
        let error_type = match err {
            HistoryError::Fetch(_) => ErrorType::FetchFailure,
            HistoryError::EmptyHistory { .. } => ErrorType::EmptyHistory,
            HistoryError::MalformedRecord { .. } => ErrorType::MalformedRecord,
        };

        ErrorPayload {
            message: err.to_string(),
            error_type,
            can_retry: err.is_retryable(),
            recovery_suggestion: err.recovery_suggestion().to_string(),
        }
    }
}
