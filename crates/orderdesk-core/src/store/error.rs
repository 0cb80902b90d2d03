use serde::Deserialize;
use thiserror::Error;

/// Code the store attaches when a single-row request matched zero (or
/// more than one) rows.
pub const NO_ROWS_CODE: &str = "PGRST116";

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Structured fault from the record store.
///
/// The store reports errors as a `{message, code}` object; the message
/// is human-readable and is passed through to the caller verbatim.
#[derive(Error, Debug, Clone, Deserialize)]
#[error("{message}")]
pub struct StoreError {
    pub message: String,
    #[serde(default)]
    pub code: Option<String>,
}

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: None,
        }
    }

    /// The error a single-row select produces when it matches `count`
    /// rows instead of exactly one.
    pub fn no_rows(count: usize) -> Self {
        Self {
            message: format!("Expected a single row, matched {}", count),
            code: Some(NO_ROWS_CODE.to_string()),
        }
    }

    /// Whether this is the store's "no rows found" condition.
    pub fn is_no_rows(&self) -> bool {
        self.code.as_deref() == Some(NO_ROWS_CODE)
    }

    /// Build an error from a non-success HTTP response body.
    ///
    /// The store sends its own `{message, code}` object; anything else
    /// (proxies, gateways) is wrapped with the status line.
    pub(crate) fn from_response(status: reqwest::StatusCode, body: &str) -> Self {
        if let Ok(err) = serde_json::from_str::<StoreError>(body) {
            if !err.message.is_empty() {
                return err;
            }
        }
        Self::new(format!("Status {}: {}", status, Self::truncate_body(body)))
    }

    /// Truncate a response body to avoid carrying excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            format!(
                "{}... (truncated, {} total bytes)",
                body.chars().take(MAX_ERROR_BODY_LENGTH).collect::<String>(),
                body.len()
            )
        }
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(err: reqwest::Error) -> Self {
        Self::new(err.to_string())
    }
}
