//! Error types for catalog lookups

use thiserror::Error;

/// Errors raised while talking to a card catalog (Scryfall or compatible)
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed (connection refused, TLS, body read)
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),
    /// Request exceeded the configured timeout
    #[error("Request timed out: {0}")]
    Timeout(String),
    /// Failed to parse JSON response
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    /// HTTP error status code
    #[error("HTTP error: {0}")]
    HttpStatus(reqwest::StatusCode),
    /// Card not found in the catalog
    #[error("Card not found: {query}")]
    NotFound { query: String },
}

impl From<reqwest::Error> for CatalogError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            let target = err
                .url()
                .map(|u| u.to_string())
                .unwrap_or_else(|| "unknown url".to_string());
            CatalogError::Timeout(target)
        } else {
            CatalogError::Network(err)
        }
    }
}

/// Result alias for catalog operations
pub type CatalogResult<T> = std::result::Result<T, CatalogError>;
