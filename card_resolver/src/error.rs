//! Error types for card_resolver
//!
//! None of these reach image callers: the resolution pipeline recovers
//! from every failure by advancing to the next tier.

use mtg_common::CatalogError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolverError {
    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),
    /// Catalog request failed
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    /// Exchange rate source failed or returned nothing usable
    #[error("Exchange rate refresh failed: {0}")]
    RateRefresh(String),
    /// HTTP client could not be built or the request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result alias for card_resolver operations
pub type Result<T> = std::result::Result<T, ResolverError>;
