//! Resolver and price configuration

use std::collections::HashMap;
use std::time::Duration;

use mtg_common::Currency;

use crate::error::{ResolverError, Result};

pub const DEFAULT_CATALOG_URL: &str = "https://api.scryfall.com";
pub const DEFAULT_LEGACY_IMAGE_URL: &str = "https://gatherer.wizards.com/Handlers/Image.ashx";
pub const DEFAULT_PLACEHOLDER_URL: &str = "https://cards.scryfall.io/back";
pub const DEFAULT_RATES_URL: &str = "https://open.er-api.com/v6/latest/USD";
pub const DEFAULT_USER_AGENT: &str = "D2D-Automations-CardResolver/1.0";

/// Scryfall asks clients to keep 50-100ms between requests
pub const DEFAULT_MIN_INTERVAL: Duration = Duration::from_millis(100);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(2);
pub const DEFAULT_VALIDATION_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_CACHE_CEILING: usize = 2000;

pub const FALLBACK_USD_AUD: f64 = 1.5;
pub const FALLBACK_USD_EUR: f64 = 0.92;
pub const DEFAULT_RATE_REFRESH: Duration = Duration::from_secs(60 * 60);

/// Etched prices are rarely listed; this guess scales the foil price.
/// Unverified business rule, kept configurable.
pub const DEFAULT_ETCHED_MULTIPLIER: f64 = 1.2;

/// Settings for the image resolution pipeline
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    pub catalog_base_url: String,
    pub legacy_image_url: String,
    pub placeholder_base_url: String,
    pub user_agent: String,
    /// Per-request timeout for catalog lookups
    pub request_timeout: Duration,
    /// Time box for a single validation load attempt
    pub validation_timeout: Duration,
    /// Minimum spacing between any two catalog requests
    pub min_interval: Duration,
    /// Entry count that triggers an eviction pass
    pub cache_ceiling: usize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            catalog_base_url: DEFAULT_CATALOG_URL.to_string(),
            legacy_image_url: DEFAULT_LEGACY_IMAGE_URL.to_string(),
            placeholder_base_url: DEFAULT_PLACEHOLDER_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            validation_timeout: DEFAULT_VALIDATION_TIMEOUT,
            min_interval: DEFAULT_MIN_INTERVAL,
            cache_ceiling: DEFAULT_CACHE_CEILING,
        }
    }
}

fn check_url(field: &str, value: &str) -> Result<()> {
    if value.starts_with("http://") || value.starts_with("https://") {
        Ok(())
    } else {
        Err(ResolverError::Config(format!(
            "{} must be an http(s) URL, got {:?}",
            field, value
        )))
    }
}

impl ResolverConfig {
    pub fn validate(&self) -> Result<()> {
        check_url("catalog_base_url", &self.catalog_base_url)?;
        check_url("legacy_image_url", &self.legacy_image_url)?;
        check_url("placeholder_base_url", &self.placeholder_base_url)?;
        if self.cache_ceiling == 0 {
            return Err(ResolverError::Config(
                "cache_ceiling must be at least 1".to_string(),
            ));
        }
        if self.request_timeout.is_zero() || self.validation_timeout.is_zero() {
            return Err(ResolverError::Config("timeouts must be non-zero".to_string()));
        }
        Ok(())
    }
}

/// Settings for price normalisation and the exchange rate refresher
#[derive(Debug, Clone)]
pub struct PriceConfig {
    /// Rates from USD used until the first refresh succeeds
    pub fallback_rates: HashMap<Currency, f64>,
    pub rates_url: String,
    /// `None` disables the background refresher
    pub refresh_interval: Option<Duration>,
    pub etched_multiplier: f64,
}

impl Default for PriceConfig {
    fn default() -> Self {
        Self {
            fallback_rates: HashMap::from([
                (Currency::Aud, FALLBACK_USD_AUD),
                (Currency::Eur, FALLBACK_USD_EUR),
            ]),
            rates_url: DEFAULT_RATES_URL.to_string(),
            refresh_interval: Some(DEFAULT_RATE_REFRESH),
            etched_multiplier: DEFAULT_ETCHED_MULTIPLIER,
        }
    }
}

impl PriceConfig {
    pub fn validate(&self) -> Result<()> {
        check_url("rates_url", &self.rates_url)?;
        if let Some((currency, rate)) = self
            .fallback_rates
            .iter()
            .find(|(_, rate)| !rate.is_finite() || **rate <= 0.0)
        {
            return Err(ResolverError::Config(format!(
                "fallback rate for {} must be positive, got {}",
                currency, rate
            )));
        }
        if !self.etched_multiplier.is_finite() || self.etched_multiplier <= 0.0 {
            return Err(ResolverError::Config(
                "etched_multiplier must be positive".to_string(),
            ));
        }
        if matches!(self.refresh_interval, Some(d) if d.is_zero()) {
            return Err(ResolverError::Config(
                "refresh_interval must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(ResolverConfig::default().validate().is_ok());
        assert!(PriceConfig::default().validate().is_ok());
    }

    #[test]
    fn zero_ceiling_is_rejected() {
        let config = ResolverConfig {
            cache_ceiling: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ResolverError::Config(_))));
    }

    #[test]
    fn non_http_catalog_url_is_rejected() {
        let config = ResolverConfig {
            catalog_base_url: "ftp://scryfall".to_string(),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("catalog_base_url"));
    }

    #[test]
    fn non_positive_fallback_rate_is_rejected() {
        let mut config = PriceConfig::default();
        config.fallback_rates.insert(Currency::Aud, 0.0);
        assert!(config.validate().is_err());
    }
}
