//! Exchange rate state and its background refresher
//!
//! Rates are stored relative to USD. Reads never wait on a refresh; a
//! failed refresh is logged and the last good rate stays in effect.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use mtg_common::Currency;
use serde::Deserialize;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use crate::error::{ResolverError, Result};

#[derive(Debug, Clone, Copy)]
struct RateEntry {
    /// Units of the currency per 1 USD
    per_usd: f64,
    updated_at: Instant,
}

pub struct ExchangeRateState {
    rates: RwLock<HashMap<Currency, RateEntry>>,
    last_refresh: RwLock<Option<DateTime<Utc>>>,
}

fn usable_rate(rate: f64) -> bool {
    rate.is_finite() && rate > 0.0
}

impl ExchangeRateState {
    /// Start from hardcoded fallback rates (per 1 USD)
    pub fn new(fallback: &HashMap<Currency, f64>) -> Self {
        let now = Instant::now();
        let rates = fallback
            .iter()
            .filter(|(currency, rate)| **currency != Currency::Usd && usable_rate(**rate))
            .map(|(currency, rate)| {
                (
                    *currency,
                    RateEntry {
                        per_usd: *rate,
                        updated_at: now,
                    },
                )
            })
            .collect();
        Self {
            rates: RwLock::new(rates),
            last_refresh: RwLock::new(None),
        }
    }

    fn read_rates(&self) -> RwLockReadGuard<'_, HashMap<Currency, RateEntry>> {
        self.rates.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_rates(&self) -> RwLockWriteGuard<'_, HashMap<Currency, RateEntry>> {
        self.rates.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Rate per 1 USD and its age
    pub fn rate_from_usd(&self, currency: Currency) -> Option<(f64, Duration)> {
        if currency == Currency::Usd {
            return Some((1.0, Duration::ZERO));
        }
        self.read_rates()
            .get(&currency)
            .map(|entry| (entry.per_usd, entry.updated_at.elapsed()))
    }

    /// Multiplier converting `from` amounts into `to`, with the age of the
    /// older of the two rates involved
    pub fn cross_rate(&self, from: Currency, to: Currency) -> Option<(f64, Duration)> {
        if from == to {
            return Some((1.0, Duration::ZERO));
        }
        let (from_rate, from_age) = self.rate_from_usd(from)?;
        let (to_rate, to_age) = self.rate_from_usd(to)?;
        Some((to_rate / from_rate, from_age.max(to_age)))
    }

    /// Replace rates with freshly fetched ones; returns how many were taken
    pub fn apply(&self, fetched: &HashMap<Currency, f64>) -> usize {
        let now = Instant::now();
        let mut rates = self.write_rates();
        let mut applied = 0;
        for (currency, rate) in fetched {
            if *currency == Currency::Usd {
                continue;
            }
            if !usable_rate(*rate) {
                warn!("Ignoring unusable {} rate: {}", currency, rate);
                continue;
            }
            rates.insert(
                *currency,
                RateEntry {
                    per_usd: *rate,
                    updated_at: now,
                },
            );
            applied += 1;
        }
        drop(rates);

        if applied > 0 {
            *self
                .last_refresh
                .write()
                .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(Utc::now());
        }
        applied
    }

    /// Wall-clock time of the last successful refresh, `None` while still
    /// on fallback rates
    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        *self
            .last_refresh
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
pub trait RateSource: Send + Sync {
    /// Current rates per 1 USD
    async fn fetch_rates(&self) -> Result<HashMap<Currency, f64>>;
}

/// Response shape of open.er-api.com style endpoints
#[derive(Debug, Deserialize)]
struct RatesResponse {
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    base_code: Option<String>,
    #[serde(default)]
    rates: HashMap<String, f64>,
}

pub struct HttpRateSource {
    http: reqwest::Client,
    url: String,
}

impl HttpRateSource {
    pub fn new(http: reqwest::Client, url: &str) -> Self {
        Self {
            http,
            url: url.to_string(),
        }
    }
}

#[async_trait]
impl RateSource for HttpRateSource {
    async fn fetch_rates(&self) -> Result<HashMap<Currency, f64>> {
        debug!("Fetching exchange rates from {}", self.url);
        let response = self.http.get(&self.url).send().await?;
        if !response.status().is_success() {
            return Err(ResolverError::RateRefresh(format!(
                "HTTP {} from {}",
                response.status(),
                self.url
            )));
        }

        let body: RatesResponse = response.json().await?;
        if body.result.as_deref() == Some("error") {
            return Err(ResolverError::RateRefresh(
                "rate source reported an error".to_string(),
            ));
        }
        if let Some(base) = body.base_code.as_deref() {
            if !base.eq_ignore_ascii_case("USD") {
                return Err(ResolverError::RateRefresh(format!(
                    "expected USD base, got {}",
                    base
                )));
            }
        }

        let rates: HashMap<Currency, f64> = body
            .rates
            .iter()
            .filter_map(|(code, rate)| code.parse::<Currency>().ok().map(|c| (c, *rate)))
            .filter(|(currency, _)| *currency != Currency::Usd)
            .collect();

        if rates.is_empty() {
            return Err(ResolverError::RateRefresh(
                "response carried no supported currencies".to_string(),
            ));
        }
        Ok(rates)
    }
}

/// Fetch once and apply; failures are logged and leave the state alone
pub async fn refresh_once(state: &ExchangeRateState, source: &dyn RateSource) -> bool {
    match source.fetch_rates().await {
        Ok(rates) => {
            let applied = state.apply(&rates);
            info!("Refreshed {} exchange rate(s)", applied);
            applied > 0
        }
        Err(e) => {
            warn!("Exchange rate refresh failed, keeping last good rates: {}", e);
            false
        }
    }
}

/// Background task refreshing rates on a fixed interval. The first
/// refresh happens immediately. Stopped on `stop` or drop.
pub struct RateRefresher {
    handle: JoinHandle<()>,
}

impl RateRefresher {
    pub fn spawn(
        state: Arc<ExchangeRateState>,
        source: Arc<dyn RateSource>,
        every: Duration,
    ) -> Self {
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                refresh_once(&state, source.as_ref()).await;
            }
        });
        Self { handle }
    }

    pub fn stop(&self) {
        self.handle.abort();
    }

    pub fn is_running(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for RateRefresher {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fallback() -> HashMap<Currency, f64> {
        HashMap::from([(Currency::Aud, 1.5), (Currency::Eur, 0.9)])
    }

    /// Source that fails until told otherwise, counting calls
    struct ScriptedSource {
        calls: AtomicUsize,
        aud: Option<f64>,
    }

    #[async_trait]
    impl RateSource for ScriptedSource {
        async fn fetch_rates(&self) -> Result<HashMap<Currency, f64>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match self.aud {
                Some(rate) => Ok(HashMap::from([(Currency::Aud, rate)])),
                None => Err(ResolverError::RateRefresh("upstream down".to_string())),
            }
        }
    }

    #[test]
    fn fallback_rates_serve_before_refresh() {
        let state = ExchangeRateState::new(&fallback());
        let (rate, _) = state.rate_from_usd(Currency::Aud).unwrap();
        assert_eq!(rate, 1.5);
        assert!(state.last_refresh().is_none());
        assert_eq!(state.rate_from_usd(Currency::Usd), Some((1.0, Duration::ZERO)));
    }

    #[test]
    fn cross_rate_goes_through_usd() {
        let state = ExchangeRateState::new(&fallback());
        let (eur_to_aud, _) = state.cross_rate(Currency::Eur, Currency::Aud).unwrap();
        assert!((eur_to_aud - 1.5 / 0.9).abs() < 1e-9);
        assert_eq!(
            state.cross_rate(Currency::Aud, Currency::Aud),
            Some((1.0, Duration::ZERO))
        );
    }

    #[test]
    fn unknown_currency_has_no_rate() {
        let state = ExchangeRateState::new(&HashMap::new());
        assert!(state.rate_from_usd(Currency::Aud).is_none());
        assert!(state.cross_rate(Currency::Usd, Currency::Eur).is_none());
    }

    #[test]
    fn apply_skips_bad_rates() {
        let state = ExchangeRateState::new(&fallback());
        let applied = state.apply(&HashMap::from([
            (Currency::Aud, f64::NAN),
            (Currency::Eur, 0.95),
            (Currency::Usd, 2.0),
        ]));
        assert_eq!(applied, 1);
        assert_eq!(state.rate_from_usd(Currency::Aud).unwrap().0, 1.5);
        assert_eq!(state.rate_from_usd(Currency::Eur).unwrap().0, 0.95);
        assert_eq!(state.rate_from_usd(Currency::Usd).unwrap().0, 1.0);
        assert!(state.last_refresh().is_some());
    }

    #[tokio::test]
    async fn failed_refresh_keeps_last_good_rate() {
        let state = ExchangeRateState::new(&fallback());
        let source = ScriptedSource {
            calls: AtomicUsize::new(0),
            aud: None,
        };

        assert!(!refresh_once(&state, &source).await);
        assert_eq!(state.rate_from_usd(Currency::Aud).unwrap().0, 1.5);
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn refresher_runs_immediately_and_on_interval() {
        let state = Arc::new(ExchangeRateState::new(&fallback()));
        let source = Arc::new(ScriptedSource {
            calls: AtomicUsize::new(0),
            aud: Some(1.6),
        });

        let refresher = RateRefresher::spawn(
            Arc::clone(&state),
            source.clone(),
            Duration::from_secs(60),
        );
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
        assert_eq!(state.rate_from_usd(Currency::Aud).unwrap().0, 1.6);

        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 3);

        refresher.stop();
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(!refresher.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn rate_age_grows_until_refresh() {
        let state = ExchangeRateState::new(&fallback());
        tokio::time::sleep(Duration::from_secs(30)).await;
        let (_, age) = state.rate_from_usd(Currency::Aud).unwrap();
        assert!(age >= Duration::from_secs(30));

        state.apply(&HashMap::from([(Currency::Aud, 1.55)]));
        let (_, age) = state.rate_from_usd(Currency::Aud).unwrap();
        assert_eq!(age, Duration::ZERO);
    }

    #[tokio::test]
    async fn http_source_parses_usd_rates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v6/latest/USD"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": "success",
                "base_code": "USD",
                "rates": { "USD": 1, "AUD": 1.53, "EUR": 0.91, "JPY": 150.2 }
            })))
            .mount(&server)
            .await;

        let source = HttpRateSource::new(
            reqwest::Client::new(),
            &format!("{}/v6/latest/USD", server.uri()),
        );
        let rates = source.fetch_rates().await.unwrap();
        assert_eq!(rates.len(), 2);
        assert_eq!(rates[&Currency::Aud], 1.53);
        assert_eq!(rates[&Currency::Eur], 0.91);
    }

    #[tokio::test]
    async fn http_source_rejects_other_base() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "result": "success",
                "base_code": "EUR",
                "rates": { "AUD": 1.65 }
            })))
            .mount(&server)
            .await;

        let source = HttpRateSource::new(reqwest::Client::new(), &server.uri());
        assert!(matches!(
            source.fetch_rates().await,
            Err(ResolverError::RateRefresh(_))
        ));
    }

    #[tokio::test]
    async fn http_source_error_status_is_refresh_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let state = ExchangeRateState::new(&fallback());
        let source = HttpRateSource::new(reqwest::Client::new(), &server.uri());
        assert!(!refresh_once(&state, &source).await);
        assert_eq!(state.rate_from_usd(Currency::Aud).unwrap().0, 1.5);
    }
}
