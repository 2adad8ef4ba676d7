//! Top-level entry point tying the image pipeline and price normaliser
//! together behind one object with an explicit lifecycle.

use std::sync::Arc;

use mtg_common::{CardRef, Currency, Finish, ImageCandidate, ImageSize, RawPrices};
use tokio::task::JoinHandle;

use crate::config::{PriceConfig, ResolverConfig};
use crate::error::{ResolverError, Result};
use crate::governor::RateGovernor;
use crate::image_cache::CacheStats;
use crate::pipeline::{ImagePipeline, ResolveOptions};
use crate::price::{
    refresh_once, ExchangeRateState, HttpRateSource, PriceNormalizer, PriceQuote, RateRefresher,
    RateSource,
};
use crate::providers::{default_providers, PlaceholderProvider};
use crate::scryfall::ScryfallClient;
use crate::validation::HttpImageValidator;

pub struct CardResolver {
    pipeline: ImagePipeline,
    prices: PriceNormalizer,
    rate_source: Arc<dyn RateSource>,
    refresher: Option<RateRefresher>,
}

impl CardResolver {
    /// Build the full stack from configuration. Must be called inside a
    /// Tokio runtime when a refresh interval is configured.
    pub fn new(config: ResolverConfig, price_config: PriceConfig) -> Result<Self> {
        config.validate()?;
        price_config.validate()?;

        let governor = Arc::new(RateGovernor::new(config.min_interval));
        let client = Arc::new(ScryfallClient::new(&config, governor)?);
        let validator = Arc::new(HttpImageValidator::new(&config)?);
        let pipeline = ImagePipeline::new(
            default_providers(client, &config),
            PlaceholderProvider::new(&config.placeholder_base_url),
            validator,
            config.cache_ceiling,
        );

        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.request_timeout)
            .build()?;
        let rate_source: Arc<dyn RateSource> =
            Arc::new(HttpRateSource::new(http, &price_config.rates_url));

        let mut resolver = Self::from_parts(pipeline, &price_config, rate_source);
        if let Some(every) = price_config.refresh_interval {
            if tokio::runtime::Handle::try_current().is_err() {
                return Err(ResolverError::Config(
                    "rate refresher needs a Tokio runtime".to_string(),
                ));
            }
            resolver.refresher = Some(RateRefresher::spawn(
                Arc::clone(resolver.prices.rates()),
                Arc::clone(&resolver.rate_source),
                every,
            ));
        }

        log::info!(
            "Card resolver ready (catalog: {}, cache ceiling: {})",
            config.catalog_base_url,
            config.cache_ceiling
        );
        Ok(resolver)
    }

    /// Assemble from pre-built parts; no background refresher is started
    pub fn from_parts(
        pipeline: ImagePipeline,
        price_config: &PriceConfig,
        rate_source: Arc<dyn RateSource>,
    ) -> Self {
        let rates = Arc::new(ExchangeRateState::new(&price_config.fallback_rates));
        Self {
            pipeline,
            prices: PriceNormalizer::new(rates, price_config.etched_multiplier),
            rate_source,
            refresher: None,
        }
    }

    /// Image URL for `card`; never fails
    pub async fn resolve_image(
        &self,
        card: &CardRef,
        size: ImageSize,
        options: ResolveOptions,
    ) -> String {
        self.pipeline.resolve(card, size, options).await.url
    }

    /// Like [`resolve_image`](Self::resolve_image), also reporting the tier
    pub async fn resolve_image_detailed(
        &self,
        card: &CardRef,
        size: ImageSize,
        options: ResolveOptions,
    ) -> ImageCandidate {
        self.pipeline.resolve(card, size, options).await
    }

    pub fn quote_price(&self, raw: &RawPrices, target: Currency) -> Option<PriceQuote> {
        self.prices.quote(raw, target)
    }

    pub fn quote_price_for(
        &self,
        raw: &RawPrices,
        finish: Finish,
        target: Currency,
    ) -> Option<PriceQuote> {
        self.prices.quote_for(raw, finish, target)
    }

    /// Fetch rates now instead of waiting for the next tick
    pub async fn refresh_rates(&self) -> bool {
        refresh_once(self.prices.rates(), self.rate_source.as_ref()).await
    }

    /// Fire-and-forget cache warm-up
    pub fn preload(&self, cards: Vec<CardRef>, size: ImageSize) -> JoinHandle<()> {
        self.pipeline.preload(cards, size)
    }

    pub fn clear_cache(&self) {
        self.pipeline.clear_cache();
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.pipeline.cache_stats()
    }

    /// Stop background work and drop cached state
    pub fn dispose(&mut self) {
        if let Some(refresher) = self.refresher.take() {
            refresher.stop();
        }
        self.pipeline.clear_cache();
        log::info!("Card resolver disposed");
    }

    pub fn is_refreshing(&self) -> bool {
        self.refresher.as_ref().is_some_and(|r| r.is_running())
    }
}
