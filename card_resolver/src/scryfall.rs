//! Scryfall API client for card lookups
//!
//! Every request goes through the shared [`RateGovernor`] and is bounded by
//! the configured request timeout.

use std::sync::Arc;

use mtg_common::scryfall::ScryfallErrorBody;
use mtg_common::{CatalogError, CatalogResult, ScryfallCard};

use crate::config::ResolverConfig;
use crate::error::Result;
use crate::governor::RateGovernor;

/// Name matching mode for `/cards/named`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameMatch {
    Exact,
    Fuzzy,
}

impl NameMatch {
    fn param(&self) -> &'static str {
        match self {
            NameMatch::Exact => "exact",
            NameMatch::Fuzzy => "fuzzy",
        }
    }
}

pub struct ScryfallClient {
    http: reqwest::Client,
    base_url: String,
    governor: Arc<RateGovernor>,
}

impl ScryfallClient {
    pub fn new(config: &ResolverConfig, governor: Arc<RateGovernor>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self::with_http(http, &config.catalog_base_url, governor))
    }

    pub fn with_http(http: reqwest::Client, base_url: &str, governor: Arc<RateGovernor>) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            governor,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch a card by its Scryfall UUID
    pub async fn fetch_card_by_id(&self, id: &str) -> CatalogResult<ScryfallCard> {
        let url = format!("{}/cards/{}", self.base_url, urlencoding::encode(id));
        self.get_card(&url).await
    }

    /// Fetch a card from Scryfall by set code and collector number
    pub async fn fetch_card_by_set_number(
        &self,
        set_code: &str,
        collector_number: &str,
    ) -> CatalogResult<ScryfallCard> {
        let url = format!(
            "{}/cards/{}/{}",
            self.base_url,
            urlencoding::encode(&set_code.to_lowercase()),
            urlencoding::encode(collector_number)
        );
        self.get_card(&url).await
    }

    /// Fetch a card by name, optionally restricted to one set
    pub async fn fetch_card_named(
        &self,
        name: &str,
        mode: NameMatch,
        set_code: Option<&str>,
    ) -> CatalogResult<ScryfallCard> {
        let mut url = format!(
            "{}/cards/named?{}={}",
            self.base_url,
            mode.param(),
            urlencoding::encode(name)
        );
        if let Some(set) = set_code {
            url.push_str("&set=");
            url.push_str(&urlencoding::encode(&set.to_lowercase()));
        }
        self.get_card(&url).await
    }

    async fn get_card(&self, url: &str) -> CatalogResult<ScryfallCard> {
        self.governor.acquire().await;
        log::debug!("Fetching card from Scryfall: {}", url);

        let response = self.http.get(url).send().await?;
        let status = response.status();

        if status.is_success() {
            let body = response.text().await?;
            return Ok(serde_json::from_str::<ScryfallCard>(&body)?);
        }

        if status == reqwest::StatusCode::NOT_FOUND {
            let details = match response.json::<ScryfallErrorBody>().await {
                Ok(error) => format!(
                    "{} ({} {}: {})",
                    url, error.status, error.code, error.details
                ),
                Err(_) => url.to_string(),
            };
            return Err(CatalogError::NotFound { query: details });
        }

        Err(CatalogError::HttpStatus(status))
    }
}

#[cfg(test)]
#[path = "scryfall_tests.rs"]
mod tests;
