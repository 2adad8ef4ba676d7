//! Catalog-backed providers (Scryfall lookups)

use std::sync::Arc;

use async_trait::async_trait;
use mtg_common::{CardRef, CatalogError, CatalogResult, ImageSize, ScryfallCard, SourceTier};

use super::ImageProvider;
use crate::scryfall::{NameMatch, ScryfallClient};

/// Scryfall identifiers are UUIDs; anything else would only earn a 404.
fn is_catalog_identifier(id: &str) -> bool {
    id.len() == 36 && uuid::Uuid::parse_str(id).is_ok()
}

/// Reduce a catalog result to an image URL, logging why there is none
fn image_from(
    result: CatalogResult<ScryfallCard>,
    size: ImageSize,
    tier: SourceTier,
    query: &str,
) -> Option<String> {
    match result {
        Ok(card) => {
            let url = card.image_url(size).map(str::to_string);
            if url.is_none() {
                log::debug!("[{}] {} has no image for size {}", tier, query, size);
            }
            url
        }
        Err(CatalogError::NotFound { .. }) => {
            log::debug!("[{}] no catalog match for {}", tier, query);
            None
        }
        Err(e) => {
            log::warn!("[{}] catalog lookup failed for {}: {}", tier, query, e);
            None
        }
    }
}

/// Lookup by Scryfall UUID
pub struct IdProvider {
    client: Arc<ScryfallClient>,
}

impl IdProvider {
    pub fn new(client: Arc<ScryfallClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ImageProvider for IdProvider {
    fn tier(&self) -> SourceTier {
        SourceTier::ById
    }

    async fn resolve(&self, card: &CardRef, size: ImageSize) -> Option<String> {
        let id = card.identifier()?;
        if !is_catalog_identifier(id) {
            log::debug!("Skipping id lookup, {:?} is not a catalog identifier", id);
            return None;
        }
        let result = self.client.fetch_card_by_id(id).await;
        image_from(result, size, self.tier(), id)
    }
}

/// Lookup by set code and collector number
pub struct SetNumberProvider {
    client: Arc<ScryfallClient>,
}

impl SetNumberProvider {
    pub fn new(client: Arc<ScryfallClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ImageProvider for SetNumberProvider {
    fn tier(&self) -> SourceTier {
        SourceTier::BySetNumber
    }

    async fn resolve(&self, card: &CardRef, size: ImageSize) -> Option<String> {
        let set_code = card.set_code()?;
        let number = card.collector_number()?;
        let result = self.client.fetch_card_by_set_number(set_code, number).await;
        image_from(
            result,
            size,
            self.tier(),
            &format!("{}/{}", set_code, number),
        )
    }
}

/// Lookup by card name, exact or fuzzy
pub struct NameProvider {
    client: Arc<ScryfallClient>,
    mode: NameMatch,
}

impl NameProvider {
    pub fn new(client: Arc<ScryfallClient>, mode: NameMatch) -> Self {
        Self { client, mode }
    }
}

#[async_trait]
impl ImageProvider for NameProvider {
    fn tier(&self) -> SourceTier {
        match self.mode {
            NameMatch::Exact => SourceTier::ByNameExact,
            NameMatch::Fuzzy => SourceTier::ByNameFuzzy,
        }
    }

    async fn resolve(&self, card: &CardRef, size: ImageSize) -> Option<String> {
        let name = card.name()?;
        let result = self
            .client
            .fetch_card_named(name, self.mode, card.set_code())
            .await;
        image_from(result, size, self.tier(), name)
    }
}
