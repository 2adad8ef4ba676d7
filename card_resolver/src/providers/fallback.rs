//! Providers that build URLs without asking a catalog

use async_trait::async_trait;
use mtg_common::{CardRef, ImageCandidate, ImageSize, SourceTier};

use super::ImageProvider;

/// Gatherer's image handler, keyed by multiverse ID. Only one image size
/// exists there, so the requested size is ignored.
pub struct LegacyProvider {
    base_url: String,
}

impl LegacyProvider {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
        }
    }
}

#[async_trait]
impl ImageProvider for LegacyProvider {
    fn tier(&self) -> SourceTier {
        SourceTier::Legacy
    }

    async fn resolve(&self, card: &CardRef, _size: ImageSize) -> Option<String> {
        let id = card.multiverse_id.filter(|id| *id > 0)?;
        Some(format!("{}?multiverseid={}&type=card", self.base_url, id))
    }
}

/// Static card back, one image per size. Never fails.
pub struct PlaceholderProvider {
    base_url: String,
}

impl PlaceholderProvider {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn url(&self, size: ImageSize) -> String {
        format!("{}/{}.jpg", self.base_url, size)
    }

    pub fn candidate(&self, size: ImageSize) -> ImageCandidate {
        ImageCandidate {
            url: self.url(size),
            tier: SourceTier::Placeholder,
            size,
        }
    }
}

#[async_trait]
impl ImageProvider for PlaceholderProvider {
    fn tier(&self) -> SourceTier {
        SourceTier::Placeholder
    }

    async fn resolve(&self, _card: &CardRef, size: ImageSize) -> Option<String> {
        Some(self.url(size))
    }
}
