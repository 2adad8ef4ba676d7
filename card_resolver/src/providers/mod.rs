//! Image providers, one per upstream source.
//!
//! The pipeline walks a `Vec<Arc<dyn ImageProvider>>` in declared order;
//! adding a source means appending a provider, not editing the walk.

mod catalog;
mod direct;
mod fallback;

use std::sync::Arc;

use async_trait::async_trait;
use mtg_common::{CardRef, ImageSize, SourceTier};

use crate::config::ResolverConfig;
use crate::scryfall::{NameMatch, ScryfallClient};

pub use catalog::{IdProvider, NameProvider, SetNumberProvider};
pub use direct::DirectProvider;
pub use fallback::{LegacyProvider, PlaceholderProvider};

/// One way of turning a card reference into an image URL.
///
/// Providers swallow their own failures: `None` means "no candidate from
/// this source", whether the source had nothing or could not be reached.
#[async_trait]
pub trait ImageProvider: Send + Sync {
    fn tier(&self) -> SourceTier;

    async fn resolve(&self, card: &CardRef, size: ImageSize) -> Option<String>;
}

/// Standard tier order: embedded map, catalog by id, by set/number,
/// by exact name, by fuzzy name, legacy image service.
/// The placeholder is held by the pipeline as the terminal branch.
pub fn default_providers(
    client: Arc<ScryfallClient>,
    config: &ResolverConfig,
) -> Vec<Arc<dyn ImageProvider>> {
    vec![
        Arc::new(DirectProvider),
        Arc::new(IdProvider::new(Arc::clone(&client))),
        Arc::new(SetNumberProvider::new(Arc::clone(&client))),
        Arc::new(NameProvider::new(Arc::clone(&client), NameMatch::Exact)),
        Arc::new(NameProvider::new(client, NameMatch::Fuzzy)),
        Arc::new(LegacyProvider::new(&config.legacy_image_url)),
    ]
}
