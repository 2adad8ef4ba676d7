use async_trait::async_trait;
use mtg_common::{CardRef, ImageSize, SourceTier};

use super::ImageProvider;

/// Reads the image map already embedded in the record. No network.
pub struct DirectProvider;

#[async_trait]
impl ImageProvider for DirectProvider {
    fn tier(&self) -> SourceTier {
        SourceTier::Direct
    }

    async fn resolve(&self, card: &CardRef, size: ImageSize) -> Option<String> {
        card.embedded_image(size).map(str::to_string)
    }
}
