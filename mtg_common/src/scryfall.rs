//! Scryfall card model

use serde::{Deserialize, Serialize};

use crate::card::{face_image, CardFace, CardRef, ImageSize, ImageUris};
use crate::prices::RawPrices;

/// Scryfall card response
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ScryfallCard {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub set: Option<String>,
    #[serde(default)]
    pub collector_number: Option<String>,
    #[serde(default)]
    pub multiverse_ids: Vec<u64>,
    #[serde(default)]
    pub prices: RawPrices,
    #[serde(default)]
    pub image_uris: Option<ImageUris>,
    /// For double-faced cards, images are in card_faces
    #[serde(default)]
    pub card_faces: Option<Vec<CardFace>>,
}

impl ScryfallCard {
    /// Image URL for the requested size, front face first
    pub fn image_url(&self, size: ImageSize) -> Option<&str> {
        face_image(self.image_uris.as_ref(), self.card_faces.as_deref(), size)
    }

    /// Convert to a card reference carrying everything the resolver can use
    pub fn to_card_ref(&self) -> CardRef {
        CardRef {
            identifier: self.id.clone(),
            name: Some(self.name.clone()),
            set_code: self.set.clone(),
            collector_number: self.collector_number.clone(),
            multiverse_id: self.multiverse_ids.first().copied(),
            image_uris: self.image_uris.clone(),
            card_faces: self.card_faces.clone(),
            prices: Some(self.prices.clone()),
        }
    }
}

/// Scryfall API error response
#[derive(Debug, Deserialize)]
pub struct ScryfallErrorBody {
    pub status: u16,
    pub code: String,
    pub details: String,
}
