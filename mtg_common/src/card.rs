//! Card references and image types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::prices::RawPrices;

/// Display size token for card images (matches Scryfall's image_uris keys)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageSize {
    Small,
    Normal,
    Large,
    ArtCrop,
    BorderCrop,
}

impl ImageSize {
    pub const ALL: [ImageSize; 5] = [
        ImageSize::Small,
        ImageSize::Normal,
        ImageSize::Large,
        ImageSize::ArtCrop,
        ImageSize::BorderCrop,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ImageSize::Small => "small",
            ImageSize::Normal => "normal",
            ImageSize::Large => "large",
            ImageSize::ArtCrop => "art_crop",
            ImageSize::BorderCrop => "border_crop",
        }
    }

    /// Sizes to try, in order, when this size is missing from an image map.
    /// Art crops only show the illustration, so they are never substituted
    /// for a full card image.
    fn fallback_chain(&self) -> &'static [ImageSize] {
        match self {
            ImageSize::Small => &[
                ImageSize::Small,
                ImageSize::Normal,
                ImageSize::Large,
                ImageSize::BorderCrop,
            ],
            ImageSize::Normal => &[
                ImageSize::Normal,
                ImageSize::Large,
                ImageSize::Small,
                ImageSize::BorderCrop,
            ],
            ImageSize::Large => &[
                ImageSize::Large,
                ImageSize::Normal,
                ImageSize::Small,
                ImageSize::BorderCrop,
            ],
            ImageSize::BorderCrop => &[
                ImageSize::BorderCrop,
                ImageSize::Normal,
                ImageSize::Large,
                ImageSize::Small,
            ],
            ImageSize::ArtCrop => &[ImageSize::ArtCrop, ImageSize::Normal, ImageSize::Large],
        }
    }
}

impl fmt::Display for ImageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ImageSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "small" => Ok(ImageSize::Small),
            "normal" => Ok(ImageSize::Normal),
            "large" => Ok(ImageSize::Large),
            "art_crop" | "art-crop" => Ok(ImageSize::ArtCrop),
            "border_crop" | "border-crop" => Ok(ImageSize::BorderCrop),
            other => Err(format!("unknown image size: {}", other)),
        }
    }
}

/// Where a resolved image URL came from. Variants are declared in
/// preference order, so `Ord` gives the tier ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceTier {
    /// Image map already embedded in the record
    Direct,
    /// Catalog lookup by stable identifier
    ById,
    /// Catalog lookup by set code and collector number
    BySetNumber,
    /// Catalog lookup by exact name
    ByNameExact,
    /// Catalog lookup by approximate name
    ByNameFuzzy,
    /// Legacy image service keyed by multiverse ID
    Legacy,
    /// Static card back
    Placeholder,
}

impl SourceTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceTier::Direct => "direct",
            SourceTier::ById => "by_id",
            SourceTier::BySetNumber => "by_set_number",
            SourceTier::ByNameExact => "by_name_exact",
            SourceTier::ByNameFuzzy => "by_name_fuzzy",
            SourceTier::Legacy => "legacy",
            SourceTier::Placeholder => "placeholder",
        }
    }
}

impl fmt::Display for SourceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct ImageUris {
    pub small: Option<String>,
    pub normal: Option<String>,
    pub large: Option<String>,
    pub png: Option<String>,
    pub art_crop: Option<String>,
    pub border_crop: Option<String>,
}

impl ImageUris {
    /// URL for exactly this size, ignoring blank strings
    pub fn get(&self, size: ImageSize) -> Option<&str> {
        let url = match size {
            ImageSize::Small => self.small.as_deref(),
            ImageSize::Normal => self.normal.as_deref(),
            ImageSize::Large => self.large.as_deref(),
            ImageSize::ArtCrop => self.art_crop.as_deref(),
            ImageSize::BorderCrop => self.border_crop.as_deref(),
        };
        url.filter(|u| !u.trim().is_empty())
    }

    /// URL for this size, or the closest substitute the map carries
    pub fn best_for(&self, size: ImageSize) -> Option<&str> {
        size.fallback_chain().iter().find_map(|s| self.get(*s))
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct CardFace {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub image_uris: Option<ImageUris>,
}

/// Pick an image from a top-level map, then from each face in order
/// (front face first for double-faced cards).
pub fn face_image<'a>(
    image_uris: Option<&'a ImageUris>,
    card_faces: Option<&'a [CardFace]>,
    size: ImageSize,
) -> Option<&'a str> {
    if let Some(url) = image_uris.and_then(|uris| uris.best_for(size)) {
        return Some(url);
    }
    card_faces?
        .iter()
        .filter_map(|face| face.image_uris.as_ref())
        .find_map(|uris| uris.best_for(size))
}

/// A sparse card record as handed in by listings, catalog rows or scans.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct CardRef {
    /// Scryfall UUID
    #[serde(default, alias = "id")]
    pub identifier: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default, alias = "set")]
    pub set_code: Option<String>,
    #[serde(default)]
    pub collector_number: Option<String>,
    /// Gatherer multiverse ID for the legacy image service
    #[serde(default)]
    pub multiverse_id: Option<u64>,
    #[serde(default)]
    pub image_uris: Option<ImageUris>,
    /// Alternate faces for double-faced cards
    #[serde(default)]
    pub card_faces: Option<Vec<CardFace>>,
    #[serde(default)]
    pub prices: Option<RawPrices>,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl CardRef {
    pub fn named(name: &str) -> Self {
        Self {
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    pub fn with_identifier(id: &str) -> Self {
        Self {
            identifier: Some(id.to_string()),
            ..Default::default()
        }
    }

    pub fn identifier(&self) -> Option<&str> {
        non_blank(&self.identifier)
    }

    pub fn name(&self) -> Option<&str> {
        non_blank(&self.name)
    }

    pub fn set_code(&self) -> Option<&str> {
        non_blank(&self.set_code)
    }

    pub fn collector_number(&self) -> Option<&str> {
        non_blank(&self.collector_number)
    }

    /// True when the record carries an identifier or a name
    pub fn has_identity(&self) -> bool {
        self.identifier().is_some() || self.name().is_some()
    }

    /// Stable cache identity. The identifier wins over the name; name-based
    /// identities include set and collector number so different printings
    /// do not share an entry.
    pub fn identity_key(&self) -> Option<String> {
        if let Some(id) = self.identifier() {
            return Some(format!("id:{}", id.to_lowercase()));
        }
        let name = self.name()?;
        let mut key = format!("name:{}", name.to_lowercase());
        if let Some(set) = self.set_code() {
            key.push('@');
            key.push_str(&set.to_lowercase());
        }
        if let Some(number) = self.collector_number() {
            key.push('#');
            key.push_str(number);
        }
        Some(key)
    }

    /// Image already embedded in the record, if any
    pub fn embedded_image(&self, size: ImageSize) -> Option<&str> {
        face_image(self.image_uris.as_ref(), self.card_faces.as_deref(), size)
    }
}

/// A resolved image URL together with the tier that produced it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageCandidate {
    pub url: String,
    pub tier: SourceTier,
    pub size: ImageSize,
}

impl ImageCandidate {
    pub fn is_placeholder(&self) -> bool {
        self.tier == SourceTier::Placeholder
    }
}
