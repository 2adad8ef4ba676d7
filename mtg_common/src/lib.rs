//! MTG Common - shared card types
//!
//! Card references, Scryfall response models, raw price fields and the
//! catalog error type used by the resolver crates.

pub mod card;
pub mod error;
pub mod prices;
pub mod scryfall;

pub use card::{CardFace, CardRef, ImageCandidate, ImageSize, ImageUris, SourceTier};
pub use error::{CatalogError, CatalogResult};
pub use prices::{Currency, Finish, RawPrices};
pub use scryfall::ScryfallCard;
