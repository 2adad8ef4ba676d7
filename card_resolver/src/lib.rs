//! Card Resolver - MTG card images and prices
//!
//! Resolves a usable image URL for sparse card records through a chain of
//! sources (embedded map, Scryfall by id, set/number and name, Gatherer,
//! placeholder) with caching and deduplication of in-flight lookups, and
//! normalises raw card prices into a target currency.

pub mod config;
pub mod error;
pub mod governor;
pub mod image_cache;
pub mod pipeline;
pub mod price;
pub mod providers;
pub mod resolver;
pub mod scryfall;
pub mod validation;

pub use config::{PriceConfig, ResolverConfig};
pub use error::{ResolverError, Result};
pub use image_cache::CacheStats;
pub use pipeline::{ImagePipeline, ResolveOptions};
pub use price::{PriceNormalizer, PriceQuote};
pub use resolver::CardResolver;
