//! Price normalisation into a target currency

mod exchange;
mod normalizer;

pub use exchange::{refresh_once, ExchangeRateState, HttpRateSource, RateRefresher, RateSource};
pub use normalizer::{PriceNormalizer, PriceQuote};
