//! Price normalisation into a target currency, with finish-aware lookups.

use std::sync::Arc;
use std::time::Duration;

use mtg_common::{Currency, Finish, RawPrices};
use serde::Serialize;

use super::exchange::ExchangeRateState;

/// Currencies a native price may be converted from, in preference order
const REFERENCE_CURRENCIES: [Currency; 2] = [Currency::Usd, Currency::Eur];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceQuote {
    pub native_amount: f64,
    pub native_currency: Currency,
    pub converted_amount: f64,
    pub converted_currency: Currency,
    pub rate_used: f64,
    pub rate_age: Duration,
}

fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

pub struct PriceNormalizer {
    rates: Arc<ExchangeRateState>,
    etched_multiplier: f64,
}

impl PriceNormalizer {
    pub fn new(rates: Arc<ExchangeRateState>, etched_multiplier: f64) -> Self {
        Self {
            rates,
            etched_multiplier,
        }
    }

    pub fn rates(&self) -> &Arc<ExchangeRateState> {
        &self.rates
    }

    /// Nonfoil quote in `target`. `None` means no usable price data.
    pub fn quote(&self, raw: &RawPrices, target: Currency) -> Option<PriceQuote> {
        self.quote_for(raw, Finish::Nonfoil, target)
    }

    /// A price already in `target` is used as-is. Otherwise the first
    /// reference currency with a price is converted at the current rate.
    /// Etched quotes fall back to the foil price scaled by the configured
    /// multiplier only when no currency lists an etched price.
    pub fn quote_for(&self, raw: &RawPrices, finish: Finish, target: Currency) -> Option<PriceQuote> {
        let listed = self.quote_listed(raw, finish, None, target);
        match finish {
            Finish::Etched => listed.or_else(|| {
                self.quote_listed(raw, Finish::Foil, Some(self.etched_multiplier), target)
            }),
            _ => listed,
        }
    }

    fn quote_listed(
        &self,
        raw: &RawPrices,
        finish: Finish,
        scale: Option<f64>,
        target: Currency,
    ) -> Option<PriceQuote> {
        let amount = |currency: Currency| {
            let amount = raw.amount(currency, finish)?;
            Some(match scale {
                Some(factor) => round_cents(amount * factor),
                None => amount,
            })
        };

        if let Some(amount) = amount(target) {
            return Some(PriceQuote {
                native_amount: amount,
                native_currency: target,
                converted_amount: amount,
                converted_currency: target,
                rate_used: 1.0,
                rate_age: Duration::ZERO,
            });
        }

        for source in REFERENCE_CURRENCIES.into_iter().filter(|c| *c != target) {
            let Some(amount) = amount(source) else {
                continue;
            };
            let Some((rate, age)) = self.rates.cross_rate(source, target) else {
                log::warn!("No {} to {} rate available", source, target);
                continue;
            };
            return Some(PriceQuote {
                native_amount: amount,
                native_currency: source,
                converted_amount: round_cents(amount * rate),
                converted_currency: target,
                rate_used: rate,
                rate_age: age,
            });
        }

        None
    }
}
