//! Raw price fields and currency codes

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Aud,
    Usd,
    Eur,
}

impl Currency {
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Aud => "AUD",
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AUD" => Ok(Currency::Aud),
            "USD" => Ok(Currency::Usd),
            "EUR" => Ok(Currency::Eur),
            other => Err(format!("unsupported currency: {}", other)),
        }
    }
}

/// Card finish a price applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Finish {
    #[default]
    Nonfoil,
    Foil,
    Etched,
}

impl FromStr for Finish {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nonfoil" | "normal" | "" => Ok(Finish::Nonfoil),
            "foil" => Ok(Finish::Foil),
            "etched" => Ok(Finish::Etched),
            other => Err(format!("unknown finish: {}", other)),
        }
    }
}

/// Price fields as they arrive from Scryfall (decimal strings) plus the
/// marketplace's own AUD listing prices.
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct RawPrices {
    #[serde(default)]
    pub aud: Option<String>,
    #[serde(default)]
    pub aud_foil: Option<String>,
    #[serde(default)]
    pub aud_etched: Option<String>,
    #[serde(default)]
    pub usd: Option<String>,
    #[serde(default)]
    pub usd_foil: Option<String>,
    #[serde(default)]
    pub usd_etched: Option<String>,
    #[serde(default)]
    pub eur: Option<String>,
    #[serde(default)]
    pub eur_foil: Option<String>,
    #[serde(default)]
    pub eur_etched: Option<String>,
}

fn parse_amount(field: &Option<String>) -> Option<f64> {
    let raw = field.as_deref()?.trim();
    if raw.is_empty() {
        return None;
    }
    match raw.parse::<f64>() {
        Ok(amount) if amount.is_finite() && amount >= 0.0 => Some(amount),
        _ => {
            log::debug!("Ignoring unparsable price field: {:?}", raw);
            None
        }
    }
}

impl RawPrices {
    /// Parsed amount for one currency/finish field, if present and valid
    pub fn amount(&self, currency: Currency, finish: Finish) -> Option<f64> {
        let field = match (currency, finish) {
            (Currency::Aud, Finish::Nonfoil) => &self.aud,
            (Currency::Aud, Finish::Foil) => &self.aud_foil,
            (Currency::Aud, Finish::Etched) => &self.aud_etched,
            (Currency::Usd, Finish::Nonfoil) => &self.usd,
            (Currency::Usd, Finish::Foil) => &self.usd_foil,
            (Currency::Usd, Finish::Etched) => &self.usd_etched,
            (Currency::Eur, Finish::Nonfoil) => &self.eur,
            (Currency::Eur, Finish::Foil) => &self.eur_foil,
            (Currency::Eur, Finish::Etched) => &self.eur_etched,
        };
        parse_amount(field)
    }

    pub fn is_empty(&self) -> bool {
        [Currency::Aud, Currency::Usd, Currency::Eur]
            .iter()
            .all(|c| {
                [Finish::Nonfoil, Finish::Foil, Finish::Etched]
                    .iter()
                    .all(|f| self.amount(*c, *f).is_none())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_scryfall_prices_with_nulls() {
        let json = r#"{ "usd": "2.00", "usd_foil": null, "eur": "1.50", "tix": "0.02" }"#;
        let prices: RawPrices = serde_json::from_str(json).unwrap();
        assert_eq!(prices.amount(Currency::Usd, Finish::Nonfoil), Some(2.0));
        assert_eq!(prices.amount(Currency::Usd, Finish::Foil), None);
        assert_eq!(prices.amount(Currency::Eur, Finish::Nonfoil), Some(1.5));
    }

    #[test]
    fn garbage_and_negative_amounts_are_absent() {
        let prices = RawPrices {
            aud: Some("n/a".to_string()),
            usd: Some("-3.00".to_string()),
            eur: Some("".to_string()),
            ..Default::default()
        };
        assert_eq!(prices.amount(Currency::Aud, Finish::Nonfoil), None);
        assert_eq!(prices.amount(Currency::Usd, Finish::Nonfoil), None);
        assert_eq!(prices.amount(Currency::Eur, Finish::Nonfoil), None);
        assert!(prices.is_empty());
    }

    #[test]
    fn currency_round_trips_codes() {
        assert_eq!("aud".parse::<Currency>().unwrap(), Currency::Aud);
        assert_eq!(Currency::Eur.to_string(), "EUR");
        assert!("GBP".parse::<Currency>().is_err());
    }

    #[test]
    fn finish_parses_aliases() {
        assert_eq!("normal".parse::<Finish>().unwrap(), Finish::Nonfoil);
        assert_eq!("Etched".parse::<Finish>().unwrap(), Finish::Etched);
    }
}
