//! Card Resolver CLI
//!
//! Resolve a card image or quote a card price from the shell, using the
//! same pipeline the marketplace handlers use.

use std::time::Duration;

use card_resolver::{CardResolver, PriceConfig, ResolveOptions, ResolverConfig};
use clap::{Parser, Subcommand};
use mtg_common::{CardRef, Currency, Finish, ImageSize, RawPrices};

/// MTG card image and price resolver
#[derive(Parser, Debug)]
#[command(name = "card_resolver")]
#[command(version, about, long_about = None)]
struct Args {
    /// Scryfall-compatible catalog base URL
    #[arg(long, default_value = card_resolver::config::DEFAULT_CATALOG_URL)]
    catalog_url: String,

    /// Per-request timeout for catalog lookups, in milliseconds
    #[arg(long, default_value_t = 2000)]
    timeout_ms: u64,

    /// Minimum spacing between catalog requests, in milliseconds
    #[arg(long, default_value_t = 100)]
    interval_ms: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve an image URL for a card
    Image {
        /// Card name
        #[arg(long)]
        name: Option<String>,
        /// Scryfall card UUID
        #[arg(long)]
        id: Option<String>,
        /// Set code (e.g. lea)
        #[arg(long)]
        set: Option<String>,
        /// Collector number within the set
        #[arg(long)]
        number: Option<String>,
        /// Gatherer multiverse ID
        #[arg(long)]
        multiverse_id: Option<u64>,
        /// small, normal, large, art_crop or border_crop
        #[arg(long, default_value = "normal")]
        size: ImageSize,
        /// Load-test each candidate before accepting it
        #[arg(long, default_value_t = false)]
        validate: bool,
    },
    /// Quote a price in the target currency
    Price {
        #[arg(long)]
        aud: Option<String>,
        #[arg(long)]
        usd: Option<String>,
        #[arg(long)]
        eur: Option<String>,
        /// nonfoil, foil or etched (amounts are read into that finish's fields)
        #[arg(long, default_value = "nonfoil")]
        finish: Finish,
        #[arg(long, default_value = "AUD")]
        target: Currency,
        /// Exchange rate endpoint (USD base)
        #[arg(long, default_value = card_resolver::config::DEFAULT_RATES_URL)]
        rates_url: String,
    },
}

fn raw_prices(finish: Finish, aud: Option<String>, usd: Option<String>, eur: Option<String>) -> RawPrices {
    let mut prices = RawPrices::default();
    match finish {
        Finish::Nonfoil => {
            prices.aud = aud;
            prices.usd = usd;
            prices.eur = eur;
        }
        Finish::Foil => {
            prices.aud_foil = aud;
            prices.usd_foil = usd;
            prices.eur_foil = eur;
        }
        Finish::Etched => {
            prices.aud_etched = aud;
            prices.usd_etched = usd;
            prices.eur_etched = eur;
        }
    }
    prices
}

#[tokio::main]
async fn main() {
    // Set RUST_LOG to control log level, e.g. RUST_LOG=card_resolver=debug
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    let config = ResolverConfig {
        catalog_base_url: args.catalog_url,
        request_timeout: Duration::from_millis(args.timeout_ms),
        min_interval: Duration::from_millis(args.interval_ms),
        ..Default::default()
    };

    match args.command {
        Command::Image {
            name,
            id,
            set,
            number,
            multiverse_id,
            size,
            validate,
        } => {
            let price_config = PriceConfig {
                refresh_interval: None,
                ..Default::default()
            };
            let resolver = match CardResolver::new(config, price_config) {
                Ok(resolver) => resolver,
                Err(e) => {
                    log::error!("Failed to start resolver: {}", e);
                    std::process::exit(1);
                }
            };

            let card = CardRef {
                identifier: id,
                name,
                set_code: set,
                collector_number: number,
                multiverse_id,
                ..Default::default()
            };
            let options = ResolveOptions {
                validate,
                force_refresh: false,
            };
            let image = resolver.resolve_image_detailed(&card, size, options).await;
            println!("{}\t{}", image.tier, image.url);
        }
        Command::Price {
            aud,
            usd,
            eur,
            finish,
            target,
            rates_url,
        } => {
            let price_config = PriceConfig {
                rates_url,
                refresh_interval: None,
                ..Default::default()
            };
            let resolver = match CardResolver::new(config, price_config) {
                Ok(resolver) => resolver,
                Err(e) => {
                    log::error!("Failed to start resolver: {}", e);
                    std::process::exit(1);
                }
            };

            if !resolver.refresh_rates().await {
                log::warn!("Using fallback exchange rates");
            }

            let prices = raw_prices(finish, aud, usd, eur);
            match resolver.quote_price_for(&prices, finish, target) {
                Some(quote) => println!(
                    "{:.2} {} (from {:.2} {} at {:.4})",
                    quote.converted_amount,
                    quote.converted_currency,
                    quote.native_amount,
                    quote.native_currency,
                    quote.rate_used
                ),
                None => {
                    println!("price unavailable");
                    std::process::exit(2);
                }
            }
        }
    }
}
