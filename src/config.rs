use std::{str::FromStr, time::Duration};

use clap::Parser;
use rust_decimal::Decimal;

use crate::{
    api::{CoinGeckoConfig, RateLimitPolicy, StaticPriceSource, API_COINGECKO_ENDPOINT},
    structs::AssetId,
};

/* Command line arguments. Every option can also be given through the environment (a `.env` file is loaded first). */
#[derive(Debug, Clone, Parser)]
#[command(name = "cryptofolio", version, about = "Simulated cryptocurrency portfolio tracker")]
pub struct Args {
    /// Base url of the CoinGecko API
    #[arg(long, env = "COINGECKO_API_URL", default_value = API_COINGECKO_ENDPOINT)]
    pub api_url: String,

    /// Reference currency of every price
    #[arg(long, env = "VS_CURRENCY", default_value = "usd")]
    pub vs_currency: String,

    /// Minimum delay between two API requests
    #[arg(long, env = "RATE_LIMIT_DELAY_MS", default_value_t = 1500)]
    pub rate_limit_delay_ms: u64,

    #[arg(long, env = "MAX_RETRIES", default_value_t = 3)]
    pub max_retries: u32,

    /// Wait before the first retry, doubled on each following one
    #[arg(long, env = "BACKOFF_BASE_MS", default_value_t = 2000)]
    pub backoff_base_ms: u64,

    #[arg(long, env = "REQUEST_TIMEOUT_SECS", default_value_t = 10)]
    pub request_timeout_secs: u64,

    /// Number of coins shown in the market table
    #[arg(long, env = "MARKET_LIMIT", default_value_t = 10, value_parser = clap::value_parser!(u32).range(1..=250))]
    pub market_limit: u32,

    /// Where the transaction history is exported as CSV
    #[arg(long, env = "EXPORT_PATH", default_value = ".data/history.csv")]
    pub export_path: String,

    /// Don't call the API, use the prices given with --price
    #[arg(long)]
    pub offline: bool,

    /// Fixed price used in offline mode, e.g. --price bitcoin=65000 (repeatable)
    #[arg(long = "price", value_name = "ID=PRICE", value_parser = parse_price)]
    pub prices: Vec<(AssetId, Decimal)>,
}

impl Args {
    pub fn rate_limit_policy(&self) -> RateLimitPolicy {
        RateLimitPolicy {
            min_interval: Duration::from_millis(self.rate_limit_delay_ms),
            max_retries: self.max_retries,
            backoff_base: Duration::from_millis(self.backoff_base_ms),
            ..RateLimitPolicy::default()
        }
    }

    pub fn coingecko_config(&self) -> CoinGeckoConfig {
        CoinGeckoConfig {
            base_url: self.api_url.clone(),
            vs_currency: self.vs_currency.clone(),
            timeout: Duration::from_secs(self.request_timeout_secs),
            policy: self.rate_limit_policy(),
        }
    }

    pub fn static_prices(&self) -> StaticPriceSource {
        self.prices
            .iter()
            .fold(StaticPriceSource::new(), |source, (id, price)| {
                source.with_price(id.clone(), *price)
            })
    }
}

fn parse_price(raw: &str) -> Result<(AssetId, Decimal), String> {
    let (id, price) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected ID=PRICE, got '{raw}'"))?;
    let id = AssetId::new(id).map_err(|e| e.to_string())?;
    let price = Decimal::from_str(price.trim()).map_err(|e| e.to_string())?;
    if price <= Decimal::ZERO {
        return Err(format!("price must be positive, got {price}"));
    }
    Ok((id, price))
}
