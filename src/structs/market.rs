use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::AssetId;

/* One row of the market listing (coins ordered by market cap) */
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketCoin {
    pub id: AssetId,
    pub symbol: String, // Upper case ticker, e.g. "BTC"
    pub name: String,
    pub current_price: Option<Decimal>,
    pub market_cap: Option<Decimal>,
    pub market_cap_rank: Option<u32>,
    pub total_volume: Option<Decimal>,
    pub high_24h: Option<Decimal>,
    pub low_24h: Option<Decimal>,
    pub change_24h: Option<Decimal>, // Percentage
    pub change_7d: Option<Decimal>,  // Percentage
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinDetails {
    pub id: AssetId,
    pub symbol: String,
    pub name: String,
    pub description: String,
    pub current_price: Option<Decimal>,
    pub market_cap: Option<Decimal>,
    pub total_volume: Option<Decimal>,
    pub change_24h: Option<Decimal>,
    pub all_time_high: Option<Decimal>,
    pub all_time_low: Option<Decimal>,
    pub homepage: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub price: Decimal,
}

/* Best and worst 24h performers of a market listing */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarketSummary {
    pub top_gainer: MarketCoin,
    pub top_loser: MarketCoin,
}

impl MarketSummary {
    /* Coins without a 24h change are ignored. None when no coin has one. */
    pub fn from_coins(coins: &[MarketCoin]) -> Option<Self> {
        let with_change = || coins.iter().filter(|c| c.change_24h.is_some());
        let top_gainer = with_change().max_by_key(|c| c.change_24h)?;
        let top_loser = with_change().min_by_key(|c| c.change_24h)?;
        Some(Self {
            top_gainer: top_gainer.clone(),
            top_loser: top_loser.clone(),
        })
    }
}

pub fn summarize_market(coins: &[MarketCoin]) -> Option<MarketSummary> {
    MarketSummary::from_coins(coins)
}
