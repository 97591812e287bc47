use hashbrown::HashMap;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::{
    errors::ApiError,
    structs::{AssetId, CoinDetails, MarketCoin, PriceMap, PricePoint},
    utils::millis_to_datetime_utc,
};

/* Raw payloads of the CoinGecko API and their mapping into the crate's records.
Only the fields we use are declared, serde ignores the rest. */

/* simple/price: {"bitcoin": {"usd": 67187.12}, ...} */
pub type RawSimplePrices = HashMap<String, HashMap<String, Option<Decimal>>>;

/* coins/markets */
#[derive(Debug, Deserialize)]
pub struct RawMarketCoin {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub current_price: Option<Decimal>,
    pub market_cap: Option<Decimal>,
    pub market_cap_rank: Option<u32>,
    pub total_volume: Option<Decimal>,
    pub high_24h: Option<Decimal>,
    pub low_24h: Option<Decimal>,
    pub price_change_percentage_24h: Option<Decimal>,
    pub price_change_percentage_7d_in_currency: Option<Decimal>,
}

/* coins/{id} */
#[derive(Debug, Deserialize)]
pub struct RawCoinDetails {
    pub id: String,
    pub symbol: String,
    pub name: String,
    #[serde(default)]
    pub description: HashMap<String, Option<String>>,
    #[serde(default)]
    pub market_data: Option<RawCoinMarketData>,
    #[serde(default)]
    pub links: Option<RawLinks>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawCoinMarketData {
    #[serde(default)]
    pub current_price: HashMap<String, Option<Decimal>>,
    #[serde(default)]
    pub market_cap: HashMap<String, Option<Decimal>>,
    #[serde(default)]
    pub total_volume: HashMap<String, Option<Decimal>>,
    pub price_change_percentage_24h: Option<Decimal>,
    #[serde(default)]
    pub ath: HashMap<String, Option<Decimal>>,
    #[serde(default)]
    pub atl: HashMap<String, Option<Decimal>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RawLinks {
    #[serde(default)]
    pub homepage: Vec<String>,
}

/* coins/{id}/market_chart: {"prices": [[1711843200000, 69702.31], ...], ...} */
#[derive(Debug, Deserialize)]
pub struct RawMarketChart {
    #[serde(default)]
    pub prices: Vec<(f64, Option<Decimal>)>,
}

/* Keep only the positive prices quoted in `vs_currency`. Ids that are not valid asset ids are skipped. */
pub fn map_simple_prices(raw: RawSimplePrices, vs_currency: &str) -> PriceMap {
    raw.into_iter()
        .filter_map(|(id, quotes)| {
            let price = quotes.get(vs_currency).copied().flatten()?;
            if price <= Decimal::ZERO {
                return None;
            }
            let id = AssetId::new(&id).ok()?;
            Some((id, price))
        })
        .collect()
}

pub fn map_market_coins(raw: Vec<RawMarketCoin>) -> Vec<MarketCoin> {
    raw.into_iter()
        .filter_map(|coin| {
            let id = AssetId::new(&coin.id).ok()?;
            Some(MarketCoin {
                id,
                symbol: coin.symbol.to_uppercase(),
                name: coin.name,
                current_price: coin.current_price,
                market_cap: coin.market_cap,
                market_cap_rank: coin.market_cap_rank,
                total_volume: coin.total_volume,
                high_24h: coin.high_24h,
                low_24h: coin.low_24h,
                change_24h: coin.price_change_percentage_24h,
                change_7d: coin.price_change_percentage_7d_in_currency,
            })
        })
        .collect()
}

pub fn map_coin_details(raw: RawCoinDetails, vs_currency: &str) -> Result<CoinDetails, ApiError> {
    let id = AssetId::new(&raw.id).map_err(|e| ApiError::Deserialization(e.to_string()))?;
    let market = raw.market_data.unwrap_or_default();
    let quote = |map: &HashMap<String, Option<Decimal>>| map.get(vs_currency).copied().flatten();

    Ok(CoinDetails {
        id,
        symbol: raw.symbol.to_uppercase(),
        name: raw.name,
        description: raw
            .description
            .get("en")
            .cloned()
            .flatten()
            .filter(|d| !d.trim().is_empty())
            .unwrap_or_else(|| "No description available".to_string()),
        current_price: quote(&market.current_price),
        market_cap: quote(&market.market_cap),
        total_volume: quote(&market.total_volume),
        change_24h: market.price_change_percentage_24h,
        all_time_high: quote(&market.ath),
        all_time_low: quote(&market.atl),
        homepage: raw
            .links
            .and_then(|links| links.homepage.into_iter().find(|h| !h.is_empty())),
    })
}

/* Points with a null price or an out of range timestamp are dropped */
pub fn map_market_chart(raw: RawMarketChart) -> Vec<PricePoint> {
    raw.prices
        .into_iter()
        .filter_map(|(millis, price)| {
            Some(PricePoint {
                timestamp: millis_to_datetime_utc(millis)?,
                price: price?,
            })
        })
        .collect()
}
