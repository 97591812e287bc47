use std::time::Duration;

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use tokio::{runtime::Runtime, time::sleep};
use tracing::{debug, warn};

use crate::{
    api::{
        map_coin_details, map_market_chart, map_market_coins, map_simple_prices, parse_retry_after,
        PriceSource, RateLimitPolicy, RateLimiter, RawCoinDetails, RawMarketChart, RawMarketCoin,
        RawSimplePrices,
    },
    errors::ApiError,
    structs::{AssetId, CoinDetails, MarketCoin, PriceMap, PricePoint},
};

pub const API_COINGECKO_ENDPOINT: &str = "https://api.coingecko.com/api/v3";

#[derive(Debug, Clone)]
pub struct CoinGeckoConfig {
    pub base_url: String,
    pub vs_currency: String, // Reference currency of every price, e.g. "usd"
    pub timeout: Duration,
    pub policy: RateLimitPolicy,
}

impl Default for CoinGeckoConfig {
    fn default() -> Self {
        Self {
            base_url: API_COINGECKO_ENDPOINT.to_string(),
            vs_currency: "usd".to_string(),
            timeout: Duration::from_secs(10),
            policy: RateLimitPolicy::default(),
        }
    }
}

/* Client of the public CoinGecko API (no key needed).

The interface is synchronous: the client owns one tokio runtime, reused across calls, and blocks on it.
It must therefore not be called from inside another tokio runtime.
*/
pub struct CoinGeckoClient {
    base_url: String,
    vs_currency: String,
    http: reqwest::Client,
    runtime: Runtime,
    policy: RateLimitPolicy,
    limiter: RateLimiter,
}

impl CoinGeckoClient {
    pub const MAX_PER_PAGE: u32 = 250;
    pub const MAX_HISTORY_DAYS: u32 = 365;

    pub fn new(config: CoinGeckoConfig) -> Result<Self, ApiError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("cryptofolio/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| ApiError::Request {
                url: config.base_url.clone(),
                source,
            })?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| ApiError::Runtime(e.to_string()))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            vs_currency: config.vs_currency.trim().to_ascii_lowercase(),
            http,
            runtime,
            limiter: RateLimiter::new(config.policy.min_interval),
            policy: config.policy,
        })
    }

    pub fn vs_currency(&self) -> &str {
        &self.vs_currency
    }

    pub fn current_prices(&self, asset_ids: &[AssetId]) -> Result<PriceMap, ApiError> {
        if asset_ids.is_empty() {
            return Ok(PriceMap::new());
        }
        let ids = asset_ids
            .iter()
            .map(AssetId::as_str)
            .collect::<Vec<&str>>()
            .join(",");
        let params = [("ids", ids), ("vs_currencies", self.vs_currency.clone())];

        let raw: RawSimplePrices = self.runtime.block_on(self.fetch_json("simple/price", &params))?;
        Ok(map_simple_prices(raw, &self.vs_currency))
    }

    /* Coins ordered by market cap, `per_page` in 1..=250 */
    pub fn market_data(&self, page: u32, per_page: u32) -> Result<Vec<MarketCoin>, ApiError> {
        if !(1..=Self::MAX_PER_PAGE).contains(&per_page) {
            return Err(ApiError::InvalidArgument(format!(
                "per_page must be in 1 - {}, got {per_page}",
                Self::MAX_PER_PAGE
            )));
        }
        if page == 0 {
            return Err(ApiError::InvalidArgument("page starts at 1".to_string()));
        }
        let params = [
            ("vs_currency", self.vs_currency.clone()),
            ("order", "market_cap_desc".to_string()),
            ("per_page", per_page.to_string()),
            ("page", page.to_string()),
            ("sparkline", "false".to_string()),
            ("price_change_percentage", "24h,7d".to_string()),
        ];

        let raw: Vec<RawMarketCoin> = self.runtime.block_on(self.fetch_json("coins/markets", &params))?;
        Ok(map_market_coins(raw))
    }

    pub fn coin_details(&self, asset_id: &AssetId) -> Result<CoinDetails, ApiError> {
        let params = [
            ("localization", "false".to_string()),
            ("tickers", "false".to_string()),
            ("community_data", "false".to_string()),
            ("developer_data", "false".to_string()),
        ];
        let path = format!("coins/{asset_id}");

        let raw: RawCoinDetails = self.runtime.block_on(self.fetch_json(&path, &params))?;
        map_coin_details(raw, &self.vs_currency)
    }

    /* Daily or finer price points over the last `days` days, `days` in 1..=365 */
    pub fn historical_prices(
        &self,
        asset_id: &AssetId,
        days: u32,
    ) -> Result<Vec<PricePoint>, ApiError> {
        if !(1..=Self::MAX_HISTORY_DAYS).contains(&days) {
            return Err(ApiError::InvalidArgument(format!(
                "days must be in 1 - {}, got {days}",
                Self::MAX_HISTORY_DAYS
            )));
        }
        let params = [
            ("vs_currency", self.vs_currency.clone()),
            ("days", days.to_string()),
        ];
        let path = format!("coins/{asset_id}/market_chart");

        let raw: RawMarketChart = self.runtime.block_on(self.fetch_json(&path, &params))?;
        Ok(map_market_chart(raw))
    }

    fn build_url(&self, path: &str, params: &[(&str, String)]) -> String {
        let encoded = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())))
            .finish();
        if encoded.is_empty() {
            format!("{}/{path}", self.base_url)
        } else {
            format!("{}/{path}?{encoded}", self.base_url)
        }
    }

    /* GET with the rate limit applied. 429, 5xx, timeouts and connection errors are retried with backoff
    up to `max_retries` times. Other failures are returned right away. */
    async fn fetch_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let url = self.build_url(path, params);
        let mut attempt: u32 = 0;

        loop {
            self.limiter.wait_turn().await;
            debug!(%url, attempt, "coingecko request");

            let response = match self.http.get(&url).send().await {
                Ok(response) => response,
                Err(source) if (source.is_timeout() || source.is_connect()) && self.policy.can_retry(attempt) => {
                    let wait = self.policy.backoff(attempt, None);
                    warn!(%url, error = %source, wait_ms = wait.as_millis() as u64, "request failed, retrying");
                    sleep(wait).await;
                    attempt += 1;
                    continue;
                }
                Err(source) => return Err(ApiError::Request { url, source }),
            };

            let status = response.status();
            if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                if !self.policy.can_retry(attempt) {
                    if status == StatusCode::TOO_MANY_REQUESTS {
                        return Err(ApiError::RateLimited { retries: attempt });
                    }
                    return Err(ApiError::Status {
                        url,
                        status: status.as_u16(),
                    });
                }
                let retry_after = parse_retry_after(response.headers());
                let wait = self.policy.backoff(attempt, retry_after);
                warn!(%url, status = status.as_u16(), wait_ms = wait.as_millis() as u64, "rate limited or server error, retrying");
                sleep(wait).await;
                attempt += 1;
                continue;
            }
            if !status.is_success() {
                return Err(ApiError::Status {
                    url,
                    status: status.as_u16(),
                });
            }

            let text = response
                .text()
                .await
                .map_err(|source| ApiError::Request {
                    url: url.clone(),
                    source,
                })?;
            return Ok(serde_json::from_str(&text)?);
        }
    }
}

impl PriceSource for CoinGeckoClient {
    fn resolve(&self, asset_ids: &[AssetId]) -> Result<PriceMap, ApiError> {
        self.current_prices(asset_ids)
    }
}
