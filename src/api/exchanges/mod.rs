pub mod coingecko_api;
pub use coingecko_api::*;

pub mod rate_limit;
pub use rate_limit::*;
