pub mod coingecko_mapping;
pub use coingecko_mapping::*;
