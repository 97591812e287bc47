/* This is used to get the current price of assets, whatever the provider behind it.

The ledger never calls a PriceSource itself: the caller resolves the prices first and hands them over,
which keeps the accounting deterministic and testable without network access.
*/

use rust_decimal::Decimal;

use crate::{
    errors::ApiError,
    structs::{AssetId, PriceMap},
};

pub trait PriceSource {
    /* Current unit price of each asset in the reference currency. The result may be partial:
    an id missing from the map means "price unknown", never "price is zero". */
    fn resolve(&self, asset_ids: &[AssetId]) -> Result<PriceMap, ApiError>;

    fn resolve_one(&self, asset_id: &AssetId) -> Result<Option<Decimal>, ApiError> {
        let prices = self.resolve(std::slice::from_ref(asset_id))?;
        Ok(prices.get(asset_id).copied())
    }
}

/* Fixed prices held in memory: used offline and in tests */
#[derive(Debug, Clone, Default)]
pub struct StaticPriceSource {
    prices: PriceMap,
}

impl StaticPriceSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_price(mut self, asset_id: AssetId, price: Decimal) -> Self {
        self.prices.insert(asset_id, price);
        self
    }

    pub fn set_price(&mut self, asset_id: AssetId, price: Decimal) {
        self.prices.insert(asset_id, price);
    }
}

impl PriceSource for StaticPriceSource {
    fn resolve(&self, asset_ids: &[AssetId]) -> Result<PriceMap, ApiError> {
        Ok(asset_ids
            .iter()
            .filter_map(|id| self.prices.get(id).map(|price| (id.clone(), *price)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    #[test]
    fn test_static_source_is_partial() {
        let btc = AssetId::new("bitcoin").unwrap();
        let eth = AssetId::new("ethereum").unwrap();
        let source = StaticPriceSource::new().with_price(btc.clone(), dec!(60000));

        let prices = source.resolve(&[btc.clone(), eth.clone()]).unwrap();
        assert_eq!(prices.len(), 1);
        assert_eq!(prices.get(&btc), Some(&dec!(60000)));
        assert!(!prices.contains_key(&eth));

        assert_eq!(source.resolve_one(&eth).unwrap(), None);
        assert!(source.resolve(&[]).unwrap().is_empty());
    }
}
