use rust_decimal::Decimal;
use serde::Serialize;

use super::AssetId;

/* Value of a single holding at the prices handed to the valuation. `price` is None when no price was
available for the asset; its `value` is then zero and the asset is also listed in `Valuation::unpriced`. */
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PositionValue {
    pub asset_id: AssetId,
    pub quantity: Decimal,
    pub average_cost: Decimal,
    pub price: Option<Decimal>,
    pub value: Decimal,
    pub cost_basis: Decimal,
    pub unrealized_profit: Option<Decimal>, // None when unpriced
}

/* Result of PortfolioLedger::valuation. A total computed with missing prices is never presented as
complete: check `is_complete` or `unpriced`. */
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Valuation {
    pub total_value: Decimal,
    pub total_cost_basis: Decimal, // Priced positions only, so it compares with total_value
    pub unrealized_profit: Decimal,
    pub positions: Vec<PositionValue>, // Sorted by asset id
    pub unpriced: Vec<AssetId>,
}

impl Valuation {
    pub fn is_complete(&self) -> bool {
        self.unpriced.is_empty()
    }

    pub fn position(&self, asset_id: &AssetId) -> Option<&PositionValue> {
        self.positions.iter().find(|p| &p.asset_id == asset_id)
    }
}
