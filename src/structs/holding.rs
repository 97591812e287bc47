use rust_decimal::Decimal;
use serde::Serialize;

use super::AssetId;
use crate::errors::LedgerError;

/* Current position in one asset: quantity held and the weighted-average unit price paid for it.
Holdings are only built by the ledger through `open` and `with_purchase`: the quantity is strictly positive
and quantity × average_cost always fits in a Decimal. */
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Holding {
    pub(crate) asset_id: AssetId,
    pub(crate) quantity: Decimal,
    pub(crate) average_cost: Decimal,
}

impl Holding {
    pub(crate) fn open(
        asset_id: AssetId,
        quantity: Decimal,
        unit_price: Decimal,
    ) -> Result<Self, LedgerError> {
        quantity
            .checked_mul(unit_price)
            .ok_or_else(|| LedgerError::overflow(format!("cost basis of {asset_id}")))?;
        Ok(Self {
            asset_id,
            quantity,
            average_cost: unit_price,
        })
    }

    /* The holding after a purchase, weighted average of the previous cost and the new one. `self` is left
    untouched so the caller only commits once everything is computed. */
    pub(crate) fn with_purchase(
        &self,
        quantity: Decimal,
        unit_price: Decimal,
    ) -> Result<Self, LedgerError> {
        let overflow = || LedgerError::overflow(format!("average cost of {}", self.asset_id));

        let total_quantity = self.quantity.checked_add(quantity).ok_or_else(overflow)?;
        let bought = quantity.checked_mul(unit_price).ok_or_else(overflow)?;
        let total_cost = self
            .cost_basis()
            .checked_add(bought)
            .ok_or_else(overflow)?;
        let average_cost = total_cost
            .checked_div(total_quantity)
            .ok_or_else(overflow)?;
        // Rounding of the average may push the product past the total cost
        total_quantity
            .checked_mul(average_cost)
            .ok_or_else(overflow)?;

        Ok(Self {
            asset_id: self.asset_id.clone(),
            quantity: total_quantity,
            average_cost,
        })
    }

    pub fn asset_id(&self) -> &AssetId {
        &self.asset_id
    }

    pub fn quantity(&self) -> Decimal {
        self.quantity
    }

    pub fn average_cost(&self) -> Decimal {
        self.average_cost
    }

    pub fn cost_basis(&self) -> Decimal {
        self.quantity * self.average_cost
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn pow10(exp: u32) -> Decimal {
        Decimal::from_i128_with_scale(10_i128.pow(exp), 0)
    }

    fn btc() -> AssetId {
        AssetId::new("btc").unwrap()
    }

    #[test]
    fn test_purchase_recomputes_average() {
        let holding = Holding::open(btc(), dec!(1), dec!(100)).unwrap();
        let holding = holding.with_purchase(dec!(3), dec!(200)).unwrap();
        assert_eq!(holding.quantity(), dec!(4));
        assert_eq!(holding.average_cost(), dec!(175));
        assert_eq!(holding.cost_basis(), dec!(700));
    }

    #[test]
    fn test_overflowing_purchase() {
        assert!(matches!(
            Holding::open(btc(), Decimal::MAX, dec!(2)),
            Err(LedgerError::Overflow { .. })
        ));

        let holding = Holding::open(btc(), pow10(15), pow10(13)).unwrap();
        let err = holding.with_purchase(dec!(1), Decimal::MAX).unwrap_err();
        assert!(matches!(err, LedgerError::Overflow { .. }));
        assert_eq!(holding.quantity(), pow10(15));
    }
}
