use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;

use crate::{
    errors::LedgerError,
    structs::{AssetId, PortfolioLedger, TransactionKind, Valuation},
};

/* Aggregated profit/loss figures of a portfolio: realized on past sells, unrealized on what is still held */
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortfolioSummary {
    pub buy_count: usize,
    pub sell_count: usize,
    pub total_invested: Decimal, // Sum paid on buys
    pub total_proceeds: Decimal, // Sum received on sells
    pub realized_profit: Decimal,
    pub unrealized_profit: Decimal, // Priced holdings only
    pub total_profit: Decimal,
    pub total_value: Decimal,
    pub unpriced: Vec<AssetId>,
}

impl PortfolioSummary {
    /* Fails with Overflow when one of the totals does not fit in a Decimal */
    pub fn from_ledger(ledger: &PortfolioLedger, valuation: &Valuation) -> Result<Self, LedgerError> {
        let mut buy_count = 0;
        let mut sell_count = 0;
        let mut total_invested = dec!(0);
        let mut total_proceeds = dec!(0);
        let mut realized_profit = dec!(0);

        for tx in ledger.history() {
            let overflow = || LedgerError::overflow(format!("totals at transaction {}", tx.id()));
            let notional = tx.notional().ok_or_else(overflow)?;
            match tx.kind() {
                TransactionKind::Buy => {
                    buy_count += 1;
                    total_invested = total_invested.checked_add(notional).ok_or_else(overflow)?;
                }
                TransactionKind::Sell => {
                    sell_count += 1;
                    total_proceeds = total_proceeds.checked_add(notional).ok_or_else(overflow)?;
                    realized_profit = realized_profit
                        .checked_add(tx.realized_profit())
                        .ok_or_else(overflow)?;
                }
            }
        }
        let total_profit = realized_profit
            .checked_add(valuation.unrealized_profit)
            .ok_or_else(|| LedgerError::overflow("total profit"))?;

        Ok(Self {
            buy_count,
            sell_count,
            total_invested,
            total_proceeds,
            realized_profit,
            unrealized_profit: valuation.unrealized_profit,
            total_profit,
            total_value: valuation.total_value,
            unpriced: valuation.unpriced.clone(),
        })
    }
}
