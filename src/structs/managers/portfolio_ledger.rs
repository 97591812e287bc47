use chrono::{DateTime, Utc};
use hashbrown::HashMap;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::{
    errors::LedgerError,
    structs::{
        AssetId, Holding, PositionValue, PriceMap, Transaction, TransactionId, TransactionKind,
        Valuation,
    },
    utils::checked_sum,
};

/* The portfolio accounting engine. It owns the holdings per asset and the append-only history of transactions.

Prices are always handed in by the caller: the ledger never fetches anything, never logs and never prints.
Every mutation is all-or-nothing: arguments are validated before anything is touched, so a failing
buy or sell leaves both the holdings and the history exactly as they were.

The ledger is a pure function of its history: replaying the history (see functions::replay) rebuilds the same holdings.
*/
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortfolioLedger {
    holdings: HashMap<AssetId, Holding>, // Never contains a zero quantity entry
    history: Vec<Transaction>,
}

impl PortfolioLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn buy(
        &mut self,
        asset_id: &AssetId,
        quantity: Decimal,
        unit_price: Decimal,
    ) -> Result<Transaction, LedgerError> {
        self.buy_at(asset_id, quantity, unit_price, Utc::now())
    }

    pub fn sell(
        &mut self,
        asset_id: &AssetId,
        quantity: Decimal,
        unit_price: Decimal,
    ) -> Result<Transaction, LedgerError> {
        self.sell_at(asset_id, quantity, unit_price, Utc::now())
    }

    pub fn buy_at(
        &mut self,
        asset_id: &AssetId,
        quantity: Decimal,
        unit_price: Decimal,
        timestamp: DateTime<Utc>,
    ) -> Result<Transaction, LedgerError> {
        self.record_buy(None, asset_id, quantity, unit_price, timestamp)
    }

    pub fn sell_at(
        &mut self,
        asset_id: &AssetId,
        quantity: Decimal,
        unit_price: Decimal,
        timestamp: DateTime<Utc>,
    ) -> Result<Transaction, LedgerError> {
        self.record_sell(None, asset_id, quantity, unit_price, timestamp)
    }

    /* Re-apply a transaction taken from a history, keeping its id and timestamp */
    pub(crate) fn apply_recorded(&mut self, tx: &Transaction) -> Result<(), LedgerError> {
        let id = Some(tx.id().clone());
        let expected_profit = match tx.kind() {
            TransactionKind::Buy => Decimal::ZERO,
            TransactionKind::Sell => Self::sale_profit(
                self.holdings.get(tx.asset_id()),
                tx.asset_id(),
                tx.quantity(),
                tx.unit_price(),
            )?,
        };
        if expected_profit != tx.realized_profit() {
            return Err(LedgerError::ReplayMismatch {
                transaction_id: tx.id().clone(),
            });
        }
        match tx.kind() {
            TransactionKind::Buy => {
                self.record_buy(id, tx.asset_id(), tx.quantity(), tx.unit_price(), tx.timestamp())?;
            }
            TransactionKind::Sell => {
                self.record_sell(id, tx.asset_id(), tx.quantity(), tx.unit_price(), tx.timestamp())?;
            }
        }
        Ok(())
    }

    fn record_buy(
        &mut self,
        id: Option<TransactionId>,
        asset_id: &AssetId,
        quantity: Decimal,
        unit_price: Decimal,
        timestamp: DateTime<Utc>,
    ) -> Result<Transaction, LedgerError> {
        Self::check_positive(quantity, unit_price)?;

        let holding = match self.holdings.get(asset_id) {
            Some(holding) => holding.with_purchase(quantity, unit_price)?,
            None => Holding::open(asset_id.clone(), quantity, unit_price)?,
        };
        self.holdings.insert(asset_id.clone(), holding);

        let tx = Transaction::new(
            id,
            TransactionKind::Buy,
            asset_id.clone(),
            quantity,
            unit_price,
            timestamp,
            dec!(0),
        );
        self.history.push(tx.clone());
        Ok(tx)
    }

    fn record_sell(
        &mut self,
        id: Option<TransactionId>,
        asset_id: &AssetId,
        quantity: Decimal,
        unit_price: Decimal,
        timestamp: DateTime<Utc>,
    ) -> Result<Transaction, LedgerError> {
        let realized_profit =
            Self::sale_profit(self.holdings.get(asset_id), asset_id, quantity, unit_price)?;

        // sale_profit guarantees the holding exists and covers the quantity
        if let Some(holding) = self.holdings.get_mut(asset_id) {
            holding.quantity -= quantity;
            if holding.quantity == Decimal::ZERO {
                // The average cost goes with it, a later buy starts from scratch
                self.holdings.remove(asset_id);
            }
        }

        let tx = Transaction::new(
            id,
            TransactionKind::Sell,
            asset_id.clone(),
            quantity,
            unit_price,
            timestamp,
            realized_profit,
        );
        self.history.push(tx.clone());
        Ok(tx)
    }

    /* Validate a sale against the current holding and return its realized profit */
    fn sale_profit(
        holding: Option<&Holding>,
        asset_id: &AssetId,
        quantity: Decimal,
        unit_price: Decimal,
    ) -> Result<Decimal, LedgerError> {
        Self::check_positive(quantity, unit_price)?;
        let holding = holding.ok_or_else(|| LedgerError::UnknownAsset {
            asset_id: asset_id.clone(),
        })?;
        if holding.quantity < quantity {
            return Err(LedgerError::InsufficientHoldings {
                asset_id: asset_id.clone(),
                requested: quantity,
                held: holding.quantity,
            });
        }

        let overflow = || LedgerError::overflow(format!("proceeds of the {asset_id} sale"));
        // The proceeds must fit too, the history reports them
        quantity.checked_mul(unit_price).ok_or_else(overflow)?;
        unit_price
            .checked_sub(holding.average_cost)
            .and_then(|margin| margin.checked_mul(quantity))
            .ok_or_else(overflow)
    }

    fn check_positive(quantity: Decimal, unit_price: Decimal) -> Result<(), LedgerError> {
        if quantity <= Decimal::ZERO {
            return Err(LedgerError::invalid(format!(
                "quantity must be positive, got {quantity}"
            )));
        }
        if unit_price <= Decimal::ZERO {
            return Err(LedgerError::invalid(format!(
                "unit price must be positive, got {unit_price}"
            )));
        }
        Ok(())
    }

    /* Value every holding at the given prices. A holding whose asset is missing from `prices` contributes
    nothing to the totals and is reported in `Valuation::unpriced`. Fails only when a value or a total does
    not fit in a Decimal. */
    pub fn valuation(&self, prices: &PriceMap) -> Result<Valuation, LedgerError> {
        let mut positions = self
            .holdings
            .values()
            .map(|holding| Self::position_value(holding, prices.get(&holding.asset_id).copied()))
            .collect::<Result<Vec<PositionValue>, LedgerError>>()?;
        positions.sort_by(|a, b| a.asset_id.cmp(&b.asset_id));

        let priced = || positions.iter().filter(|p| p.price.is_some());
        let total_value = checked_sum(priced().map(|p| p.value))
            .ok_or_else(|| LedgerError::overflow("total value"))?;
        let total_cost_basis = checked_sum(priced().map(|p| p.cost_basis))
            .ok_or_else(|| LedgerError::overflow("total cost basis"))?;
        let unrealized_profit = checked_sum(positions.iter().filter_map(|p| p.unrealized_profit))
            .ok_or_else(|| LedgerError::overflow("unrealized profit"))?;
        let unpriced = positions
            .iter()
            .filter(|p| p.price.is_none())
            .map(|p| p.asset_id.clone())
            .collect();

        Ok(Valuation {
            total_value,
            total_cost_basis,
            unrealized_profit,
            positions,
            unpriced,
        })
    }

    fn position_value(holding: &Holding, price: Option<Decimal>) -> Result<PositionValue, LedgerError> {
        let overflow = || LedgerError::overflow(format!("value of {}", holding.asset_id));
        let (value, unrealized_profit) = match price {
            Some(price) => {
                let value = holding.quantity.checked_mul(price).ok_or_else(overflow)?;
                let profit = price
                    .checked_sub(holding.average_cost)
                    .and_then(|margin| margin.checked_mul(holding.quantity))
                    .ok_or_else(overflow)?;
                (value, Some(profit))
            }
            None => (Decimal::ZERO, None),
        };
        Ok(PositionValue {
            asset_id: holding.asset_id.clone(),
            quantity: holding.quantity,
            average_cost: holding.average_cost,
            price,
            value,
            cost_basis: holding.cost_basis(),
            unrealized_profit,
        })
    }

    /* Chronological, read-only view of every transaction recorded so far */
    pub fn history(&self) -> &[Transaction] {
        &self.history
    }

    /* Copy of the current holdings, sorted by asset id */
    pub fn holdings_snapshot(&self) -> Vec<Holding> {
        let mut holdings: Vec<Holding> = self.holdings.values().cloned().collect();
        holdings.sort_by(|a, b| a.asset_id.cmp(&b.asset_id));
        holdings
    }

    pub fn holding(&self, asset_id: &AssetId) -> Option<&Holding> {
        self.holdings.get(asset_id)
    }

    /* Ids of the assets currently held, sorted. This is what a price source must resolve for a valuation. */
    pub fn asset_ids(&self) -> Vec<AssetId> {
        let mut ids: Vec<AssetId> = self.holdings.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn realized_profit(&self) -> Result<Decimal, LedgerError> {
        checked_sum(self.history.iter().map(Transaction::realized_profit))
            .ok_or_else(|| LedgerError::overflow("realized profit"))
    }

    pub fn is_empty(&self) -> bool {
        self.holdings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;

    use super::*;

    fn id(s: &str) -> AssetId {
        AssetId::new(s).unwrap()
    }

    fn pow10(exp: u32) -> Decimal {
        Decimal::from_i128_with_scale(10_i128.pow(exp), 0)
    }

    #[test]
    fn test_weighted_average() {
        let mut ledger = PortfolioLedger::new();
        ledger.buy(&id("bitcoin"), dec!(1), dec!(100)).unwrap();
        ledger.buy(&id("bitcoin"), dec!(1), dec!(200)).unwrap();

        let holding = ledger.holding(&id("bitcoin")).unwrap();
        assert_eq!(holding.quantity(), dec!(2));
        assert_eq!(holding.average_cost(), dec!(150));
    }

    #[test]
    fn test_sell_profit_keeps_average() {
        let mut ledger = PortfolioLedger::new();
        ledger.buy(&id("bitcoin"), dec!(1), dec!(100)).unwrap();
        ledger.buy(&id("bitcoin"), dec!(1), dec!(200)).unwrap();
        let tx = ledger.sell(&id("bitcoin"), dec!(1), dec!(180)).unwrap();

        assert_eq!(tx.kind(), TransactionKind::Sell);
        assert_eq!(tx.realized_profit(), dec!(30));
        let holding = ledger.holding(&id("bitcoin")).unwrap();
        assert_eq!(holding.quantity(), dec!(1));
        assert_eq!(holding.average_cost(), dec!(150));
        assert_eq!(ledger.realized_profit().unwrap(), dec!(30));
    }

    #[test]
    fn test_exhaustion_removes_holding() {
        let mut ledger = PortfolioLedger::new();
        ledger.buy(&id("eth"), dec!(2), dec!(50)).unwrap();
        let tx = ledger.sell(&id("eth"), dec!(2), dec!(60)).unwrap();

        assert_eq!(tx.realized_profit(), dec!(20));
        assert!(ledger.holding(&id("eth")).is_none());
        assert!(ledger.is_empty());

        ledger.buy(&id("eth"), dec!(1), dec!(80)).unwrap();
        assert_eq!(ledger.holding(&id("eth")).unwrap().average_cost(), dec!(80));
    }

    #[test]
    fn test_exhaustion_with_different_scales() {
        let mut ledger = PortfolioLedger::new();
        ledger.buy(&id("eth"), dec!(0.5), dec!(10)).unwrap();
        ledger.buy(&id("eth"), dec!(0.25), dec!(10)).unwrap();
        ledger.sell(&id("eth"), dec!(0.750), dec!(10)).unwrap();
        assert!(ledger.holdings_snapshot().is_empty());
    }

    #[test]
    fn test_buy_is_a_transaction_with_zero_profit() {
        let mut ledger = PortfolioLedger::new();
        let tx = ledger.buy(&id("sol"), dec!(3), dec!(20)).unwrap();
        assert_eq!(tx.kind(), TransactionKind::Buy);
        assert_eq!(tx.realized_profit(), dec!(0));
        assert_eq!(ledger.history(), &[tx]);
    }

    #[test]
    fn test_sell_unknown_asset() {
        let mut ledger = PortfolioLedger::new();
        let err = ledger.sell(&id("x"), dec!(1), dec!(10)).unwrap_err();
        assert_eq!(err, LedgerError::UnknownAsset { asset_id: id("x") });
        assert!(ledger.history().is_empty());
        assert!(ledger.holdings_snapshot().is_empty());
    }

    #[test]
    fn test_sell_insufficient() {
        let mut ledger = PortfolioLedger::new();
        ledger.buy(&id("x"), dec!(1), dec!(10)).unwrap();
        let before = ledger.clone();

        let err = ledger.sell(&id("x"), dec!(1.5), dec!(10)).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientHoldings {
                asset_id: id("x"),
                requested: dec!(1.5),
                held: dec!(1),
            }
        );
        assert_eq!(ledger, before);
    }

    #[test]
    fn test_invalid_arguments() {
        let mut ledger = PortfolioLedger::new();
        ledger.buy(&id("x"), dec!(1), dec!(10)).unwrap();
        let before = ledger.clone();

        for (q, p) in [(dec!(0), dec!(1)), (dec!(-1), dec!(1)), (dec!(1), dec!(0)), (dec!(1), dec!(-3))] {
            assert!(matches!(
                ledger.buy(&id("x"), q, p),
                Err(LedgerError::InvalidArgument { .. })
            ));
            assert!(matches!(
                ledger.sell(&id("x"), q, p),
                Err(LedgerError::InvalidArgument { .. })
            ));
        }
        assert_eq!(ledger, before);
    }

    #[test]
    fn test_valuation_with_missing_price() {
        let mut ledger = PortfolioLedger::new();
        ledger.buy(&id("a"), dec!(3), dec!(10)).unwrap();
        ledger.buy(&id("b"), dec!(2), dec!(5)).unwrap();

        let mut prices = PriceMap::new();
        prices.insert(id("a"), dec!(12));

        let valuation = ledger.valuation(&prices).unwrap();
        assert_eq!(valuation.total_value, dec!(36));
        assert_eq!(valuation.unpriced, vec![id("b")]);
        assert!(!valuation.is_complete());

        let b = valuation.position(&id("b")).unwrap();
        assert_eq!(b.price, None);
        assert_eq!(b.value, dec!(0));
        assert_eq!(b.unrealized_profit, None);

        assert_eq!(valuation.total_cost_basis, dec!(30));
        assert_eq!(valuation.unrealized_profit, dec!(6));
    }

    #[test]
    fn test_valuation_complete_and_sorted() {
        let mut ledger = PortfolioLedger::new();
        ledger.buy(&id("zcash"), dec!(1), dec!(10)).unwrap();
        ledger.buy(&id("aave"), dec!(2), dec!(10)).unwrap();

        let prices: PriceMap = [(id("zcash"), dec!(8)), (id("aave"), dec!(11)), (id("other"), dec!(1))]
            .into_iter()
            .collect();
        let valuation = ledger.valuation(&prices).unwrap();
        assert!(valuation.is_complete());
        assert_eq!(valuation.total_value, dec!(30));
        let order: Vec<&str> = valuation.positions.iter().map(|p| p.asset_id.as_str()).collect();
        assert_eq!(order, vec!["aave", "zcash"]);
    }

    #[test]
    fn test_valuation_does_not_mutate() {
        let mut ledger = PortfolioLedger::new();
        ledger.buy(&id("a"), dec!(1), dec!(1)).unwrap();
        let before = ledger.clone();
        ledger.valuation(&PriceMap::new()).unwrap();
        assert_eq!(ledger, before);
    }

    #[test]
    fn test_reads_are_idempotent() {
        let mut ledger = PortfolioLedger::new();
        ledger.buy(&id("a"), dec!(1), dec!(1)).unwrap();
        ledger.buy(&id("b"), dec!(2), dec!(3)).unwrap();
        ledger.sell(&id("b"), dec!(1), dec!(4)).unwrap();

        assert_eq!(ledger.history(), ledger.history());
        assert_eq!(ledger.holdings_snapshot(), ledger.holdings_snapshot());
        assert_eq!(ledger.asset_ids(), vec![id("a"), id("b")]);
    }

    #[test]
    fn test_history_is_chronological() {
        let mut ledger = PortfolioLedger::new();
        ledger
            .buy_at(&id("a"), dec!(1), dec!(1), DateTime::from_timestamp(10, 0).unwrap())
            .unwrap();
        ledger
            .sell_at(&id("a"), dec!(1), dec!(2), DateTime::from_timestamp(20, 0).unwrap())
            .unwrap();
        let kinds: Vec<TransactionKind> = ledger.history().iter().map(|t| t.kind()).collect();
        assert_eq!(kinds, vec![TransactionKind::Buy, TransactionKind::Sell]);
        assert!(ledger.history()[0].timestamp() < ledger.history()[1].timestamp());
    }

    #[test]
    fn test_buy_overflow_is_an_error() {
        let mut ledger = PortfolioLedger::new();

        // 1e15 × 1e15 is past Decimal::MAX (about 7.9e28)
        let err = ledger.buy(&id("a"), pow10(15), pow10(15)).unwrap_err();
        assert!(matches!(err, LedgerError::Overflow { .. }));
        assert!(ledger.history().is_empty());
        assert!(ledger.is_empty());

        ledger.buy(&id("a"), pow10(14), pow10(14)).unwrap();
        let before = ledger.clone();
        let err = ledger.buy(&id("a"), pow10(14), Decimal::MAX).unwrap_err();
        assert!(matches!(err, LedgerError::Overflow { .. }));
        assert_eq!(ledger, before);

        ledger.buy(&id("a"), dec!(1), dec!(1)).unwrap();
        assert_eq!(ledger.holding(&id("a")).unwrap().quantity(), pow10(14) + dec!(1));
    }

    #[test]
    fn test_sell_overflow_is_an_error() {
        let mut ledger = PortfolioLedger::new();
        ledger.buy(&id("a"), pow10(15), dec!(1)).unwrap();
        let before = ledger.clone();

        let err = ledger.sell(&id("a"), pow10(15), pow10(15)).unwrap_err();
        assert!(matches!(err, LedgerError::Overflow { .. }));
        assert_eq!(ledger, before);

        let tx = ledger.sell(&id("a"), pow10(15), pow10(13)).unwrap();
        assert_eq!(tx.notional(), Some(pow10(28)));
    }

    #[test]
    fn test_valuation_overflow_is_an_error() {
        let mut ledger = PortfolioLedger::new();
        ledger.buy(&id("a"), Decimal::MAX, dec!(1)).unwrap();

        let prices: PriceMap = [(id("a"), dec!(2))].into_iter().collect();
        assert!(matches!(
            ledger.valuation(&prices),
            Err(LedgerError::Overflow { .. })
        ));

        // Unpriced, the same holding still values fine
        let valuation = ledger.valuation(&PriceMap::new()).unwrap();
        assert_eq!(valuation.total_value, dec!(0));
        assert_eq!(valuation.unpriced, vec![id("a")]);
    }

    #[test]
    fn test_total_value_overflow_is_an_error() {
        let mut ledger = PortfolioLedger::new();
        ledger.buy(&id("a"), pow10(28), dec!(1)).unwrap();
        ledger.buy(&id("b"), pow10(28), dec!(1)).unwrap();

        let prices: PriceMap = [(id("a"), dec!(5)), (id("b"), dec!(5))].into_iter().collect();
        assert!(matches!(
            ledger.valuation(&prices),
            Err(LedgerError::Overflow { .. })
        ));
    }
}
