use std::sync::Arc;

use parking_lot::Mutex;
use rust_decimal::Decimal;

use crate::{
    errors::LedgerError,
    structs::{AssetId, Holding, PriceMap, Transaction, Valuation},
};

use super::PortfolioLedger;

/* Handle for sharing one ledger between threads. A single lock guards the holdings and the history together,
so a weighted average is never computed from a stale read. Clones point to the same ledger. */
#[derive(Debug, Clone, Default)]
pub struct SharedLedger {
    inner: Arc<Mutex<PortfolioLedger>>,
}

impl SharedLedger {
    pub fn new(ledger: PortfolioLedger) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ledger)),
        }
    }

    pub fn buy(
        &self,
        asset_id: &AssetId,
        quantity: Decimal,
        unit_price: Decimal,
    ) -> Result<Transaction, LedgerError> {
        self.inner.lock().buy(asset_id, quantity, unit_price)
    }

    pub fn sell(
        &self,
        asset_id: &AssetId,
        quantity: Decimal,
        unit_price: Decimal,
    ) -> Result<Transaction, LedgerError> {
        self.inner.lock().sell(asset_id, quantity, unit_price)
    }

    pub fn valuation(&self, prices: &PriceMap) -> Result<Valuation, LedgerError> {
        self.inner.lock().valuation(prices)
    }

    pub fn holdings_snapshot(&self) -> Vec<Holding> {
        self.inner.lock().holdings_snapshot()
    }

    pub fn history(&self) -> Vec<Transaction> {
        self.inner.lock().history().to_vec()
    }

    pub fn asset_ids(&self) -> Vec<AssetId> {
        self.inner.lock().asset_ids()
    }

    /* Run several reads or writes under one acquisition of the lock */
    pub fn with<R>(&self, f: impl FnOnce(&mut PortfolioLedger) -> R) -> R {
        let mut guard = self.inner.lock();
        f(&mut *guard)
    }
}
