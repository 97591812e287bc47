/* Rebuild a ledger from a transaction history. Since holdings only depend on the ordered history and on the
prices recorded in it, applying the same history to an empty ledger must give back the same holdings. */

use crate::{
    errors::LedgerError,
    structs::{PortfolioLedger, Transaction},
};

pub fn replay(history: &[Transaction]) -> Result<PortfolioLedger, LedgerError> {
    let mut ledger = PortfolioLedger::new();
    for tx in history {
        ledger.apply_recorded(tx)?;
    }
    Ok(ledger)
}
