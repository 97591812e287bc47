pub mod portfolio_ledger;
pub use portfolio_ledger::*;

pub mod shared_ledger;
pub use shared_ledger::*;
