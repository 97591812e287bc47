use thiserror::Error;

use super::{ApiError, ExportError, LedgerError};

/* Umbrella error for the command line driver */
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("market data is not available in offline mode")]
    Offline,

    #[error("price for {0} is currently unavailable")]
    PriceUnavailable(String),

    #[error("could not read input: {0}")]
    Input(#[from] std::io::Error),
}
