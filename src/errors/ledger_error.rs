use rust_decimal::Decimal;
use thiserror::Error;

use crate::structs::{AssetId, TransactionId};

/* Errors returned by the portfolio ledger. A failing call never leaves a partial mutation behind:
holdings and history are exactly as they were before the call. */
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },

    #[error("no holding for asset {asset_id}")]
    UnknownAsset { asset_id: AssetId },

    #[error("insufficient holdings for {asset_id}: requested {requested}, held {held}")]
    InsufficientHoldings {
        asset_id: AssetId,
        requested: Decimal,
        held: Decimal,
    },

    #[error("arithmetic overflow while computing {what}")]
    Overflow { what: String },

    #[error("replaying transaction {transaction_id} produced a different realized profit")]
    ReplayMismatch { transaction_id: TransactionId },
}

impl LedgerError {
    pub fn invalid(reason: impl Into<String>) -> Self {
        LedgerError::InvalidArgument {
            reason: reason.into(),
        }
    }

    pub fn overflow(what: impl Into<String>) -> Self {
        LedgerError::Overflow { what: what.into() }
    }
}
