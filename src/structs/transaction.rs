use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::AssetId;

pub type TransactionId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionKind {
    Buy,
    Sell,
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TransactionKind::Buy => write!(f, "BUY"),
            TransactionKind::Sell => write!(f, "SELL"),
        }
    }
}

/* A single buy or sell recorded by the ledger. Fields are only readable: once appended to the history
a transaction never changes. The realized profit of a sell is fixed at creation, using the average cost
of the holding right before the sale. It is always zero for a buy. */
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    id: TransactionId,
    kind: TransactionKind,
    asset_id: AssetId,
    quantity: Decimal,
    unit_price: Decimal,
    timestamp: DateTime<Utc>,
    realized_profit: Decimal,
}

impl Transaction {
    pub(crate) fn new(
        id: Option<TransactionId>,
        kind: TransactionKind,
        asset_id: AssetId,
        quantity: Decimal,
        unit_price: Decimal,
        timestamp: DateTime<Utc>,
        realized_profit: Decimal,
    ) -> Self {
        Self {
            id: id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            kind,
            asset_id,
            quantity,
            unit_price,
            timestamp,
            realized_profit,
        }
    }

    pub fn id(&self) -> &TransactionId {
        &self.id
    }

    pub fn kind(&self) -> TransactionKind {
        self.kind
    }

    pub fn asset_id(&self) -> &AssetId {
        &self.asset_id
    }

    pub fn quantity(&self) -> Decimal {
        self.quantity
    }

    pub fn unit_price(&self) -> Decimal {
        self.unit_price
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn realized_profit(&self) -> Decimal {
        self.realized_profit
    }

    /* Cash moved by the transaction: paid for a buy, received for a sell. Always Some for a transaction
    recorded by the ledger, a deserialized one may not fit. */
    pub fn notional(&self) -> Option<Decimal> {
        self.quantity.checked_mul(self.unit_price)
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let ts = self.timestamp.format("%Y-%m-%d %H:%M:%S");
        match self.kind {
            TransactionKind::Buy => write!(
                f,
                "[{ts}] BUY {} {} @ {}",
                self.quantity, self.asset_id, self.unit_price
            ),
            TransactionKind::Sell => write!(
                f,
                "[{ts}] SELL {} {} @ {} (profit: {})",
                self.quantity, self.asset_id, self.unit_price, self.realized_profit
            ),
        }
    }
}
