use std::io;

use serde::Serialize;

use crate::{
    errors::ExportError,
    structs::{Transaction, TransactionKind},
    utils::create_directories_if_needed,
};

#[derive(Debug, Serialize)]
struct HistoryRecord<'a> {
    id: &'a str,
    timestamp: String,
    kind: TransactionKind,
    asset_id: &'a str,
    quantity: String,
    unit_price: String,
    realized_profit: String,
}

impl<'a> From<&'a Transaction> for HistoryRecord<'a> {
    fn from(tx: &'a Transaction) -> Self {
        Self {
            id: tx.id(),
            timestamp: tx.timestamp().to_rfc3339(),
            kind: tx.kind(),
            asset_id: tx.asset_id().as_str(),
            quantity: tx.quantity().to_string(),
            unit_price: tx.unit_price().to_string(),
            realized_profit: tx.realized_profit().to_string(),
        }
    }
}

/* Write the history as CSV, one row per transaction, header included */
pub fn write_history_csv<W: io::Write>(history: &[Transaction], writer: W) -> Result<(), ExportError> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    for tx in history {
        csv_writer.serialize(HistoryRecord::from(tx))?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn export_history_csv(history: &[Transaction], path: &str) -> Result<(), ExportError> {
    create_directories_if_needed(path)?;
    let file = std::fs::File::create(path)?;
    write_history_csv(history, file)
}
