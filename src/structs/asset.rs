use std::{fmt, str::FromStr};

use hashbrown::HashMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::LedgerError;

/* Prices keyed by asset, as handed to the ledger for valuation. An asset missing from the map has no known price. */
pub type PriceMap = HashMap<AssetId, Decimal>;

/* Identifier of an asset (the id assigned by the price API, e.g. "bitcoin").

Normalization is applied once, here: surrounding whitespace is trimmed and ASCII letters are lowercased.
Every map in the crate is keyed by AssetId so "Bitcoin ", "bitcoin" and "BITCOIN" are the same asset everywhere.
*/
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AssetId(String);

impl AssetId {
    pub fn new(raw: &str) -> Result<Self, LedgerError> {
        let normalized = raw.trim().to_ascii_lowercase();
        if normalized.is_empty() {
            return Err(LedgerError::invalid("asset id cannot be empty"));
        }
        Ok(AssetId(normalized))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for AssetId {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AssetId::new(s)
    }
}

impl TryFrom<String> for AssetId {
    type Error = LedgerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        AssetId::new(&value)
    }
}

impl From<AssetId> for String {
    fn from(id: AssetId) -> Self {
        id.0
    }
}

impl AsRef<str> for AssetId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalization() {
        let a = AssetId::new("  Bitcoin ").unwrap();
        let b = AssetId::new("bitcoin").unwrap();
        let c: AssetId = "BITCOIN".parse().unwrap();
        assert_eq!(a, b);
        assert_eq!(b, c);
        assert_eq!(a.as_str(), "bitcoin");
    }

    #[test]
    fn test_empty_is_invalid() {
        assert!(matches!(
            AssetId::new("   "),
            Err(LedgerError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_deserialize_normalizes() {
        let id: AssetId = serde_json::from_str("\"Ethereum\"").unwrap();
        assert_eq!(id.as_str(), "ethereum");
        assert!(serde_json::from_str::<AssetId>("\"\"").is_err());
    }
}
