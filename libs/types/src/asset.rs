//! Assets traded on the ledger
//!
//! The ledger has one native (base) asset that also pays fees, plus any
//! number of issued assets identified by their defining unit.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of an issued asset
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetId(String);

impl AssetId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// An asset as it appears in outputs, deposits and settlement totals.
///
/// `Base` sorts before every issued asset so per-asset maps iterate the
/// fee-paying asset first.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Asset {
    Base,
    Issued(AssetId),
}

impl Asset {
    pub fn issued(id: impl Into<String>) -> Self {
        Asset::Issued(AssetId::new(id))
    }

    pub fn is_base(&self) -> bool {
        matches!(self, Asset::Base)
    }

    /// Issued asset id, `None` for the base asset.
    pub fn issued_id(&self) -> Option<&AssetId> {
        match self {
            Asset::Base => None,
            Asset::Issued(id) => Some(id),
        }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Asset::Base => f.write_str("base"),
            Asset::Issued(id) => write!(f, "{}", id),
        }
    }
}
