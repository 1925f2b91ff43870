//! Escrow definitions
//!
//! Each lot is funded into its own custody address whose spending condition
//! is a two-branch disjunction:
//!
//! ```text
//! or(
//!   and(signed by owner,    oracle timestamp > release_after),   // reclaim
//!   and(signed by operator, pays >= out_amount of out_asset to beneficiary), // settle
//! )
//! ```
//!
//! The definition is built once at intake and stored with the expected
//! deposit, so later stages read typed fields instead of decoding a tree.

use serde::{Deserialize, Serialize};

use crate::asset::Asset;
use crate::ids::{Address, DeviceAddress};
use crate::numeric::Amount;

/// Requester may reclaim unilaterally once the order term has elapsed
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReclaimBranch {
    pub owner: Address,
    pub timestamp_oracle: Address,
    /// Unix millis the oracle timestamp must exceed
    pub release_after: i64,
}

/// Operator may move funds out if the requester is paid in the same transaction
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SettleBranch {
    pub operator: Address,
    pub out_asset: Asset,
    pub out_amount: Amount,
    pub beneficiary: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EscrowDefinition {
    pub reclaim: ReclaimBranch,
    pub settle: SettleBranch,
}

impl EscrowDefinition {
    /// Address of the requester who funded the escrow.
    pub fn owner(&self) -> &Address {
        &self.reclaim.owner
    }

    pub fn out_amount(&self) -> Amount {
        self.settle.out_amount
    }
}

/// Signing path of an escrow member
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SigningPath {
    /// `r.0.0`: the requester, reclaim branch
    Requester,
    /// `r.1.0`: the operator, settlement branch
    Operator,
}

impl SigningPath {
    pub fn as_str(&self) -> &'static str {
        match self {
            SigningPath::Requester => "r.0.0",
            SigningPath::Operator => "r.1.0",
        }
    }
}

/// One member of an escrow's signer set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EscrowSigner {
    pub path: SigningPath,
    pub member_address: Address,
    pub device_address: DeviceAddress,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signing_path_names() {
        assert_eq!(SigningPath::Requester.as_str(), "r.0.0");
        assert_eq!(SigningPath::Operator.as_str(), "r.1.0");
    }
}
