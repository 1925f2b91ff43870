//! Custody addresses
//!
//! A custody address is derived deterministically from the content of its
//! escrow definition, so the same definition always yields the same address
//! and a collision means either a duplicate request or a hash clash.

use sha2::{Digest, Sha256};
use types::asset::Asset;
use types::escrow::{EscrowDefinition, EscrowSigner, SigningPath};
use types::ids::{Address, DeviceAddress};
use types::numeric::Amount;

use crate::errors::EscrowError;
use crate::ESCROW_LAYOUT_VERSION;

/// Length in bytes of the digest prefix that forms an address
const ADDRESS_BYTES: usize = 16;

/// Reject definitions that could never be spent as intended.
pub fn validate(definition: &EscrowDefinition) -> Result<(), EscrowError> {
    if definition.settle.out_amount == 0 {
        return Err(EscrowError::Malformed("out amount is zero".to_string()));
    }
    if definition.reclaim.release_after <= 0 {
        return Err(EscrowError::Malformed("release timestamp is not positive".to_string()));
    }
    if definition.reclaim.owner == definition.settle.operator {
        return Err(EscrowError::Malformed("owner and operator coincide".to_string()));
    }
    if definition.reclaim.owner != definition.settle.beneficiary {
        return Err(EscrowError::Malformed("beneficiary is not the owner".to_string()));
    }
    Ok(())
}

/// Derive the custody address of a definition under the current layout version.
pub fn custody_address(definition: &EscrowDefinition) -> Result<Address, EscrowError> {
    validate(definition)?;
    let encoded = serde_json::to_vec(definition).map_err(|e| EscrowError::Encoding(e.to_string()))?;
    let mut hasher = Sha256::new();
    hasher.update(ESCROW_LAYOUT_VERSION.as_bytes());
    hasher.update(&encoded);
    let digest = hasher.finalize();
    Ok(Address::new(hex::encode_upper(&digest[..ADDRESS_BYTES])))
}

/// Check that `address` is the custody address of `definition`.
pub fn verify_address(address: &Address, definition: &EscrowDefinition) -> Result<(), EscrowError> {
    if &custody_address(definition)? != address {
        return Err(EscrowError::AddressMismatch {
            address: address.clone(),
        });
    }
    Ok(())
}

/// Signer set: the requester on the reclaim branch, the operator on the settle branch.
pub fn signers(
    definition: &EscrowDefinition,
    requester_device: &DeviceAddress,
    operator_device: &DeviceAddress,
) -> Vec<EscrowSigner> {
    vec![
        EscrowSigner {
            path: SigningPath::Requester,
            member_address: definition.reclaim.owner.clone(),
            device_address: requester_device.clone(),
        },
        EscrowSigner {
            path: SigningPath::Operator,
            member_address: definition.settle.operator.clone(),
            device_address: operator_device.clone(),
        },
    ]
}

/// One output of a spending transaction as seen by the escrow condition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpendOutput<'a> {
    pub asset: &'a Asset,
    pub address: &'a Address,
    pub amount: Amount,
}

/// Evaluate the escrow condition against a spend.
///
/// Returns the branch that authorizes it, if any.
pub fn authorizing_path(
    definition: &EscrowDefinition,
    signer: &Address,
    oracle_timestamp: Option<i64>,
    outputs: &[SpendOutput<'_>],
) -> Option<SigningPath> {
    let reclaim = &definition.reclaim;
    if signer == &reclaim.owner && oracle_timestamp.is_some_and(|ts| ts > reclaim.release_after) {
        return Some(SigningPath::Requester);
    }

    let settle = &definition.settle;
    let pays_beneficiary = outputs.iter().any(|o| {
        o.asset == &settle.out_asset && o.address == &settle.beneficiary && o.amount >= settle.out_amount
    });
    if signer == &settle.operator && pays_beneficiary {
        return Some(SigningPath::Operator);
    }
    None
}
