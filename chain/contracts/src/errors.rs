//! Contract-specific error types
//!
//! Errors of the escrow layer and of the ledger collaborator.

use thiserror::Error;
use types::ids::{Address, UnitId};

/// Escrow definition errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EscrowError {
    #[error("Malformed escrow definition: {0}")]
    Malformed(String),

    #[error("Escrow definition encoding failed: {0}")]
    Encoding(String),

    #[error("Definition does not hash to address {address}")]
    AddressMismatch { address: Address },
}

/// Ledger collaborator failures outside transaction composition
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LedgerError {
    #[error("Unknown unit: {0}")]
    UnknownUnit(UnitId),

    #[error("Escrow address already registered: {0}")]
    AddressInUse(Address),

    #[error("Escrow error: {0}")]
    Escrow(#[from] EscrowError),

    #[error("Ledger unavailable: {0}")]
    Unavailable(String),
}

/// Transaction composer failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ComposeError {
    #[error("Not enough funds to compose exchange transaction: {0}")]
    NotEnoughFunds(String),

    #[error("Failed to compose exchange transaction: {0}")]
    Compose(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compose_error_display() {
        let err = ComposeError::NotEnoughFunds("GOLD short by 4".to_string());
        assert!(err.to_string().starts_with("Not enough funds"));
    }

    #[test]
    fn test_ledger_error_from_escrow() {
        let err: LedgerError = EscrowError::Malformed("zero out amount".to_string()).into();
        assert!(matches!(err, LedgerError::Escrow(_)));
    }
}
