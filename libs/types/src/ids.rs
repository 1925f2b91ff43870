//! Identifier types for exchange entities
//!
//! Rows of the order book are keyed by surrogate integer ids assigned by the
//! store. Ledger-side identifiers (addresses, units) are opaque strings owned
//! by the ledger network.

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! surrogate_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            pub const fn new(raw: u64) -> Self {
                Self(raw)
            }

            pub const fn get(&self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

surrogate_id!(
    /// Trading pair identifier
    PairId
);
surrogate_id!(
    /// Order row identifier, one per funded lot
    OrderId
);
surrogate_id!(
    /// Expected deposit row identifier, one per lot at intake
    ExpectedDepositId
);
surrogate_id!(
    /// Settlement (deal) identifier
    DealId
);
surrogate_id!(
    /// Identifier of one match inside a deal
    MatchId
);

macro_rules! ledger_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

ledger_id!(
    /// Ledger address (plain or escrow/custody)
    Address
);
ledger_id!(
    /// Messaging device of a participant, used only for notifications
    DeviceAddress
);
ledger_id!(
    /// Ledger transaction ("unit") hash
    UnitId
);

/// Reference to one output of a ledger transaction
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OutputRef {
    pub unit: UnitId,
    pub message_index: u32,
    pub output_index: u32,
}

impl OutputRef {
    pub fn new(unit: UnitId, message_index: u32, output_index: u32) -> Self {
        Self {
            unit,
            message_index,
            output_index,
        }
    }
}

impl fmt::Display for OutputRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.unit, self.message_index, self.output_index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_surrogate_ids_order_by_value() {
        assert!(OrderId::new(3) < OrderId::new(10));
        assert_eq!(DealId::from(7).get(), 7);
    }

    #[test]
    fn test_surrogate_id_serialization_is_transparent() {
        let id = PairId::new(42);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "42");
        let back: PairId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_ledger_id_display() {
        let address = Address::from("OPNUXBRSSQQGHKQNEPD2GLWQYEUY5XLD");
        assert_eq!(address.to_string(), "OPNUXBRSSQQGHKQNEPD2GLWQYEUY5XLD");
        assert_eq!(serde_json::to_string(&address).unwrap(), "\"OPNUXBRSSQQGHKQNEPD2GLWQYEUY5XLD\"");
    }
}
