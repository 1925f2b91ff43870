//! Types library for the escrow exchange
//!
//! Core data model shared by intake, matching, settlement and storage.
//!
//! # Modules
//! - `ids`: Surrogate row ids and ledger identifiers
//! - `asset`: Base vs issued assets
//! - `numeric`: Integer price scaling and counter amounts
//! - `lots`: Power-of-two lot decomposition
//! - `pair`: Trading pair properties
//! - `escrow`: Typed escrow (custody address) definitions
//! - `order`: Order lifecycle
//! - `deposit`: Expected deposits awaiting funding
//! - `deal`: Matches and deals
//! - `fee`: Fee constants and funding payments
//! - `errors`: Error taxonomy

pub mod ids;
pub mod asset;
pub mod numeric;
pub mod lots;
pub mod pair;
pub mod escrow;
pub mod order;
pub mod deposit;
pub mod deal;
pub mod fee;
pub mod errors;

pub const LIB_VERSION: &str = "1.0.0";

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::asset::*;
    pub use crate::deal::*;
    pub use crate::deposit::*;
    pub use crate::errors::*;
    pub use crate::escrow::*;
    pub use crate::fee::*;
    pub use crate::ids::*;
    pub use crate::lots::*;
    pub use crate::numeric::*;
    pub use crate::order::*;
    pub use crate::pair::*;
}
