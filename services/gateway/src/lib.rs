//! Exchange node
//!
//! Wires the order book store, the ledger collaborator and the matching
//! engine into a running service.
//!
//! **Flow:**
//! - `intake`: an order request opens one escrow per lot
//! - `correlator`: ledger payments fund deposits; finality activates orders
//! - `coordinator`: per-pair serialized matching passes
//! - `settlement`: matches become one signed multi-party transfer
//! - `events`: the ledger event loop driving the above
//! - `router`/`handlers`: the HTTP surface

pub mod config;
pub mod coordinator;
pub mod correlator;
pub mod error;
pub mod events;
pub mod exchange;
pub mod handlers;
pub mod intake;
pub mod market;
pub mod models;
pub mod notify;
pub mod operator;
pub mod router;
pub mod settlement;
pub mod state;

pub use config::GatewayConfig;
pub use error::{AppError, ErrorClass, ExchangeError};
pub use exchange::Exchange;
