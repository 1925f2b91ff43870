//! Node configuration.
//!
//! Built-in defaults, then an optional `exchange.toml`, then environment
//! variables prefixed with `EXCHANGE_` (nested fields separated using `__`).
//! For example, `EXCHANGE_LEDGER__OPERATOR_ADDRESS=OPERATOR`.

use serde::Deserialize;
use std::path::PathBuf;
use types::fee::{MIN_FEE, ORDER_TERM_SECS};
use types::ids::{Address, DeviceAddress};
use types::pair::TradingPair;

use contracts::ledger::MAX_AUTHORS_PER_UNIT;

#[derive(Debug, Deserialize, Clone)]
/// Top-level settings of the exchange node.
pub struct GatewayConfig {
    pub http_listen_addr: String,
    /// Minimum fee per lot in base-asset units
    pub min_fee: u64,
    /// Seconds before a requester may reclaim an unmatched escrow
    pub order_term_secs: i64,
    /// Oracle whose timestamp gates the reclaim branch
    pub timestamper_address: Address,
    pub max_authors_per_unit: usize,
    /// Settlement journal directory; no journal when unset
    #[serde(default)]
    pub journal_dir: Option<PathBuf>,
    pub log_filter: String,
    pub ledger: LedgerSettings,
    /// Pairs seeded into the store at startup
    #[serde(default)]
    pub pairs: Vec<TradingPair>,
}

#[derive(Debug, Deserialize, Clone)]
/// Identity of the in-process ledger node.
pub struct LedgerSettings {
    pub operator_address: Address,
    pub device_address: DeviceAddress,
}

impl GatewayConfig {
    /// Load settings from defaults, `exchange.toml` (optional), and environment.
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from("exchange")
    }

    pub fn load_from(file: &str) -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .set_default("http_listen_addr", "0.0.0.0:8080")?
            .set_default("min_fee", MIN_FEE)?
            .set_default("order_term_secs", ORDER_TERM_SECS)?
            .set_default("timestamper_address", "TIMESTAMPER")?
            .set_default("max_authors_per_unit", MAX_AUTHORS_PER_UNIT as u64)?
            .set_default("log_filter", "info")?
            .set_default("ledger.operator_address", "EXCHANGE-OPERATOR")?
            .set_default("ledger.device_address", "EXCHANGE-DEVICE")?
            .add_source(config::File::with_name(file).required(false))
            .add_source(
                config::Environment::with_prefix("EXCHANGE")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        config.try_deserialize()
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            http_listen_addr: "127.0.0.1:8080".to_string(),
            min_fee: MIN_FEE,
            order_term_secs: ORDER_TERM_SECS,
            timestamper_address: Address::from("TIMESTAMPER"),
            max_authors_per_unit: MAX_AUTHORS_PER_UNIT,
            journal_dir: None,
            log_filter: "info".to_string(),
            ledger: LedgerSettings {
                operator_address: Address::from("EXCHANGE-OPERATOR"),
                device_address: DeviceAddress::from("EXCHANGE-DEVICE"),
            },
            pairs: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_load_without_file() {
        let config = GatewayConfig::load_from("does-not-exist").unwrap();
        assert_eq!(config.min_fee, 1000);
        assert_eq!(config.order_term_secs, 3600);
        assert_eq!(config.max_authors_per_unit, 16);
        assert!(config.journal_dir.is_none());
        assert!(config.pairs.is_empty());
    }

    #[test]
    fn test_file_overrides_defaults_and_seeds_pairs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("node.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
min_fee = 2000
journal_dir = "/var/lib/exchange"

[[pairs]]
pair_id = 1
asset1 = {{ issued = "GOLD" }}
asset2 = "base"
price_multiplier = 100
amount_increment = 1
delisted = false
"#
        )
        .unwrap();

        let stem = path.with_extension("");
        let config = GatewayConfig::load_from(stem.to_str().unwrap()).unwrap();
        assert_eq!(config.min_fee, 2000);
        assert_eq!(config.journal_dir, Some(PathBuf::from("/var/lib/exchange")));
        assert_eq!(config.pairs.len(), 1);
        assert_eq!(config.pairs[0].price_multiplier, 100);
    }
}
