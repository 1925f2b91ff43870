#![allow(dead_code)]

use contracts::memory_ledger::MemoryLedger;
use gateway::intake::{PlaceOrderRequest, PlacedOrder};
use gateway::notify::RecordingNotifier;
use gateway::{Exchange, GatewayConfig};
use persistence::{ExchangeStore, MemoryStore};
use rust_decimal::Decimal;
use std::collections::BTreeSet;
use std::str::FromStr;
use std::sync::Arc;
use types::asset::Asset;
use types::ids::{Address, DeviceAddress, PairId, UnitId};
use types::order::{Order, OrderType};
use types::pair::TradingPair;

/// GOLD priced in the base asset, prices with three decimals
pub const GOLD_BASE: PairId = PairId::new(1);
/// GOLD priced in USD, prices with two decimals
pub const GOLD_USD: PairId = PairId::new(2);

pub const OPERATOR: &str = "OPERATOR";

pub fn gold() -> Asset {
    Asset::issued("GOLD")
}

pub fn usd() -> Asset {
    Asset::issued("USD")
}

pub fn address(who: &str) -> Address {
    Address::new(format!("ADDR-{}", who))
}

pub fn device(who: &str) -> DeviceAddress {
    DeviceAddress::new(format!("DEV-{}", who))
}

pub struct Harness {
    pub exchange: Arc<Exchange>,
    pub ledger: Arc<MemoryLedger>,
    pub store: Arc<MemoryStore>,
    pub notifier: Arc<RecordingNotifier>,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(GatewayConfig::default())
    }

    pub fn with_config(config: GatewayConfig) -> Self {
        let ledger = Arc::new(MemoryLedger::new(Address::from(OPERATOR), DeviceAddress::from("OPERATOR-DEVICE")));
        ledger.mark_operator_stable();
        let store = Arc::new(MemoryStore::new());
        store
            .insert_pair(TradingPair {
                pair_id: GOLD_BASE,
                asset1: gold(),
                asset2: Asset::Base,
                price_multiplier: 1000,
                amount_increment: 1,
                delisted: false,
            })
            .unwrap();
        store
            .insert_pair(TradingPair {
                pair_id: GOLD_USD,
                asset1: gold(),
                asset2: usd(),
                price_multiplier: 100,
                amount_increment: 1,
                delisted: false,
            })
            .unwrap();
        let notifier = Arc::new(RecordingNotifier::new());
        let exchange = Arc::new(Exchange::new(config, store.clone(), ledger.clone(), notifier.clone()));
        Self {
            exchange,
            ledger,
            store,
            notifier,
        }
    }

    pub fn request(&self, pair_id: PairId, order_type: OrderType, price: &str, amount: u64, who: &str) -> PlaceOrderRequest {
        PlaceOrderRequest {
            pair_id,
            order_type,
            price: Decimal::from_str(price).unwrap(),
            amount,
            fee: 1000,
            destination_address: address(who),
            device_address: device(who),
        }
    }

    pub async fn place(&self, pair_id: PairId, order_type: OrderType, price: &str, amount: u64, who: &str) -> PlacedOrder {
        self.exchange
            .place_order(self.request(pair_id, order_type, price, amount, who))
            .await
            .unwrap()
    }

    /// Pay every lot of `placed` as instructed, in one transaction.
    pub async fn fund(&self, placed: &PlacedOrder) -> UnitId {
        let payments = placed
            .lots
            .iter()
            .flat_map(|lot| lot.payments.iter())
            .map(|p| (p.address.clone(), p.asset.clone(), p.amount))
            .collect();
        let unit = self.ledger.submit_payment(payments);
        self.exchange.handle_new_transactions(&[unit.clone()]).await.unwrap();
        unit
    }

    pub async fn finalize(&self, units: &[UnitId]) -> BTreeSet<PairId> {
        let mci = self.ledger.stabilize(units);
        self.exchange.handle_stabilized(mci).await.unwrap()
    }

    /// Place, fund and finalize an order.
    pub async fn active_order(&self, pair_id: PairId, order_type: OrderType, price: &str, amount: u64, who: &str) -> PlacedOrder {
        let placed = self.place(pair_id, order_type, price, amount, who).await;
        let unit = self.fund(&placed).await;
        self.finalize(&[unit]).await;
        placed
    }

    pub fn active(&self, pair_id: PairId) -> Vec<Order> {
        self.store.active_orders(pair_id).unwrap()
    }
}
