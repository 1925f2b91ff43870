mod common;

use common::*;
use contracts::memory_ledger::MemoryLedger;
use gateway::intake::quote;
use gateway::notify::LogNotifier;
use gateway::{ErrorClass, Exchange, ExchangeError, GatewayConfig};
use persistence::{ExchangeStore, MemoryStore};
use std::sync::Arc;
use types::errors::OrderError;
use types::ids::{Address, DeviceAddress, PairId};
use types::order::OrderType;
use types::pair::TradingPair;

fn order_error(err: ExchangeError) -> OrderError {
    assert_eq!(err.class(), ErrorClass::User);
    match err {
        ExchangeError::Order(e) => e,
        other => panic!("unexpected error {other:?}"),
    }
}

#[tokio::test]
async fn test_rejects_before_operator_is_ready() {
    let ledger = Arc::new(MemoryLedger::new(Address::from(OPERATOR), DeviceAddress::from("OPERATOR-DEVICE")));
    let store = Arc::new(MemoryStore::new());
    let exchange = Exchange::new(GatewayConfig::default(), store, ledger.clone(), Arc::new(LogNotifier));
    let h = Harness::new();

    let err = exchange
        .place_order(h.request(GOLD_USD, OrderType::Buy, "1", 4, "bob"))
        .await
        .unwrap_err();
    assert_eq!(order_error(err), OrderError::OperatorNotReady);
    assert!(!exchange.is_operator_ready().await.unwrap());

    ledger.mark_operator_stable();
    assert!(exchange.is_operator_ready().await.unwrap());
}

#[tokio::test]
async fn test_request_validation() {
    let h = Harness::new();

    let err = h
        .exchange
        .place_order(h.request(PairId::new(99), OrderType::Buy, "1", 4, "bob"))
        .await
        .unwrap_err();
    assert_eq!(order_error(err), OrderError::PairNotFound { pair_id: PairId::new(99) });

    let err = h
        .exchange
        .place_order(h.request(GOLD_USD, OrderType::Buy, "1", 0, "bob"))
        .await
        .unwrap_err();
    assert!(matches!(order_error(err), OrderError::InvalidAmount(_)));

    let err = h
        .exchange
        .place_order(h.request(GOLD_USD, OrderType::Buy, "0", 4, "bob"))
        .await
        .unwrap_err();
    assert!(matches!(order_error(err), OrderError::InvalidPrice(_)));

    // below the pair's price step of 0.01
    let err = h
        .exchange
        .place_order(h.request(GOLD_USD, OrderType::Buy, "0.001", 4, "bob"))
        .await
        .unwrap_err();
    assert!(matches!(order_error(err), OrderError::InvalidPrice(_)));

    let mut cheap = h.request(GOLD_USD, OrderType::Buy, "1", 4, "bob");
    cheap.fee = 999;
    let err = h.exchange.place_order(cheap).await.unwrap_err();
    assert_eq!(order_error(err), OrderError::FeeBelowMinimum { fee: 999, min_fee: 1000 });

    let mut to_operator = h.request(GOLD_USD, OrderType::Buy, "1", 4, "bob");
    to_operator.destination_address = Address::from(OPERATOR);
    let err = h.exchange.place_order(to_operator).await.unwrap_err();
    assert!(matches!(order_error(err), OrderError::InvalidDestination { .. }));
}

#[tokio::test]
async fn test_delisted_pair_and_increment() {
    let h = Harness::new();
    h.store
        .insert_pair(TradingPair {
            pair_id: PairId::new(3),
            asset1: gold(),
            asset2: usd(),
            price_multiplier: 1,
            amount_increment: 10,
            delisted: true,
        })
        .unwrap();
    h.store
        .insert_pair(TradingPair {
            pair_id: PairId::new(4),
            asset1: gold(),
            asset2: usd(),
            price_multiplier: 1,
            amount_increment: 10,
            delisted: false,
        })
        .unwrap();

    let err = h
        .exchange
        .place_order(h.request(PairId::new(3), OrderType::Sell, "1", 20, "alice"))
        .await
        .unwrap_err();
    assert_eq!(order_error(err), OrderError::PairDelisted { pair_id: PairId::new(3) });

    let err = h
        .exchange
        .place_order(h.request(PairId::new(4), OrderType::Sell, "1", 25, "alice"))
        .await
        .unwrap_err();
    assert_eq!(
        order_error(err),
        OrderError::AmountIncrement {
            amount: 25,
            increment: 10
        }
    );
}

#[test]
fn test_quote_counts_lots() {
    let q = quote(100, 1000);
    assert_eq!(q.lots, 3);
    assert_eq!(q.total_fee, 3000);
}
