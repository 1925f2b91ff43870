mod common;

use common::*;
use contracts::events::LedgerEvent;
use gateway::events::run_event_loop;
use persistence::ExchangeStore;
use rust_decimal::Decimal;
use tokio::sync::mpsc;
use types::asset::Asset;
use types::deposit::ExpectedDepositDraft;
use types::escrow::{EscrowDefinition, ReclaimBranch, SettleBranch};
use types::ids::{Address, PairId};
use types::order::OrderType;

#[tokio::test]
async fn test_events_drive_funding_activation_and_settlement() {
    let h = Harness::new();
    let sell = h.place(GOLD_USD, OrderType::Sell, "10", 16, "alice").await;
    let buy = h.place(GOLD_USD, OrderType::Buy, "10", 16, "bob").await;

    let (events_tx, events_rx) = mpsc::channel(16);
    let (fatal_tx, mut fatal_rx) = mpsc::channel(1);
    let event_loop = tokio::spawn(run_event_loop(h.exchange.clone(), events_rx, fatal_tx));

    let mut units = Vec::new();
    for placed in [&sell, &buy] {
        let payments = placed
            .lots
            .iter()
            .flat_map(|lot| lot.payments.iter())
            .map(|p| (p.address.clone(), p.asset.clone(), p.amount))
            .collect();
        units.push(h.ledger.submit_payment(payments));
    }
    events_tx
        .send(LedgerEvent::NewTransactions { units: units.clone() })
        .await
        .unwrap();
    let mci = h.ledger.stabilize(&units);
    events_tx.send(LedgerEvent::Stabilized { mci }).await.unwrap();
    drop(events_tx);

    event_loop.await.unwrap();
    assert!(fatal_rx.try_recv().is_err());
    assert_eq!(h.store.deals().unwrap().len(), 1);
    assert!(h.active(GOLD_USD).is_empty());
    assert_eq!(h.ledger.balance(&address("bob"), &gold()), 16);
}

#[tokio::test]
async fn test_invariant_violation_reaches_fatal_channel() {
    let h = Harness::new();
    let ghost_pair = PairId::new(77);
    let order_address = Address::from("GHOST-ESCROW");
    h.store
        .insert_expected_deposit(ExpectedDepositDraft {
            pair_id: ghost_pair,
            order_type: OrderType::Buy,
            price: Decimal::from(1),
            int_price: 1,
            device_address: device("ghost"),
            order_address: order_address.clone(),
            asset_expected_in: Asset::Base,
            in_amount: 10,
            escrow: EscrowDefinition {
                reclaim: ReclaimBranch {
                    owner: address("ghost"),
                    timestamp_oracle: Address::from("TIMESTAMPER"),
                    release_after: 1,
                },
                settle: SettleBranch {
                    operator: Address::from(OPERATOR),
                    out_asset: gold(),
                    out_amount: 10,
                    beneficiary: address("ghost"),
                },
            },
        })
        .unwrap();

    let (events_tx, events_rx) = mpsc::channel(16);
    let (fatal_tx, mut fatal_rx) = mpsc::channel(1);
    let event_loop = tokio::spawn(run_event_loop(h.exchange.clone(), events_rx, fatal_tx));

    let unit = h.ledger.submit_payment(vec![(order_address, Asset::Base, 1010)]);
    events_tx
        .send(LedgerEvent::NewTransactions { units: vec![unit.clone()] })
        .await
        .unwrap();
    let mci = h.ledger.stabilize(&[unit]);
    events_tx.send(LedgerEvent::Stabilized { mci }).await.unwrap();

    let fatal = fatal_rx.recv().await.unwrap();
    assert!(fatal.is_fatal());
    event_loop.await.unwrap();
}
