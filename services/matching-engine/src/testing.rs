use chrono::{DateTime, Duration, TimeZone, Utc};
use types::ids::{Address, DeviceAddress, OrderId, OutputRef, PairId, UnitId};
use types::numeric::{Amount, IntPrice};
use types::order::{Order, OrderDraft, OrderType};

fn epoch() -> DateTime<Utc> {
    Utc.timestamp_opt(1_700_000_000, 0).single().unwrap()
}

/// Active order whose creation time follows its id.
pub fn order(id: u64, order_type: OrderType, amount: Amount, int_price: IntPrice, fee: Amount) -> Order {
    let funding = OutputRef::new(UnitId::new(format!("unit{}", id)), 0, 0);
    let mut order = Order::from_draft(
        OrderId::new(id),
        OrderDraft {
            pair_id: PairId::new(1),
            order_type,
            order_address: Address::new(format!("ESCROW{}", id)),
            owner_address: Address::new(format!("OWNER{}", id)),
            device_address: DeviceAddress::new(format!("DEVICE{}", id % 3)),
            amount,
            counter_amount: amount * int_price,
            price: int_price.into(),
            int_price,
            fee,
            funding: funding.clone(),
            fee_funding: funding,
        },
        epoch() + Duration::seconds(id as i64),
    );
    order.activate().unwrap();
    order
}

pub fn buy(id: u64, amount: Amount, int_price: IntPrice) -> Order {
    order(id, OrderType::Buy, amount, int_price, 1000)
}

pub fn sell(id: u64, amount: Amount, int_price: IntPrice) -> Order {
    order(id, OrderType::Sell, amount, int_price, 1000)
}

pub fn ids(orders: &[Order]) -> Vec<u64> {
    orders.iter().map(|o| o.order_id.get()).collect()
}
