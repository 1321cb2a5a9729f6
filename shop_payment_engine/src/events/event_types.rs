use serde::{Deserialize, Serialize};

use crate::db_types::Order;

/// Fired exactly once per order, when its status transitions to `Paid`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderPaidEvent {
    pub order: Order,
}

impl OrderPaidEvent {
    pub fn new(order: Order) -> Self {
        Self { order }
    }
}

/// Fired when the gateway reports a failed payment and the order transitions to `PaymentFailed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentFailedEvent {
    pub order: Order,
}

impl PaymentFailedEvent {
    pub fn new(order: Order) -> Self {
        Self { order }
    }
}

#[cfg(test)]
mod test {
    use chrono::{TimeZone, Utc};
    use psg_common::Vnd;

    use super::*;
    use crate::db_types::{OrderId, OrderStatusType, PaymentMethod, ShippingInfo, TxnRef};

    fn order() -> Order {
        Order {
            id: 1,
            order_id: OrderId("PSG240601000001".to_string()),
            user_id: "alice".to_string(),
            shipping: ShippingInfo {
                name: "Nguyễn Văn A".to_string(),
                email: "a@example.com".to_string(),
                phone: "0901234567".to_string(),
                province: "Hà Nội".to_string(),
                address: "1 Tràng Tiền".to_string(),
                note: None,
            },
            payment_method: PaymentMethod::BankTransfer,
            total_price: Vnd::from(1_100_000),
            currency: "VND".to_string(),
            txn_ref: Some(TxnRef("240601133000123456".to_string())),
            status: OrderStatusType::Paid,
            created_at: Utc.with_ymd_and_hms(2024, 6, 1, 13, 30, 0).unwrap(),
            updated_at: Utc.with_ymd_and_hms(2024, 6, 1, 13, 35, 0).unwrap(),
        }
    }

    #[test]
    fn events_compare_by_their_order() {
        let ev = OrderPaidEvent::new(order());
        assert_eq!(ev, ev.clone());
        let mut other = order();
        other.status = OrderStatusType::PaymentFailed;
        assert_ne!(ev, OrderPaidEvent::new(other.clone()));
        assert_eq!(PaymentFailedEvent::new(other.clone()), PaymentFailedEvent::new(other));
    }
}
