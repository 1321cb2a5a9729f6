use std::collections::HashMap;

use log::*;

use crate::{
    api::errors::ReconcileError,
    db_types::{Order, OrderStatusType, TxnRef},
    events::{EventProducers, OrderPaidEvent, PaymentFailedEvent},
    traits::OrderStore,
    vnpay::{signing, VnPayConfig},
};

pub const RESPONSE_CODE_SUCCESS: &str = "00";

/// The two ways a notification can be absorbed without error.
#[derive(Debug, Clone)]
pub enum ReconcileSuccess {
    /// This notification moved the order out of `AwaitingPayment`. At most one notification per
    /// order ever gets this result.
    Transitioned(Order),
    /// The order had already reached the outcome this notification claims. Nothing changed.
    Duplicate(Order),
}

impl ReconcileSuccess {
    pub fn order(&self) -> &Order {
        match self {
            Self::Transitioned(order) | Self::Duplicate(order) => order,
        }
    }
}

/// `ReconcilerApi` absorbs gateway payment notifications and converges the order's status.
///
/// The browser return and the server-to-server IPN carry the same signed parameter set and arrive
/// in no particular order, possibly repeated. Both funnel through the same pipeline:
/// verify signature, look the order up by transaction reference, check the amount, then apply the
/// claimed outcome with a compare-and-set against `AwaitingPayment`. The compare-and-set is the
/// only write, so however many notifications race, exactly one transitions the order and the rest
/// resolve as duplicates or conflicts.
pub struct ReconcilerApi<B> {
    db: B,
    config: VnPayConfig,
    producers: EventProducers,
}

impl<B> ReconcilerApi<B>
where B: OrderStore
{
    pub fn new(db: B, config: VnPayConfig, producers: EventProducers) -> Self {
        Self { db, config, producers }
    }

    /// Handles the browser redirect back from the gateway.
    pub async fn handle_return(&self, params: &HashMap<String, String>) -> Result<ReconcileSuccess, ReconcileError> {
        self.reconcile(params, "return").await
    }

    /// Handles the server-to-server instant payment notification.
    pub async fn handle_ipn(&self, params: &HashMap<String, String>) -> Result<ReconcileSuccess, ReconcileError> {
        self.reconcile(params, "IPN").await
    }

    async fn reconcile(
        &self,
        params: &HashMap<String, String>,
        channel: &str,
    ) -> Result<ReconcileSuccess, ReconcileError> {
        if !signing::verify(params, self.config.hash_secret.reveal()) {
            warn!("🏦️ Rejecting {channel} notification with an invalid signature");
            return Err(ReconcileError::SignatureInvalid);
        }
        let txn_ref = params
            .get("vnp_TxnRef")
            .filter(|v| !v.is_empty())
            .map(|v| TxnRef(v.clone()))
            .ok_or_else(|| ReconcileError::MalformedNotification("vnp_TxnRef is missing".into()))?;
        let amount = params
            .get("vnp_Amount")
            .and_then(|v| v.parse::<i64>().ok())
            .ok_or_else(|| ReconcileError::MalformedNotification("vnp_Amount is missing or not an integer".into()))?;
        let response_code = params
            .get("vnp_ResponseCode")
            .cloned()
            .ok_or_else(|| ReconcileError::MalformedNotification("vnp_ResponseCode is missing".into()))?;

        let order = self
            .db
            .fetch_order_by_txn_ref(&txn_ref)
            .await?
            .ok_or_else(|| ReconcileError::OrderNotFound(txn_ref.clone()))?;

        if order.total_price.to_gateway_amount() != amount {
            warn!(
                "🏦️ Amount mismatch on {channel} notification [{txn_ref}]: order {} totals {}, gateway claims {amount}",
                order.order_id, order.total_price
            );
            return Err(ReconcileError::AmountMismatch { txn_ref, expected: order.total_price, actual: amount });
        }

        let claimed = if response_code == RESPONSE_CODE_SUCCESS {
            OrderStatusType::Paid
        } else {
            OrderStatusType::PaymentFailed
        };

        if order.status == OrderStatusType::AwaitingPayment {
            if let Some(updated) = self.db.update_order_status(order.id, OrderStatusType::AwaitingPayment, claimed).await?
            {
                info!(
                    "🏦️ {channel} notification [{txn_ref}] moved order {} to {claimed} (code {response_code})",
                    updated.order_id
                );
                self.fire_events(&updated).await;
                return Ok(ReconcileSuccess::Transitioned(updated));
            }
            // Lost the race: another notification got there first. Re-read and settle below.
            debug!("🏦️ {channel} notification [{txn_ref}] lost the transition race");
        }
        let order = self
            .db
            .fetch_order_by_txn_ref(&txn_ref)
            .await?
            .ok_or_else(|| ReconcileError::OrderNotFound(txn_ref.clone()))?;
        self.settle_repeat(order, claimed, &txn_ref, channel)
    }

    /// Resolves a notification for an order that is no longer awaiting payment. A repeat that
    /// agrees with the stored outcome is a harmless duplicate; a contradiction never overwrites
    /// the stored state and is flagged for the operator.
    fn settle_repeat(
        &self,
        order: Order,
        claimed: OrderStatusType,
        txn_ref: &TxnRef,
        channel: &str,
    ) -> Result<ReconcileSuccess, ReconcileError> {
        // A fulfilled order was necessarily paid first, so a retried success notification for it
        // is still just a repeat of the recorded outcome.
        let agrees = order.status == claimed
            || (order.status == OrderStatusType::Fulfilled && claimed == OrderStatusType::Paid);
        if agrees {
            debug!("🏦️ Duplicate {channel} notification [{txn_ref}] for order {}", order.order_id);
            return Ok(ReconcileSuccess::Duplicate(order));
        }
        error!(
            "🏦️ Conflicting {channel} notification [{txn_ref}]: order {} is {} but the gateway now claims {claimed}. \
             Keeping the stored state; this needs manual review.",
            order.order_id, order.status
        );
        Err(ReconcileError::ReconciliationConflict { txn_ref: txn_ref.clone(), stored: order.status, claimed })
    }

    async fn fire_events(&self, order: &Order) {
        match order.status {
            OrderStatusType::Paid => {
                for producer in &self.producers.order_paid_producer {
                    producer.publish_event(OrderPaidEvent::new(order.clone())).await;
                }
            },
            OrderStatusType::PaymentFailed => {
                for producer in &self.producers.payment_failed_producer {
                    producer.publish_event(PaymentFailedEvent::new(order.clone())).await;
                }
            },
            _ => {},
        }
    }
}
