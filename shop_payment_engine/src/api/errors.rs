use psg_common::Vnd;
use thiserror::Error;

use crate::{
    db_types::{OrderId, OrderStatusType, TxnRef},
    traits::OrderStoreError,
};

#[derive(Debug, Clone, Error)]
pub enum OrderApiError {
    #[error(transparent)]
    StoreError(#[from] OrderStoreError),
    #[error("Product {0} does not exist in the catalog")]
    ProductNotFound(String),
    #[error("The catalog did not answer in time for product {0}")]
    CatalogTimeout(String),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderId),
    #[error("Illegal status transition: {from} -> {to}")]
    IllegalTransition { from: OrderStatusType, to: OrderStatusType },
}

/// Failures of the reconciliation pipeline. None of these mutate order state.
#[derive(Debug, Clone, Error)]
pub enum ReconcileError {
    /// The notification's signature did not verify against the shared secret. The event is
    /// untrusted and is dropped.
    #[error("Notification signature is invalid")]
    SignatureInvalid,
    /// The notification is missing a required parameter or carries one we cannot parse.
    #[error("Malformed notification: {0}")]
    MalformedNotification(String),
    /// No order carries the notification's transaction reference. Orders are never created from
    /// payment callbacks.
    #[error("No order found for transaction reference {0}")]
    OrderNotFound(TxnRef),
    /// The notification claims a different amount than the stored order.
    #[error("Amount mismatch for {txn_ref}: order total is {expected}, notification claims {actual} (gateway units)")]
    AmountMismatch { txn_ref: TxnRef, expected: Vnd, actual: i64 },
    /// The notification contradicts a previously recorded terminal outcome. The stored state is
    /// never overwritten; this is surfaced for manual operator review.
    #[error("Conflicting outcome for {txn_ref}: order is {stored}, notification claims {claimed}")]
    ReconciliationConflict { txn_ref: TxnRef, stored: OrderStatusType, claimed: OrderStatusType },
    #[error(transparent)]
    StoreError(#[from] OrderStoreError),
}
