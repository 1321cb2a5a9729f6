use thiserror::Error;

use crate::{
    db_types::{NewOrder, Order, OrderId, OrderItem, OrderStatusType, TxnRef},
    order_objects::OrderQueryFilter,
};

/// Durable storage of orders and their items; the single source of truth for order state.
#[allow(async_fn_in_trait)]
pub trait OrderStore {
    /// Validates and stores a new order together with its items in a single atomic transaction.
    ///
    /// Fails with [`OrderStoreError::ValidationError`] before anything is persisted if the order
    /// has no items, any quantity is non-positive, or a shipping field is missing.
    async fn insert_order(&self, order: NewOrder) -> Result<Order, OrderStoreError>;

    async fn fetch_order_by_id(&self, order_id: &OrderId) -> Result<Option<Order>, OrderStoreError>;

    /// Looks an order up by its transaction reference. This is the join point for both gateway
    /// notification channels.
    async fn fetch_order_by_txn_ref(&self, txn_ref: &TxnRef) -> Result<Option<Order>, OrderStoreError>;

    async fn fetch_order_items(&self, order_id: &OrderId) -> Result<Vec<OrderItem>, OrderStoreError>;

    async fn fetch_orders_for_user(&self, user_id: &str) -> Result<Vec<Order>, OrderStoreError>;

    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderStoreError>;

    /// Compare-and-swap on the order status.
    ///
    /// The update is applied iff the stored status still equals `expected`; otherwise `None` is
    /// returned and nothing changes. This is the sole serialization point for concurrent
    /// reconciliations, so the implementation must be linearizable per order (a conditional
    /// `UPDATE ... WHERE status = ?` satisfies this).
    async fn update_order_status(
        &self,
        id: i64,
        expected: OrderStatusType,
        new: OrderStatusType,
    ) -> Result<Option<Order>, OrderStoreError>;
}

#[derive(Debug, Clone, Error)]
pub enum OrderStoreError {
    #[error("Internal database error: {0}")]
    DatabaseError(String),
    #[error("Invalid order: {0}")]
    ValidationError(String),
    #[error("Cannot insert order, since it already exists: {0}")]
    OrderAlreadyExists(OrderId),
    #[error("Transaction reference {0} is already assigned to another order")]
    TxnRefAlreadyExists(TxnRef),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderId),
}

impl From<sqlx::Error> for OrderStoreError {
    fn from(e: sqlx::Error) -> Self {
        OrderStoreError::DatabaseError(e.to_string())
    }
}
