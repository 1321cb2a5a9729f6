//! `SqliteDatabase` is the bundled storage backend of the payment engine.
//!
//! It implements [`OrderStore`] and [`ProductCatalog`] over a SQLite connection pool.
use std::fmt::Debug;

use log::*;
use psg_common::Vnd;
use sqlx::SqlitePool;

use super::db::{db_url, new_pool, orders, products};
use crate::{
    db_types::{NewOrder, Order, OrderId, OrderItem, OrderStatusType, Product, TxnRef},
    order_objects::OrderQueryFilter,
    traits::{OrderStore, OrderStoreError, ProductCatalog},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database api object using the database URL from the `PSG_DATABASE_URL`
    /// environment variable.
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        Self::new_with_url(&url, max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = new_pool(url, max_connections).await?;
        debug!("🗃️ Connected to database {url}");
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl OrderStore for SqliteDatabase {
    /// Stores the order and its items atomically.
    ///
    /// The order is validated first, and the uniqueness of `order_id` and `txn_ref` is checked
    /// inside the same transaction as the insert, so a duplicate can never be half-written.
    async fn insert_order(&self, order: NewOrder) -> Result<Order, OrderStoreError> {
        order.validate().map_err(OrderStoreError::ValidationError)?;
        let mut tx = self.pool.begin().await?;
        if orders::fetch_order_by_order_id(&order.order_id, &mut tx).await?.is_some() {
            return Err(OrderStoreError::OrderAlreadyExists(order.order_id));
        }
        if let Some(txn_ref) = &order.txn_ref {
            if orders::fetch_order_by_txn_ref(txn_ref, &mut tx).await?.is_some() {
                return Err(OrderStoreError::TxnRefAlreadyExists(txn_ref.clone()));
            }
        }
        let inserted = orders::insert_order(&order, &mut tx).await?;
        orders::insert_order_items(&inserted.order_id, &order, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order {} has been saved in the DB with id {}", inserted.order_id, inserted.id);
        Ok(inserted)
    }

    async fn fetch_order_by_id(&self, order_id: &OrderId) -> Result<Option<Order>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_order_id(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_order_by_txn_ref(&self, txn_ref: &TxnRef) -> Result<Option<Order>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_txn_ref(txn_ref, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_order_items(&self, order_id: &OrderId) -> Result<Vec<OrderItem>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let items = orders::fetch_order_items(order_id, &mut conn).await?;
        Ok(items)
    }

    async fn fetch_orders_for_user(&self, user_id: &str) -> Result<Vec<Order>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let result = orders::fetch_orders_for_user(user_id, &mut conn).await?;
        Ok(result)
    }

    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::search_orders(query, &mut conn).await?;
        Ok(orders)
    }

    async fn update_order_status(
        &self,
        id: i64,
        expected: OrderStatusType,
        new: OrderStatusType,
    ) -> Result<Option<Order>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let result = orders::update_status_cas(id, expected, new, &mut conn).await?;
        Ok(result)
    }
}

impl ProductCatalog for SqliteDatabase {
    async fn fetch_product(&self, product_id: &str) -> Result<Option<Product>, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let product = products::fetch_product(product_id, &mut conn).await?;
        Ok(product)
    }

    async fn upsert_product(&self, id: &str, name: &str, price: Vnd) -> Result<Product, OrderStoreError> {
        let mut conn = self.pool.acquire().await?;
        let product = products::upsert_product(id, name, price, &mut conn).await?;
        Ok(product)
    }
}
