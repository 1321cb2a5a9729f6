use mockall::mock;
use psg_common::Vnd;
use shop_payment_engine::{
    db_types::{NewOrder, Order, OrderId, OrderItem, OrderStatusType, Product, TxnRef},
    order_objects::OrderQueryFilter,
    traits::{OrderStore, OrderStoreError, ProductCatalog},
};

mock! {
    pub Backend {}
    impl OrderStore for Backend {
        async fn insert_order(&self, order: NewOrder) -> Result<Order, OrderStoreError>;
        async fn fetch_order_by_id(&self, order_id: &OrderId) -> Result<Option<Order>, OrderStoreError>;
        async fn fetch_order_by_txn_ref(&self, txn_ref: &TxnRef) -> Result<Option<Order>, OrderStoreError>;
        async fn fetch_order_items(&self, order_id: &OrderId) -> Result<Vec<OrderItem>, OrderStoreError>;
        async fn fetch_orders_for_user(&self, user_id: &str) -> Result<Vec<Order>, OrderStoreError>;
        async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderStoreError>;
        async fn update_order_status(
            &self,
            id: i64,
            expected: OrderStatusType,
            new: OrderStatusType,
        ) -> Result<Option<Order>, OrderStoreError>;
    }
    impl ProductCatalog for Backend {
        async fn fetch_product(&self, product_id: &str) -> Result<Option<Product>, OrderStoreError>;
        async fn upsert_product(&self, id: &str, name: &str, price: Vnd) -> Result<Product, OrderStoreError>;
    }
}
