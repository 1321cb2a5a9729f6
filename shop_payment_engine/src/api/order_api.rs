use std::{fmt::Debug, time::Duration};

use log::*;

use crate::{
    api::errors::OrderApiError,
    db_types::{NewOrder, NewOrderItem, Order, OrderId, OrderStatusType, PaymentMethod},
    helpers::new_order_id,
    order_objects::{FullOrder, OrderQueryFilter, OrderRequest},
    traits::{OrderStore, OrderStoreError, ProductCatalog},
    vnpay::{intent, intent::PaymentIntent, VnPayConfig},
};

const DEFAULT_CATALOG_TIMEOUT: Duration = Duration::from_secs(5);

/// `OrderApi` is the storefront façade: order creation with server-side price recomputation,
/// payment-intent construction, the admin status transitions and the read-only projections.
pub struct OrderApi<B> {
    db: B,
    vnpay: VnPayConfig,
    catalog_timeout: Duration,
}

impl<B> Debug for OrderApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderApi")
    }
}

impl<B> OrderApi<B> {
    pub fn new(db: B, vnpay: VnPayConfig) -> Self {
        Self { db, vnpay, catalog_timeout: DEFAULT_CATALOG_TIMEOUT }
    }

    pub fn with_catalog_timeout(mut self, timeout: Duration) -> Self {
        self.catalog_timeout = timeout;
        self
    }
}

impl<B> OrderApi<B>
where B: OrderStore + ProductCatalog
{
    /// Prices the submitted items against the catalog, snapshotting the authoritative unit prices.
    ///
    /// Each lookup is bounded by the catalog timeout; if the catalog does not answer, the order is
    /// not created (no partial state exists at this point, nothing has been persisted).
    async fn price_items(&self, request: &OrderRequest) -> Result<Vec<NewOrderItem>, OrderApiError> {
        let mut items = Vec::with_capacity(request.items.len());
        for item in &request.items {
            let product = tokio::time::timeout(self.catalog_timeout, self.db.fetch_product(&item.product_id))
                .await
                .map_err(|_| {
                    warn!("📦️ Catalog lookup for {} timed out", item.product_id);
                    OrderApiError::CatalogTimeout(item.product_id.clone())
                })??
                .ok_or_else(|| OrderApiError::ProductNotFound(item.product_id.clone()))?;
            items.push(NewOrderItem {
                product_id: item.product_id.clone(),
                quantity: item.quantity,
                unit_price: product.price,
            });
        }
        Ok(items)
    }

    async fn full_order(&self, order: Order) -> Result<FullOrder, OrderApiError> {
        let items = self.db.fetch_order_items(&order.order_id).await?;
        Ok(FullOrder { order, items })
    }

    /// Creates a cash-on-delivery order in `Created` status.
    pub async fn create_order(&self, request: OrderRequest) -> Result<FullOrder, OrderApiError> {
        let items = self.price_items(&request).await?;
        let order = NewOrder::new(new_order_id(), request.user_id, request.shipping, request.payment_method)
            .with_items(items);
        order.validate().map_err(OrderStoreError::ValidationError)?;
        let order = self.db.insert_order(order).await?;
        debug!("📦️ Order {} created for user {} ({})", order.order_id, order.user_id, order.total_price);
        self.full_order(order).await
    }

    /// Creates a bank-transfer payment intent.
    ///
    /// The order is durably persisted in `AwaitingPayment` with its transaction reference before
    /// the redirect URL is returned; an IPN can therefore never arrive for an order that does not
    /// exist. If persistence fails, no URL is handed out and the buyer is not redirected.
    pub async fn create_payment_intent(
        &self,
        mut request: OrderRequest,
        client_ip: &str,
    ) -> Result<(FullOrder, PaymentIntent), OrderApiError> {
        request.payment_method = PaymentMethod::BankTransfer;
        let items = self.price_items(&request).await?;
        let txn_ref = intent::new_txn_ref();
        let order = NewOrder::new(new_order_id(), request.user_id, request.shipping, request.payment_method)
            .with_items(items)
            .awaiting_payment(txn_ref.clone());
        order.validate().map_err(OrderStoreError::ValidationError)?;
        let order = self.db.insert_order(order).await?;
        let redirect_url = intent::build_redirect_url(&self.vnpay, &order, &txn_ref, client_ip);
        info!("🏦️ Payment intent [{txn_ref}] created for order {} ({})", order.order_id, order.total_price);
        let full = self.full_order(order).await?;
        Ok((full, PaymentIntent { redirect_url, txn_ref }))
    }

    pub async fn order_with_items(&self, order_id: &OrderId) -> Result<Option<FullOrder>, OrderApiError> {
        match self.db.fetch_order_by_id(order_id).await? {
            Some(order) => Ok(Some(self.full_order(order).await?)),
            None => Ok(None),
        }
    }

    pub async fn orders_for_user(&self, user_id: &str) -> Result<Vec<Order>, OrderApiError> {
        Ok(self.db.fetch_orders_for_user(user_id).await?)
    }

    pub async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderApiError> {
        Ok(self.db.search_orders(query).await?)
    }

    /// Applies an administrator-initiated status change.
    ///
    /// Only the edges in this table are legal; everything else fails with `IllegalTransition`:
    ///
    /// | From    | To        |
    /// |---------|-----------|
    /// | Created | Fulfilled |
    /// | Created | Cancelled |
    /// | Paid    | Fulfilled |
    ///
    /// Payment-driven transitions (`AwaitingPayment` → `Paid`/`PaymentFailed`) belong exclusively
    /// to the reconciler and cannot be made here.
    pub async fn update_order_status(
        &self,
        order_id: &OrderId,
        new_status: OrderStatusType,
    ) -> Result<Order, OrderApiError> {
        let order = self
            .db
            .fetch_order_by_id(order_id)
            .await?
            .ok_or_else(|| OrderApiError::OrderNotFound(order_id.clone()))?;
        use OrderStatusType::*;
        let legal = matches!((order.status, new_status), (Created, Fulfilled) | (Created, Cancelled) | (Paid, Fulfilled));
        if !legal {
            return Err(OrderApiError::IllegalTransition { from: order.status, to: new_status });
        }
        match self.db.update_order_status(order.id, order.status, new_status).await? {
            Some(updated) => {
                info!("📦️ Admin moved order {} from {} to {}", updated.order_id, order.status, new_status);
                Ok(updated)
            },
            // Lost the race against a concurrent transition; report against the fresh status.
            None => {
                let fresh = self
                    .db
                    .fetch_order_by_id(order_id)
                    .await?
                    .ok_or_else(|| OrderApiError::OrderNotFound(order_id.clone()))?;
                Err(OrderApiError::IllegalTransition { from: fresh.status, to: new_status })
            },
        }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}
