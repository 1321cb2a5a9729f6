use log::trace;
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{NewOrder, Order, OrderId, OrderItem, OrderStatusType, TxnRef},
    order_objects::OrderQueryFilter,
    traits::OrderStoreError,
};

/// Inserts a new order row using the given connection. This is not atomic on its own; embed the
/// call inside a transaction together with [`insert_order_items`] and pass `&mut *tx` as the
/// connection argument.
pub async fn insert_order(order: &NewOrder, conn: &mut SqliteConnection) -> Result<Order, OrderStoreError> {
    let inserted = sqlx::query_as(
        r#"
            INSERT INTO orders (
                order_id,
                user_id,
                name,
                email,
                phone,
                province,
                address,
                note,
                payment_method,
                total_price,
                currency,
                txn_ref,
                status
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *;
        "#,
    )
    .bind(order.order_id.as_str())
    .bind(&order.user_id)
    .bind(&order.shipping.name)
    .bind(&order.shipping.email)
    .bind(&order.shipping.phone)
    .bind(&order.shipping.province)
    .bind(&order.shipping.address)
    .bind(&order.shipping.note)
    .bind(order.payment_method.to_string())
    .bind(order.total_price)
    .bind(&order.currency)
    .bind(order.txn_ref.as_ref().map(|t| t.as_str().to_string()))
    .bind(order.status.to_string())
    .fetch_one(conn)
    .await?;
    Ok(inserted)
}

pub async fn insert_order_items(
    order_id: &OrderId,
    order: &NewOrder,
    conn: &mut SqliteConnection,
) -> Result<(), OrderStoreError> {
    for item in &order.items {
        sqlx::query(
            "INSERT INTO order_items (order_id, product_id, quantity, unit_price) VALUES ($1, $2, $3, $4)",
        )
        .bind(order_id.as_str())
        .bind(&item.product_id)
        .bind(item.quantity)
        .bind(item.unit_price)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

pub async fn fetch_order_by_order_id(
    order_id: &OrderId,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order =
        sqlx::query_as("SELECT * FROM orders WHERE order_id = $1").bind(order_id.as_str()).fetch_optional(conn).await?;
    Ok(order)
}

/// Returns the order carrying the given transaction reference, if any. `txn_ref` is unique across
/// orders, so at most one row matches.
pub async fn fetch_order_by_txn_ref(txn_ref: &TxnRef, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order =
        sqlx::query_as("SELECT * FROM orders WHERE txn_ref = $1").bind(txn_ref.as_str()).fetch_optional(conn).await?;
    Ok(order)
}

pub async fn fetch_order_items(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<Vec<OrderItem>, sqlx::Error> {
    let items = sqlx::query_as("SELECT * FROM order_items WHERE order_id = $1 ORDER BY id ASC")
        .bind(order_id.as_str())
        .fetch_all(conn)
        .await?;
    Ok(items)
}

pub async fn fetch_orders_for_user(user_id: &str, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let orders = sqlx::query_as("SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at ASC")
        .bind(user_id)
        .fetch_all(conn)
        .await?;
    Ok(orders)
}

/// Fetches orders according to criteria specified in the `OrderQueryFilter`.
///
/// Resulting orders are ordered by `created_at` in ascending order.
pub async fn search_orders(query: OrderQueryFilter, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let mut builder = QueryBuilder::new(
        r#"
    SELECT * FROM orders
    "#,
    );
    if !query.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(user_id) = query.user_id {
        where_clause.push("user_id = ");
        where_clause.push_bind_unseparated(user_id);
    }
    if let Some(method) = query.payment_method {
        where_clause.push("payment_method = ");
        where_clause.push_bind_unseparated(method.to_string());
    }
    if query.status.as_ref().map(|s| !s.is_empty()).unwrap_or(false) {
        let mut statuses = vec![];
        query.status.as_ref().unwrap().iter().for_each(|s| {
            statuses.push(format!("'{s}'"));
        });
        let status_clause = statuses.join(",");
        where_clause.push(format!("status IN ({status_clause})"));
    }
    if let Some(since) = query.since {
        where_clause.push("created_at >= ");
        where_clause.push_bind_unseparated(since);
    }
    if let Some(until) = query.until {
        where_clause.push("created_at <= ");
        where_clause.push_bind_unseparated(until);
    }
    builder.push(" ORDER BY created_at ASC");

    trace!("📝️ Executing query: {}", builder.sql());
    let query = builder.build_query_as::<Order>();
    let orders = query.fetch_all(conn).await?;
    trace!("📝️ Result of search_orders: {:?}", orders.len());
    Ok(orders)
}

/// Conditionally moves the order's status from `expected` to `new`.
///
/// The `WHERE status = expected` guard makes the update a compare-and-swap: of any number of
/// concurrent callers, exactly one observes a row change and receives the updated order. The rest
/// get `None` and must re-read to find out what happened.
pub async fn update_status_cas(
    id: i64,
    expected: OrderStatusType,
    new: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    // fetch_all drains the statement, so the write is fully committed before the row is returned
    // and the next read on any pooled connection observes the new status.
    let mut rows: Vec<Order> = sqlx::query_as(
        "UPDATE orders SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 AND status = $3 RETURNING *",
    )
    .bind(new.to_string())
    .bind(id)
    .bind(expected.to_string())
    .fetch_all(conn)
    .await?;
    Ok(rows.pop())
}
