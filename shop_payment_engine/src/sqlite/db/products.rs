use psg_common::Vnd;
use sqlx::SqliteConnection;

use crate::db_types::Product;

pub async fn fetch_product(product_id: &str, conn: &mut SqliteConnection) -> Result<Option<Product>, sqlx::Error> {
    let product =
        sqlx::query_as("SELECT * FROM products WHERE id = $1").bind(product_id).fetch_optional(conn).await?;
    Ok(product)
}

pub async fn upsert_product(
    id: &str,
    name: &str,
    price: Vnd,
    conn: &mut SqliteConnection,
) -> Result<Product, sqlx::Error> {
    let product = sqlx::query_as(
        r#"
            INSERT INTO products (id, name, price) VALUES ($1, $2, $3)
            ON CONFLICT (id) DO UPDATE SET name = excluded.name, price = excluded.price,
              updated_at = CURRENT_TIMESTAMP
            RETURNING *;
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(price)
    .fetch_one(conn)
    .await?;
    Ok(product)
}
