use crate::{db_types::Product, traits::OrderStoreError};

/// The authoritative product price source used to recompute order totals server-side.
///
/// Callers must treat the catalog as a remote collaborator: wrap calls in a bounded timeout and
/// leave the order un-created if the catalog does not answer in time.
#[allow(async_fn_in_trait)]
pub trait ProductCatalog {
    async fn fetch_product(&self, product_id: &str) -> Result<Option<Product>, OrderStoreError>;

    /// Inserts or replaces a catalog entry. Primarily used by provisioning and test setup.
    async fn upsert_product(&self, id: &str, name: &str, price: psg_common::Vnd) -> Result<Product, OrderStoreError>;
}
