//! Backend traits for the payment engine.
//!
//! A storage backend implements [`OrderStore`] (durable order records plus the compare-and-swap
//! status primitive) and [`ProductCatalog`] (the authoritative price source). The bundled
//! [`crate::SqliteDatabase`] implements both.
mod order_store;
mod product_catalog;

pub use order_store::{OrderStore, OrderStoreError};
pub use product_catalog::ProductCatalog;

/// A full engine backend: order storage plus the price catalog. Blanket-implemented, so any type
/// implementing both traits qualifies. Route definitions take a single backend bound, so the
/// handlers that need both traits name this one.
pub trait ShopBackend: OrderStore + ProductCatalog {}

impl<T: OrderStore + ProductCatalog> ShopBackend for T {}
