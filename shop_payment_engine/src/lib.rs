//! PC Shop Payment Engine
//!
//! The payment engine holds the core logic for recording orders and reconciling their payment
//! outcome. It is storage-agnostic: backends implement the traits in [`mod@traits`] (SQLite is the
//! bundled implementation) and the public API in [`mod@api`] drives the flows on top of them.
//!
//! The two halves of the public API are:
//! 1. [`OrderApi`] — the storefront façade: create orders with server-side price recomputation,
//!    build VNPay payment intents, run the admin status transitions and the read-only projections.
//! 2. [`ReconcilerApi`] — the reconciliation state machine. Both gateway notification channels (the
//!    browser Return and the server-to-server IPN) funnel into a single verify → lookup → compare →
//!    compare-and-swap pipeline so that an order's terminal payment state is decided exactly once,
//!    no matter how often or in which order the notifications arrive.
//!
//! The engine also emits an [`events::OrderPaidEvent`] whenever an order transitions to `Paid`, so
//! that fulfilment or notification jobs can hook in without touching the payment flow itself.
mod api;

pub mod db_types;
pub mod events;
pub mod helpers;
pub mod order_objects;
#[cfg(feature = "sqlite")]
pub mod test_utils;
pub mod traits;
pub mod vnpay;

#[cfg(feature = "sqlite")]
mod sqlite;

pub use api::{
    errors::{OrderApiError, ReconcileError},
    order_api::OrderApi,
    reconciler_api::{ReconcileSuccess, ReconcilerApi, RESPONSE_CODE_SUCCESS},
};
#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
