//! # PC Shop payment gateway server
//! This module hosts the HTTP surface of the payment gateway. It is responsible for:
//! Accepting checkout submissions (cash-on-delivery and VNPay bank transfer).
//! Receiving the gateway's payment notifications on both channels (browser Return and IPN).
//! Exposing the order projections and the admin status transitions.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more
//! information.
//!
//! ## Routes
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/api/...`: The storefront and admin API. See [routes](routes/index.html).
//! * `/api/orders/vnpay_ipn`: The server-to-server notification endpoint the gateway calls.

pub mod auth;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod helpers;
pub mod middleware;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
