pub mod errors;
pub mod order_api;
pub mod reconciler_api;
