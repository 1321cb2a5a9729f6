use chrono::Utc;
use rand::Rng;

use crate::db_types::OrderId;

/// Generates a new public order identifier: a second-resolution timestamp plus a random suffix
/// wide enough to avoid collisions within the same second.
pub fn new_order_id() -> OrderId {
    let ts = Utc::now().format("%y%m%d%H%M%S");
    let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000);
    OrderId(format!("PSG{ts}{suffix:06}"))
}
