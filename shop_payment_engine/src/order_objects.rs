use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db_types::{Order, OrderItem, OrderStatusType, PaymentMethod, ShippingInfo};

/// A single unpriced line of an incoming order. The unit price is looked up in the catalog
/// server-side; clients cannot supply prices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemRequest {
    pub product_id: String,
    pub quantity: i64,
}

/// An incoming checkout submission, before pricing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderRequest {
    /// Filled in from the caller's access token on authenticated routes; any client-supplied value
    /// is overwritten.
    #[serde(default)]
    pub user_id: String,
    pub items: Vec<ItemRequest>,
    pub shipping: ShippingInfo,
    pub payment_method: PaymentMethod,
}

/// An order together with its line items, as returned to API clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FullOrder {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderQueryFilter {
    pub user_id: Option<String>,
    pub payment_method: Option<PaymentMethod>,
    /// One or more statuses, expressed as a comma-separated list so that the filter can live in a
    /// URL query string, e.g. `status=Paid,Fulfilled`.
    #[serde(default, deserialize_with = "status_list", serialize_with = "status_list_ser")]
    pub status: Option<Vec<OrderStatusType>>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

fn status_list<'de, D>(d: D) -> Result<Option<Vec<OrderStatusType>>, D::Error>
where D: serde::Deserializer<'de> {
    let raw: Option<String> = Option::deserialize(d)?;
    match raw {
        None => Ok(None),
        Some(s) => s
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(|t| t.parse().map_err(serde::de::Error::custom))
            .collect::<Result<Vec<_>, _>>()
            .map(Some),
    }
}

fn status_list_ser<S>(v: &Option<Vec<OrderStatusType>>, s: S) -> Result<S::Ok, S::Error>
where S: serde::Serializer {
    match v {
        None => s.serialize_none(),
        Some(statuses) => {
            let joined = statuses.iter().map(ToString::to_string).collect::<Vec<_>>().join(",");
            s.serialize_some(&joined)
        },
    }
}

impl OrderQueryFilter {
    pub fn with_user_id(mut self, user_id: String) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_payment_method(mut self, method: PaymentMethod) -> Self {
        self.payment_method = Some(method);
        self
    }

    pub fn with_status(mut self, status: OrderStatusType) -> Self {
        self.status.get_or_insert_with(Vec::new).push(status);
        self
    }

    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.user_id.is_none() &&
            self.payment_method.is_none() &&
            self.status.is_none() &&
            self.since.is_none() &&
            self.until.is_none()
    }
}

impl Display for OrderQueryFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            return write!(f, "No filters.");
        }
        if let Some(user_id) = &self.user_id {
            write!(f, "user_id: {user_id}. ")?;
        }
        if let Some(method) = &self.payment_method {
            write!(f, "payment_method: {method}. ")?;
        }
        if let Some(statuses) = &self.status {
            let s = statuses.iter().map(ToString::to_string).collect::<Vec<_>>().join(",");
            write!(f, "status: [{s}]. ")?;
        }
        if let Some(since) = &self.since {
            write!(f, "since: {since}. ")?;
        }
        if let Some(until) = &self.until {
            write!(f, "until: {until}. ")?;
        }
        Ok(())
    }
}
