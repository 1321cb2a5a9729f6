use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use psg_common::{Vnd, VND_CURRENCY_CODE};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

//--------------------------------------   OrderStatusType     -------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum OrderStatusType {
    /// A cash-on-delivery order that has been placed but not handled yet.
    Created,
    /// A bank-transfer order whose payment intent has been issued. The buyer may or may not have
    /// been redirected to the gateway yet.
    AwaitingPayment,
    /// The gateway reported a successful payment for the order.
    Paid,
    /// The gateway reported a failed or abandoned payment.
    PaymentFailed,
    /// The order was cancelled by an administrator.
    Cancelled,
    /// The order has been shipped/handed over.
    Fulfilled,
}

impl OrderStatusType {
    /// Terminal states of the payment workflow. Once an order is terminal, no payment callback may
    /// move it again.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, OrderStatusType::Created | OrderStatusType::AwaitingPayment)
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Created => write!(f, "Created"),
            OrderStatusType::AwaitingPayment => write!(f, "AwaitingPayment"),
            OrderStatusType::Paid => write!(f, "Paid"),
            OrderStatusType::PaymentFailed => write!(f, "PaymentFailed"),
            OrderStatusType::Cancelled => write!(f, "Cancelled"),
            OrderStatusType::Fulfilled => write!(f, "Fulfilled"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid conversion: {0}")]
pub struct ConversionError(pub String);

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Created" => Ok(Self::Created),
            "AwaitingPayment" => Ok(Self::AwaitingPayment),
            "Paid" => Ok(Self::Paid),
            "PaymentFailed" => Ok(Self::PaymentFailed),
            "Cancelled" => Ok(Self::Cancelled),
            "Fulfilled" => Ok(Self::Fulfilled),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

//--------------------------------------    PaymentMethod      -------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum PaymentMethod {
    CashOnDelivery,
    BankTransfer,
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMethod::CashOnDelivery => write!(f, "CashOnDelivery"),
            PaymentMethod::BankTransfer => write!(f, "BankTransfer"),
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "CashOnDelivery" | "cod" => Ok(Self::CashOnDelivery),
            "BankTransfer" | "bank" => Ok(Self::BankTransfer),
            s => Err(ConversionError(format!("Invalid payment method: {s}"))),
        }
    }
}

//--------------------------------------        OrderId        -------------------------------------------------------
/// The public identifier of an order. Assigned once at creation and immutable thereafter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct OrderId(pub String);

impl FromStr for OrderId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for OrderId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl OrderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------        TxnRef         -------------------------------------------------------
/// The transaction reference correlating a bank-transfer order with its payment intent. It is the
/// join key between the Return and IPN notification channels and the order record, so it must be
/// unique across all orders and stable for the life of the order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
pub struct TxnRef(pub String);

impl From<String> for TxnRef {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Display for TxnRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TxnRef {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------     ShippingInfo      -------------------------------------------------------
/// Delivery details captured at checkout. The fields are opaque strings as far as the engine is
/// concerned; they are validated for presence only.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct ShippingInfo {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub province: String,
    pub address: String,
    pub note: Option<String>,
}

impl ShippingInfo {
    pub fn missing_field(&self) -> Option<&'static str> {
        if self.name.trim().is_empty() {
            return Some("name");
        }
        if self.email.trim().is_empty() {
            return Some("email");
        }
        if self.phone.trim().is_empty() {
            return Some("phone");
        }
        if self.province.trim().is_empty() {
            return Some("province");
        }
        if self.address.trim().is_empty() {
            return Some("address");
        }
        None
    }
}

//--------------------------------------        Order          -------------------------------------------------------
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: i64,
    pub order_id: OrderId,
    pub user_id: String,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub shipping: ShippingInfo,
    pub payment_method: PaymentMethod,
    pub total_price: Vnd,
    pub currency: String,
    pub txn_ref: Option<TxnRef>,
    pub status: OrderStatusType,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------      OrderItem        -------------------------------------------------------
/// A line of an order. `unit_price` is the catalog price snapshotted at creation time and is never
/// recomputed from the live catalog.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: OrderId,
    pub product_id: String,
    pub quantity: i64,
    pub unit_price: Vnd,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrderItem {
    pub product_id: String,
    pub quantity: i64,
    pub unit_price: Vnd,
}

impl NewOrderItem {
    /// The line subtotal. Saturates on overflow; [`NewOrder::validate`] rejects any order whose
    /// exact total does not fit, so a saturated value never reaches the store.
    pub fn subtotal(&self) -> Vnd {
        self.unit_price.saturating_mul(self.quantity)
    }

    pub fn checked_subtotal(&self) -> Option<Vnd> {
        self.unit_price.checked_mul(self.quantity)
    }
}

//--------------------------------------       NewOrder        -------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_id: OrderId,
    pub user_id: String,
    pub shipping: ShippingInfo,
    pub payment_method: PaymentMethod,
    /// Priced line items. Unit prices have already been snapshotted from the catalog.
    pub items: Vec<NewOrderItem>,
    /// The server-side recomputed total. Client-submitted totals never reach this struct.
    pub total_price: Vnd,
    pub currency: String,
    pub txn_ref: Option<TxnRef>,
    pub status: OrderStatusType,
}

impl NewOrder {
    pub fn new(order_id: OrderId, user_id: String, shipping: ShippingInfo, payment_method: PaymentMethod) -> Self {
        Self {
            order_id,
            user_id,
            shipping,
            payment_method,
            items: Vec::new(),
            total_price: Vnd::default(),
            currency: VND_CURRENCY_CODE.to_string(),
            txn_ref: None,
            status: OrderStatusType::Created,
        }
    }

    pub fn with_items(mut self, items: Vec<NewOrderItem>) -> Self {
        self.total_price = items.iter().map(NewOrderItem::subtotal).fold(Vnd::default(), Vnd::saturating_add);
        self.items = items;
        self
    }

    /// Marks the order as a payment intent: `AwaitingPayment` with the assigned transaction
    /// reference.
    pub fn awaiting_payment(mut self, txn_ref: TxnRef) -> Self {
        self.txn_ref = Some(txn_ref);
        self.status = OrderStatusType::AwaitingPayment;
        self
    }

    /// Checks the structural invariants that must hold before anything is persisted.
    pub fn validate(&self) -> Result<(), String> {
        if self.items.is_empty() {
            return Err("order contains no items".to_string());
        }
        if let Some(item) = self.items.iter().find(|i| i.quantity <= 0) {
            return Err(format!("item {} has non-positive quantity {}", item.product_id, item.quantity));
        }
        let total = self
            .items
            .iter()
            .try_fold(Vnd::default(), |acc, item| item.checked_subtotal().and_then(|sub| acc.checked_add(sub)));
        if total.is_none() {
            return Err("order total cannot be represented in đồng".to_string());
        }
        if let Some(field) = self.shipping.missing_field() {
            return Err(format!("shipping field '{field}' is missing"));
        }
        Ok(())
    }
}

//--------------------------------------       Product         -------------------------------------------------------
/// A catalog entry. The `price` column is the authoritative unit price used to recompute order
/// totals server-side.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    pub price: Vnd,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
