//! Provider-agnostic order types.
//!
//! Order platform adapters convert their own wire formats into these types at the boundary, so that the
//! reconciliation logic never has to deal with provider-specific representations (and in particular, never compares
//! raw status strings).
use std::fmt::Display;

use serde::{Deserialize, Serialize};

//--------------------------------------     OrderId       ---------------------------------------------------------
/// A tenant-scoped, opaque order identifier. This is also the `order_reference` that the payment gateway echoes back.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub String);

impl OrderId {
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OrderId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

//--------------------------------------  FinancialStatus  ---------------------------------------------------------
/// Where an order sits in the payment lifecycle. The order platform's record is the only source of truth for this
/// value; nothing is cached locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FinancialStatus {
    Pending,
    Paid,
    /// Any other state owned by the order platform (refunded, voided, partially paid etc.).
    Other(String),
}

impl FinancialStatus {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

impl From<&str> for FinancialStatus {
    fn from(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "pending" => Self::Pending,
            "paid" => Self::Paid,
            other => Self::Other(other.to_string()),
        }
    }
}

impl Display for FinancialStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => f.write_str("pending"),
            Self::Paid => f.write_str("paid"),
            Self::Other(s) => f.write_str(s),
        }
    }
}

//--------------------------------------      Orders       ---------------------------------------------------------
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub address1: Option<String>,
    pub city: Option<String>,
    pub zip: Option<String>,
    pub country: Option<String>,
    pub phone: Option<String>,
}

impl Address {
    pub fn is_empty(&self) -> bool {
        [&self.first_name, &self.last_name, &self.address1, &self.city, &self.zip, &self.country, &self.phone]
            .iter()
            .all(|f| f.is_none())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub variant_id: u64,
    pub quantity: u32,
}

/// An order as recorded by the order platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    /// Human-readable order name, e.g. "#1001"
    pub name: Option<String>,
    /// Decimal string with two fraction digits
    pub total_price: String,
    pub currency: String,
    pub financial_status: FinancialStatus,
    pub email: Option<String>,
    pub shipping_address: Option<Address>,
    pub billing_address: Option<Address>,
    pub note: Option<String>,
}

/// A request to create a new order. Orders are always created as `pending`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    pub line_items: Vec<LineItem>,
    pub email: Option<String>,
    pub shipping_address: Option<Address>,
    pub billing_address: Option<Address>,
    pub note: Option<String>,
    pub customer_id: Option<u64>,
}
