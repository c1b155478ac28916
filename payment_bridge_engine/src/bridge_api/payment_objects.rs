use std::str::FromStr;

use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use url::Url;

use crate::{
    bridge_api::errors::ReconciliationError,
    order_types::{Address, LineItem, NewOrder, OrderId},
};

/// The buyer-supplied parameters of a payment initiation request. Every field arrives as an untrusted string.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PaymentParams {
    pub shop: Option<String>,
    pub email: Option<String>,
    pub variant_id: Option<String>,
    pub quantity: Option<String>,
    /// JSON array of `{"variant_id": .., "quantity": ..}` objects. Takes precedence over `variant_id` and `quantity`.
    pub line_items: Option<String>,
    pub customer_id: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub address1: Option<String>,
    pub city: Option<String>,
    pub zip: Option<String>,
    pub country: Option<String>,
    pub phone: Option<String>,
    pub billing_first_name: Option<String>,
    pub billing_last_name: Option<String>,
    pub billing_address1: Option<String>,
    pub billing_city: Option<String>,
    pub billing_zip: Option<String>,
    pub billing_country: Option<String>,
    pub billing_phone: Option<String>,
    pub order_comment: Option<String>,
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().map(|s| s.trim()).filter(|s| !s.is_empty()).map(String::from)
}

fn positive_integer<T>(field: &str, value: &str) -> Result<T, ReconciliationError>
where T: FromStr + Default + PartialOrd {
    match value.trim().parse::<T>() {
        Ok(v) if v > T::default() => Ok(v),
        _ => Err(ReconciliationError::InvalidInput(format!("{field} must be a positive integer"))),
    }
}

impl PaymentParams {
    /// Builds the line items for the order, either from the `line_items` JSON list or from the single
    /// `variant_id`/`quantity` pair.
    pub fn line_items(&self) -> Result<Vec<LineItem>, ReconciliationError> {
        if let Some(json) = non_empty(&self.line_items) {
            let items: Vec<LineItem> = serde_json::from_str(&json)
                .map_err(|e| ReconciliationError::InvalidInput(format!("line_items is not a valid list. {e}")))?;
            if items.is_empty() {
                return Err(ReconciliationError::InvalidInput("line_items is empty".into()));
            }
            if items.iter().any(|i| i.variant_id == 0 || i.quantity == 0) {
                return Err(ReconciliationError::InvalidInput("line_items contains a zero variant or quantity".into()));
            }
            return Ok(items);
        }
        let variant_id = non_empty(&self.variant_id)
            .ok_or_else(|| ReconciliationError::InvalidInput("variant_id is required".into()))?;
        let quantity =
            non_empty(&self.quantity).ok_or_else(|| ReconciliationError::InvalidInput("quantity is required".into()))?;
        let variant_id = positive_integer::<u64>("variant_id", &variant_id)?;
        let quantity = positive_integer::<u32>("quantity", &quantity)?;
        Ok(vec![LineItem { variant_id, quantity }])
    }

    pub fn customer_id(&self) -> Result<Option<u64>, ReconciliationError> {
        non_empty(&self.customer_id).map(|id| positive_integer::<u64>("customer_id", &id)).transpose()
    }

    pub fn shipping_address(&self) -> Option<Address> {
        let address = Address {
            first_name: non_empty(&self.first_name),
            last_name: non_empty(&self.last_name),
            address1: non_empty(&self.address1),
            city: non_empty(&self.city),
            zip: non_empty(&self.zip),
            country: non_empty(&self.country),
            phone: non_empty(&self.phone),
        };
        (!address.is_empty()).then_some(address)
    }

    pub fn billing_address(&self) -> Option<Address> {
        let address = Address {
            first_name: non_empty(&self.billing_first_name),
            last_name: non_empty(&self.billing_last_name),
            address1: non_empty(&self.billing_address1),
            city: non_empty(&self.billing_city),
            zip: non_empty(&self.billing_zip),
            country: non_empty(&self.billing_country),
            phone: non_empty(&self.billing_phone),
        };
        (!address.is_empty()).then_some(address)
    }

    /// Validates the parameters and assembles the order to be created. No I/O happens here, so invalid input never
    /// reaches the order platform.
    pub fn to_new_order(&self) -> Result<NewOrder, ReconciliationError> {
        Ok(NewOrder {
            line_items: self.line_items()?,
            email: non_empty(&self.email),
            shipping_address: self.shipping_address(),
            billing_address: self.billing_address(),
            note: non_empty(&self.order_comment),
            customer_id: self.customer_id()?,
        })
    }

    pub fn shop(&self) -> Option<String> {
        non_empty(&self.shop)
    }
}

/// The result of a successful payment initiation.
#[derive(Debug, Clone)]
pub struct PaymentRedirect {
    pub order_id: OrderId,
    pub order_name: Option<String>,
    /// The normalized amount the gateway was asked to collect
    pub amount: String,
    pub currency: String,
    pub token: String,
    pub redirect_url: Url,
}

/// The parsed body of a gateway notification. Nothing in here is trusted until the delivery signature has been checked.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct WebhookPayload {
    #[serde(
        default,
        alias = "customReference",
        alias = "custom_reference",
        deserialize_with = "string_or_number"
    )]
    pub order_reference: Option<String>,
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub shop: Option<String>,
}

// Gateways are not consistent about echoing the reference back as a string
fn string_or_number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    match Option::<Value>::deserialize(d)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(de::Error::custom(format!("{other} is not a valid order reference"))),
    }
}

/// A raw webhook delivery: the exact body bytes that were signed, plus the signature headers.
#[derive(Debug, Clone)]
pub struct WebhookDelivery {
    pub body: Vec<u8>,
    pub signature: Option<String>,
    pub key_id: Option<String>,
}

impl WebhookDelivery {
    pub fn new<B: Into<Vec<u8>>>(body: B, signature: Option<String>, key_id: Option<String>) -> Self {
        Self { body: body.into(), signature, key_id }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// A paid transaction was recorded against the order.
    Recorded(OrderId),
    /// The order was no longer pending, so nothing was done.
    AlreadyProcessed(OrderId),
}
