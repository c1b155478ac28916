use serde::{Deserialize, Serialize};

use crate::data_objects::{CustomerRef, NewLineItem, ShopifyAddress};

/// The subset of the REST `Order` resource that the bridge reads.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ShopifyOrder {
    pub id: u64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    pub currency: String,
    pub total_price: String,
    #[serde(default)]
    pub financial_status: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub shipping_address: Option<ShopifyAddress>,
    #[serde(default)]
    pub billing_address: Option<ShopifyAddress>,
    #[serde(default)]
    pub customer: Option<CustomerRef>,
}

/// Request body for `POST /orders.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewShopifyOrder {
    pub line_items: Vec<NewLineItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub financial_status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_address: Option<ShopifyAddress>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billing_address: Option<ShopifyAddress>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer: Option<CustomerRef>,
}

impl NewShopifyOrder {
    /// An order that Shopify will hold in `pending` until a transaction is recorded against it.
    pub fn pending(line_items: Vec<NewLineItem>) -> Self {
        Self {
            line_items,
            email: None,
            financial_status: "pending".to_string(),
            shipping_address: None,
            billing_address: None,
            note: None,
            customer: None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn deserialize_order() {
        let json = include_str!("./test_assets/order1.json");
        let order: ShopifyOrder = serde_json::from_str(json).unwrap();
        assert_eq!(order.id, 5887401345236);
        assert_eq!(order.name, "#1042");
        assert_eq!(order.total_price, "50.00");
        assert_eq!(order.currency, "USD");
        assert_eq!(order.financial_status.as_deref(), Some("pending"));
        let shipping = order.shipping_address.unwrap();
        assert_eq!(shipping.city.as_deref(), Some("Bridgetown"));
        assert_eq!(order.customer.unwrap().id, 7102233411796);
    }

    #[test]
    fn serialize_new_order() {
        let mut order = NewShopifyOrder::pending(vec![NewLineItem { variant_id: 4431, quantity: 2 }]);
        order.note = Some("Gift wrap please".into());
        let json = serde_json::to_value(&order).unwrap();
        assert_eq!(json["financial_status"], "pending");
        assert_eq!(json["line_items"][0]["variant_id"], 4431);
        assert_eq!(json["line_items"][0]["quantity"], 2);
        assert_eq!(json["note"], "Gift wrap please");
        assert!(json.get("email").is_none());
        assert!(json.get("customer").is_none());
    }
}
