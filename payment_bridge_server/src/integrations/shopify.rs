//! [`OrderGateway`] implementation backed by the Shopify Admin API.
//!
//! Shop credentials come from the [`SessionStore`]. A `ShopifyApi` client is built per call from the stored session,
//! so a token that is replaced in the store takes effect on the next request.
use std::time::Duration;

use log::*;
use payment_bridge_engine::{
    order_types::{Address, FinancialStatus, NewOrder, Order, OrderId},
    OrderGateway,
    OrderGatewayError,
    SessionStore,
};
use shopify_tools::{
    data_objects::{CustomerRef, NewLineItem, ShopifyAddress},
    helpers::parse_order_id,
    NewShopifyOrder,
    NewShopifyTransaction,
    ShopifyApi,
    ShopifyApiError,
    ShopifyConfig as ShopifyApiConfig,
    ShopifyOrder,
};

#[derive(Clone)]
pub struct ShopifyOrderGateway<S> {
    sessions: S,
    api_version: String,
    request_timeout: Duration,
    gateway_name: String,
}

impl<S> ShopifyOrderGateway<S> {
    pub fn new(sessions: S, api_version: &str, request_timeout: Duration, gateway_name: &str) -> Self {
        Self {
            sessions,
            api_version: api_version.to_string(),
            request_timeout,
            gateway_name: gateway_name.to_string(),
        }
    }

    pub fn sessions(&self) -> &S {
        &self.sessions
    }
}

impl<S: SessionStore> ShopifyOrderGateway<S> {
    async fn api_for(&self, shop: &str) -> Result<ShopifyApi, OrderGatewayError> {
        let session = self
            .sessions
            .load(shop)
            .await
            .map_err(|e| OrderGatewayError::SessionStore(e.to_string()))?
            .ok_or_else(|| OrderGatewayError::NotAuthenticated(shop.to_string()))?;
        let config = ShopifyApiConfig::new(&session.shop, session.access_token, &self.api_version)
            .with_request_timeout(self.request_timeout);
        ShopifyApi::new(config).map_err(|e| OrderGatewayError::Upstream(e.to_string()))
    }
}

fn rest_order_id(order_id: &OrderId) -> Result<u64, OrderGatewayError> {
    parse_order_id(order_id.as_str()).ok_or_else(|| OrderGatewayError::NotFound(order_id.to_string()))
}

fn api_error(order_id: &OrderId, e: ShopifyApiError) -> OrderGatewayError {
    if e.is_not_found() {
        OrderGatewayError::NotFound(order_id.to_string())
    } else {
        OrderGatewayError::Upstream(e.to_string())
    }
}

impl<S: SessionStore> OrderGateway for ShopifyOrderGateway<S> {
    async fn create_order(&self, shop: &str, order: NewOrder) -> Result<Order, OrderGatewayError> {
        let api = self.api_for(shop).await?;
        let order = api.create_order(new_shopify_order(order)).await.map_err(|e| {
            warn!("🛍️ Could not create order on {shop}. {e}");
            OrderGatewayError::Upstream(e.to_string())
        })?;
        Ok(order_from_shopify(order))
    }

    async fn fetch_order(&self, shop: &str, order_id: &OrderId) -> Result<Order, OrderGatewayError> {
        let id = rest_order_id(order_id)?;
        let api = self.api_for(shop).await?;
        let order = api.get_order(id).await.map_err(|e| api_error(order_id, e))?;
        Ok(order_from_shopify(order))
    }

    async fn record_paid_transaction(
        &self,
        shop: &str,
        order_id: &OrderId,
        amount: &str,
        currency: &str,
    ) -> Result<(), OrderGatewayError> {
        let id = rest_order_id(order_id)?;
        let api = self.api_for(shop).await?;
        let transaction = NewShopifyTransaction::sale(amount, currency, &self.gateway_name);
        let tx = api.create_transaction(id, transaction).await.map_err(|e| api_error(order_id, e))?;
        info!("🛍️ Transaction {} ({} {} {}) recorded on order {order_id}", tx.id, tx.kind, tx.amount, tx.currency);
        Ok(())
    }

    async fn status_page_url(&self, shop: &str, order_id: &OrderId) -> Result<String, OrderGatewayError> {
        let id = rest_order_id(order_id)?;
        let api = self.api_for(shop).await?;
        api.fetch_order_status_page_url(id)
            .await
            .map_err(|e| api_error(order_id, e))?
            .ok_or_else(|| OrderGatewayError::NotFound(order_id.to_string()))
    }
}

//--------------------------------------   Conversions   ---------------------------------------------------------
fn to_shopify_address(a: Address) -> ShopifyAddress {
    ShopifyAddress {
        first_name: a.first_name,
        last_name: a.last_name,
        address1: a.address1,
        city: a.city,
        zip: a.zip,
        country: a.country,
        phone: a.phone,
    }
}

fn from_shopify_address(a: ShopifyAddress) -> Address {
    Address {
        first_name: a.first_name,
        last_name: a.last_name,
        address1: a.address1,
        city: a.city,
        zip: a.zip,
        country: a.country,
        phone: a.phone,
    }
}

pub fn new_shopify_order(order: NewOrder) -> NewShopifyOrder {
    let line_items =
        order.line_items.iter().map(|i| NewLineItem { variant_id: i.variant_id, quantity: i.quantity }).collect();
    NewShopifyOrder {
        email: order.email,
        shipping_address: order.shipping_address.map(to_shopify_address),
        billing_address: order.billing_address.map(to_shopify_address),
        note: order.note,
        customer: order.customer_id.map(|id| CustomerRef { id }),
        ..NewShopifyOrder::pending(line_items)
    }
}

pub fn order_from_shopify(order: ShopifyOrder) -> Order {
    let financial_status = order
        .financial_status
        .as_deref()
        .map(FinancialStatus::from)
        .unwrap_or_else(|| FinancialStatus::Other("unknown".into()));
    Order {
        id: OrderId::new(order.id.to_string()),
        name: Some(order.name).filter(|n| !n.is_empty()),
        total_price: order.total_price,
        currency: order.currency,
        financial_status,
        email: order.email,
        shipping_address: order.shipping_address.map(from_shopify_address),
        billing_address: order.billing_address.map(from_shopify_address),
        note: order.note,
    }
}

#[cfg(test)]
mod test {
    use payment_bridge_engine::{order_types::LineItem, MemorySessionStore};

    use super::*;

    fn gateway() -> ShopifyOrderGateway<MemorySessionStore> {
        ShopifyOrderGateway::new(MemorySessionStore::new(), "2026-01", Duration::from_secs(5), "fygaro")
    }

    #[test]
    fn convert_new_order() {
        let order = NewOrder {
            line_items: vec![LineItem { variant_id: 4455, quantity: 2 }],
            email: Some("buyer@example.com".into()),
            shipping_address: Some(Address { city: Some("Bridgetown".into()), ..Default::default() }),
            billing_address: None,
            note: Some("gift".into()),
            customer_id: Some(7102233411796),
        };
        let shopify = new_shopify_order(order);
        assert_eq!(shopify.financial_status, "pending");
        assert_eq!(shopify.line_items, vec![NewLineItem { variant_id: 4455, quantity: 2 }]);
        assert_eq!(shopify.customer, Some(CustomerRef { id: 7102233411796 }));
        let json = serde_json::to_value(&shopify).unwrap();
        assert_eq!(json["shipping_address"]["city"], "Bridgetown");
        assert!(json.get("billing_address").is_none());
    }

    #[test]
    fn convert_order() {
        let json = include_str!("../../../shopify_tools/src/test_assets/order1.json");
        let shopify: ShopifyOrder = serde_json::from_str(json).unwrap();
        let order = order_from_shopify(shopify);
        assert_eq!(order.id, OrderId::from("5887401345236"));
        assert_eq!(order.name.as_deref(), Some("#1042"));
        assert_eq!(order.total_price, "50.00");
        assert_eq!(order.financial_status, FinancialStatus::Pending);
        assert_eq!(order.shipping_address.unwrap().city.as_deref(), Some("Bridgetown"));

        let paid = ShopifyOrder { financial_status: Some("paid".into()), ..Default::default() };
        assert_eq!(order_from_shopify(paid).financial_status, FinancialStatus::Paid);
        let missing = ShopifyOrder::default();
        assert!(!order_from_shopify(missing).financial_status.is_pending());
    }

    #[tokio::test]
    async fn unknown_shops_are_not_authenticated() {
        let gateway = gateway();
        let err = gateway.fetch_order("nobody.myshopify.com", &OrderId::from("12")).await.unwrap_err();
        assert!(matches!(err, OrderGatewayError::NotAuthenticated(s) if s == "nobody.myshopify.com"));
        let err = gateway.status_page_url("nobody.myshopify.com", &OrderId::from("12")).await.unwrap_err();
        assert!(matches!(err, OrderGatewayError::NotAuthenticated(_)));
    }

    #[tokio::test]
    async fn non_numeric_order_ids_are_not_found() {
        let gateway = gateway();
        let err = gateway.fetch_order("nobody.myshopify.com", &OrderId::from("#1042")).await.unwrap_err();
        assert!(matches!(err, OrderGatewayError::NotFound(s) if s == "#1042"));
        let err = gateway
            .record_paid_transaction("nobody.myshopify.com", &OrderId::from("abc"), "65.00", "USD")
            .await
            .unwrap_err();
        assert!(matches!(err, OrderGatewayError::NotFound(_)));
    }
}
