use thiserror::Error;

use crate::order_types::{NewOrder, Order, OrderId};

#[derive(Debug, Clone, Error)]
pub enum OrderGatewayError {
    #[error("No session exists for shop {0}")]
    NotAuthenticated(String),
    #[error("Order {0} was not found")]
    NotFound(String),
    #[error("The order platform call failed. {0}")]
    Upstream(String),
    #[error("Could not read the session store. {0}")]
    SessionStore(String),
}

/// All I/O against the external order platform, resolved per tenant (shop).
///
/// Every method looks up the session for `shop` first and fails with [`OrderGatewayError::NotAuthenticated`] if there
/// is none.
#[allow(async_fn_in_trait)]
pub trait OrderGateway {
    /// Creates a new order with a financial status of `pending`.
    async fn create_order(&self, shop: &str, order: NewOrder) -> Result<Order, OrderGatewayError>;

    async fn fetch_order(&self, shop: &str, order_id: &OrderId) -> Result<Order, OrderGatewayError>;

    /// Records a successful sale against the order, which moves it to `paid` on the order platform.
    ///
    /// This call is **not** idempotent. Callers must have confirmed that the order is still pending immediately
    /// beforehand.
    async fn record_paid_transaction(
        &self,
        shop: &str,
        order_id: &OrderId,
        amount: &str,
        currency: &str,
    ) -> Result<(), OrderGatewayError>;

    /// The customer-facing order status page. Fails with [`OrderGatewayError::NotFound`] if the order has none.
    async fn status_page_url(&self, shop: &str, order_id: &OrderId) -> Result<String, OrderGatewayError>;
}
