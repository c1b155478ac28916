use mockall::mock;
use payment_bridge_engine::{
    order_types::{NewOrder, Order, OrderId},
    OrderGateway,
    OrderGatewayError,
};

mock! {
    pub OrderGateway {}
    impl OrderGateway for OrderGateway {
        async fn create_order(&self, shop: &str, order: NewOrder) -> Result<Order, OrderGatewayError>;
        async fn fetch_order(&self, shop: &str, order_id: &OrderId) -> Result<Order, OrderGatewayError>;
        async fn record_paid_transaction(&self, shop: &str, order_id: &OrderId, amount: &str, currency: &str) -> Result<(), OrderGatewayError>;
        async fn status_page_url(&self, shop: &str, order_id: &OrderId) -> Result<String, OrderGatewayError>;
    }
}
