use actix_web::http::StatusCode;
use chrono::{Duration, Utc};
use payment_bridge_engine::{
    helpers::verify_payment_request,
    order_types::{FinancialStatus, OrderId},
    OrderGatewayError,
};
use url::Url;

use super::{
    helpers::{configure, get_request, key_ring, order, BUTTON_URL, SHOP},
    mocks::MockOrderGateway,
};

#[actix_web::test]
async fn pay_redirects_to_gateway() {
    let _ = env_logger::try_init().ok();
    let mut gateway = MockOrderGateway::new();
    gateway
        .expect_create_order()
        .withf(|shop, order| {
            shop == SHOP &&
                order.line_items.len() == 1 &&
                order.line_items[0].variant_id == 4455 &&
                order.line_items[0].quantity == 2 &&
                order.email.as_deref() == Some("buyer@example.com")
        })
        .times(1)
        .returning(|_, _| Ok(order("5001", "50.00", FinancialStatus::Pending)));
    let res = get_request("/pay?variant_id=4455&quantity=2&email=buyer%40example.com", configure(gateway)).await;
    assert_eq!(res.status, StatusCode::FOUND);
    let location = Url::parse(&res.location.expect("No redirect location")).unwrap();
    assert!(location.as_str().starts_with(BUTTON_URL));
    let (_, token) = location.query_pairs().find(|(k, _)| k == "token").expect("No token in redirect");
    let claims = verify_payment_request(&token, key_ring().keys(), Duration::seconds(300), Utc::now()).unwrap();
    assert_eq!(claims.amount, "65.00");
    assert_eq!(claims.currency, "USD");
    assert_eq!(claims.order_reference, "5001");
}

#[actix_web::test]
async fn pay_with_line_item_list() {
    let _ = env_logger::try_init().ok();
    let mut gateway = MockOrderGateway::new();
    gateway
        .expect_create_order()
        .withf(|_, order| order.line_items.len() == 2 && order.line_items[1].variant_id == 12)
        .times(1)
        .returning(|_, _| Ok(order("5002", "250.00", FinancialStatus::Pending)));
    // [{"variant_id":11,"quantity":1},{"variant_id":12,"quantity":3}]
    let items = concat!(
        "%5B%7B%22variant_id%22%3A11%2C%22quantity%22%3A1%7D%2C",
        "%7B%22variant_id%22%3A12%2C%22quantity%22%3A3%7D%5D"
    );
    let res = get_request(&format!("/pay?line_items={items}"), configure(gateway)).await;
    assert_eq!(res.status, StatusCode::FOUND);
    assert!(res.location.unwrap().contains("token="));
}

#[actix_web::test]
async fn pay_with_invalid_input() {
    let _ = env_logger::try_init().ok();
    let paths = ["/pay", "/pay?variant_id=abc&quantity=1", "/pay?variant_id=4455&quantity=0", "/pay?line_items=%5B%5D"];
    for path in paths {
        let mut gateway = MockOrderGateway::new();
        gateway.expect_create_order().never();
        let res = get_request(path, configure(gateway)).await;
        assert_eq!(res.status, StatusCode::BAD_REQUEST, "{path}");
        assert_eq!(res.body, "Invalid payment request");
        assert!(res.location.is_none());
    }
}

#[actix_web::test]
async fn pay_for_unauthenticated_shop() {
    let _ = env_logger::try_init().ok();
    let mut gateway = MockOrderGateway::new();
    gateway
        .expect_create_order()
        .withf(|shop, _| shop == "other.myshopify.com")
        .returning(|shop, _| Err(OrderGatewayError::NotAuthenticated(shop.to_string())));
    let res = get_request("/pay?shop=other.myshopify.com&variant_id=1&quantity=1", configure(gateway)).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.body, "Shop not authenticated");
}

#[actix_web::test]
async fn pay_hides_upstream_errors() {
    let _ = env_logger::try_init().ok();
    let mut gateway = MockOrderGateway::new();
    gateway
        .expect_create_order()
        .returning(|_, _| Err(OrderGatewayError::Upstream("401 Invalid API key shpat_0123".into())));
    let res = get_request("/pay?variant_id=1&quantity=1", configure(gateway)).await;
    assert_eq!(res.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(res.body, "Payment initialization failed");
}

#[actix_web::test]
async fn confirm_redirects_to_status_page() {
    let _ = env_logger::try_init().ok();
    let mut gateway = MockOrderGateway::new();
    gateway
        .expect_status_page_url()
        .withf(|shop, id| shop == SHOP && id == &OrderId::from("5001"))
        .times(1)
        .returning(|_, _| Ok("https://endpoint-test.myshopify.com/7/orders/abc/authenticate".into()));
    let res = get_request("/confirm?customReference=5001", configure(gateway)).await;
    assert_eq!(res.status, StatusCode::FOUND);
    assert_eq!(res.location.as_deref(), Some("https://endpoint-test.myshopify.com/7/orders/abc/authenticate"));
}

#[actix_web::test]
async fn confirm_falls_back() {
    let _ = env_logger::try_init().ok();
    let mut gateway = MockOrderGateway::new();
    gateway.expect_status_page_url().never();
    let res = get_request("/confirm", configure(gateway)).await;
    assert_eq!(res.status, StatusCode::FOUND);
    assert_eq!(res.location.as_deref(), Some("https://endpoint-test.myshopify.com/account/orders"));

    let mut gateway = MockOrderGateway::new();
    gateway.expect_status_page_url().returning(|_, id| Err(OrderGatewayError::NotFound(id.to_string())));
    let res = get_request("/confirm?order_reference=999&shop=evil.example.com", configure(gateway)).await;
    assert_eq!(res.status, StatusCode::FOUND);
    assert_eq!(res.location.as_deref(), Some("https://endpoint-test.myshopify.com/account/orders"));
}
