use std::net::IpAddr;

use actix_web::http::StatusCode;
use chrono::Utc;
use mockall::predicate::eq;
use payment_bridge_engine::{
    helpers::{sign_webhook_payload, SigningKey},
    order_types::{FinancialStatus, OrderId},
    OrderGatewayError,
};
use pgb_common::Secret;

use super::{
    helpers::{configure, guarded_post_request, order, post_request, signature_for, KEY_ID, SHOP},
    mocks::MockOrderGateway,
};
use crate::helpers::WebhookPeerGuard;

const PAID_BODY: &str = r#"{"customReference":"5001","amount":"65.00","currency":"USD"}"#;

fn signed_headers(body: &str) -> Vec<(&'static str, String)> {
    vec![("Fygaro-Signature", signature_for(body)), ("Fygaro-Key-Id", KEY_ID.to_string())]
}

/// A gateway that must not be touched at all
fn untouched_gateway() -> MockOrderGateway {
    let mut gateway = MockOrderGateway::new();
    gateway.expect_fetch_order().never();
    gateway.expect_record_paid_transaction().never();
    gateway
}

#[actix_web::test]
async fn webhook_records_payment() {
    let _ = env_logger::try_init().ok();
    let mut gateway = MockOrderGateway::new();
    gateway
        .expect_fetch_order()
        .with(eq(SHOP), eq(OrderId::from("5001")))
        .times(1)
        .returning(|_, _| Ok(order("5001", "50.00", FinancialStatus::Pending)));
    gateway
        .expect_record_paid_transaction()
        .with(eq(SHOP), eq(OrderId::from("5001")), eq("65.00"), eq("USD"))
        .times(1)
        .returning(|_, _, _, _| Ok(()));
    let res = post_request("/webhook", PAID_BODY, &signed_headers(PAID_BODY), configure(gateway)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body, "Webhook processed");
}

#[actix_web::test]
async fn webhook_redelivery_is_acknowledged() {
    let _ = env_logger::try_init().ok();
    let mut gateway = MockOrderGateway::new();
    gateway.expect_fetch_order().times(1).returning(|_, _| Ok(order("5001", "50.00", FinancialStatus::Paid)));
    gateway.expect_record_paid_transaction().never();
    let res = post_request("/webhook", PAID_BODY, &signed_headers(PAID_BODY), configure(gateway)).await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body, "Already processed");
}

#[actix_web::test]
async fn webhook_without_signature() {
    let _ = env_logger::try_init().ok();
    let res = post_request("/webhook", PAID_BODY, &[], configure(untouched_gateway())).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body, "Webhook failed");
}

#[actix_web::test]
async fn webhook_with_forged_signature() {
    let _ = env_logger::try_init().ok();
    let forger = SigningKey::new(KEY_ID, Secret::new("not-the-secret".to_string()));
    let forged = sign_webhook_payload(PAID_BODY.as_bytes(), &forger, Utc::now().timestamp()).unwrap();
    let headers = [("Fygaro-Signature", forged), ("Fygaro-Key-Id", KEY_ID.to_string())];
    let res = post_request("/webhook", PAID_BODY, &headers, configure(untouched_gateway())).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn webhook_with_tampered_body() {
    let _ = env_logger::try_init().ok();
    let tampered = PAID_BODY.replace("65.00", "6.50");
    let res = post_request("/webhook", &tampered, &signed_headers(PAID_BODY), configure(untouched_gateway())).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn webhook_with_unknown_key_id() {
    let _ = env_logger::try_init().ok();
    let headers = [("Fygaro-Signature", signature_for(PAID_BODY)), ("Fygaro-Key-Id", "kid-unknown".to_string())];
    let res = post_request("/webhook", PAID_BODY, &headers, configure(untouched_gateway())).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn webhook_without_reference() {
    let _ = env_logger::try_init().ok();
    let res = post_request("/webhook", "{}", &signed_headers("{}"), configure(untouched_gateway())).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body, "Webhook failed");
}

#[actix_web::test]
async fn webhook_amount_mismatch() {
    let _ = env_logger::try_init().ok();
    let mut gateway = MockOrderGateway::new();
    gateway.expect_fetch_order().returning(|_, _| Ok(order("5001", "199.99", FinancialStatus::Pending)));
    gateway.expect_record_paid_transaction().never();
    let res = post_request("/webhook", PAID_BODY, &signed_headers(PAID_BODY), configure(gateway)).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn webhook_upstream_failure() {
    let _ = env_logger::try_init().ok();
    let mut gateway = MockOrderGateway::new();
    gateway.expect_fetch_order().returning(|_, _| Ok(order("5001", "50.00", FinancialStatus::Pending)));
    gateway
        .expect_record_paid_transaction()
        .times(1)
        .returning(|_, _, _, _| Err(OrderGatewayError::Upstream("503 Service Unavailable".into())));
    let res = post_request("/webhook", PAID_BODY, &signed_headers(PAID_BODY), configure(gateway)).await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.body, "Webhook failed");
}

#[actix_web::test]
async fn webhook_only_accepts_post() {
    let _ = env_logger::try_init().ok();
    let res = super::helpers::get_request("/webhook", configure(untouched_gateway())).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

fn proxied_guard(whitelisted: &str) -> WebhookPeerGuard {
    WebhookPeerGuard {
        use_x_forwarded_for: true,
        use_forwarded: false,
        whitelist: Some(vec![whitelisted.parse::<IpAddr>().unwrap()]),
    }
}

#[actix_web::test]
async fn webhook_from_spoofed_forwarded_for_is_forbidden() {
    let _ = env_logger::try_init().ok();
    let mut headers = signed_headers(PAID_BODY);
    // The caller prepends the whitelisted address; the proxy appends the caller's real one
    headers.push(("X-Forwarded-For", "203.0.113.7, 198.51.100.66".to_string()));
    let res = guarded_post_request(
        "/webhook",
        PAID_BODY,
        &headers,
        "10.0.0.2:8080",
        proxied_guard("203.0.113.7"),
        configure(untouched_gateway()),
    )
    .await;
    assert_eq!(res.status, StatusCode::FORBIDDEN);
    assert_eq!(res.body, "Forbidden");
}

#[actix_web::test]
async fn webhook_from_whitelisted_proxy_client_is_processed() {
    let _ = env_logger::try_init().ok();
    let mut gateway = MockOrderGateway::new();
    gateway.expect_fetch_order().times(1).returning(|_, _| Ok(order("5001", "50.00", FinancialStatus::Paid)));
    gateway.expect_record_paid_transaction().never();
    let mut headers = signed_headers(PAID_BODY);
    headers.push(("X-Forwarded-For", "192.0.2.1, 203.0.113.7".to_string()));
    let res = guarded_post_request(
        "/webhook",
        PAID_BODY,
        &headers,
        "10.0.0.2:8080",
        proxied_guard("203.0.113.7"),
        configure(gateway),
    )
    .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body, "Already processed");
}
