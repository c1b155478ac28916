use actix_web::{
    body::MessageBody,
    dev::Service,
    http::{header, StatusCode},
    test,
    test::TestRequest,
    web,
    web::ServiceConfig,
    App,
    Error,
};
use chrono::Utc;
use futures::{future::ok, FutureExt};
use log::debug;
use payment_bridge_engine::{
    helpers::{sign_webhook_payload, KeyRing, SigningKey},
    order_types::{FinancialStatus, Order, OrderId},
    ReconciliationApi,
    ReconciliationConfig,
};
use pgb_common::Secret;
use url::Url;

use super::mocks::MockOrderGateway;
use crate::{
    config::ServerOptions,
    errors::ServerError,
    helpers::WebhookPeerGuard,
    routes::{ConfirmRoute, PayRoute, WebhookRoute},
};

pub const SHOP: &str = "endpoint-test.myshopify.com";
pub const BUTTON_URL: &str = "https://gateway.example/buttons/b-17";
pub const KEY_ID: &str = "kid-2026";

pub struct TestResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    pub body: String,
}

pub fn key_ring() -> KeyRing {
    KeyRing::new(SigningKey::new(KEY_ID, Secret::new("endpoint-test-secret".to_string())))
}

pub fn options() -> ServerOptions {
    ServerOptions {
        signature_header: "Fygaro-Signature".into(),
        key_id_header: "Fygaro-Key-Id".into(),
        confirm_fallback_url: None,
        default_shop: Some(SHOP.into()),
    }
}

pub fn order(id: &str, total: &str, status: FinancialStatus) -> Order {
    Order {
        id: OrderId::from(id),
        name: Some("#1001".into()),
        total_price: total.into(),
        currency: "USD".into(),
        financial_status: status,
        email: None,
        shipping_address: None,
        billing_address: None,
        note: None,
    }
}

/// Registers the bridge routes against the given mock gateway.
pub fn configure(gateway: MockOrderGateway) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg: &mut ServiceConfig| {
        let config = ReconciliationConfig::new(key_ring(), Url::parse(BUTTON_URL).unwrap()).with_default_shop(SHOP);
        cfg.app_data(web::Data::new(ReconciliationApi::new(gateway, config)))
            .app_data(web::Data::new(options()))
            .service(PayRoute::<MockOrderGateway>::new())
            .service(ConfirmRoute::<MockOrderGateway>::new())
            .service(WebhookRoute::<MockOrderGateway>::new());
    }
}

/// A valid signature header for `body`, signed now with the test key.
pub fn signature_for(body: &str) -> String {
    sign_webhook_payload(body.as_bytes(), key_ring().active(), Utc::now().timestamp()).unwrap()
}

pub async fn get_request(path: &str, configure: impl FnOnce(&mut ServiceConfig)) -> TestResponse {
    send(TestRequest::get().uri(path), configure).await
}

pub async fn post_request(
    path: &str,
    body: &str,
    headers: &[(&str, String)],
    configure: impl FnOnce(&mut ServiceConfig),
) -> TestResponse {
    let mut req = TestRequest::post().uri(path).set_payload(body.to_string());
    for (name, value) in headers {
        req = req.insert_header((*name, value.as_str()));
    }
    send(req, configure).await
}

/// Posts from `peer` through an app that is wrapped in the webhook peer guard, as the live server is.
pub async fn guarded_post_request(
    path: &str,
    body: &str,
    headers: &[(&str, String)],
    peer: &str,
    guard: WebhookPeerGuard,
    configure: impl FnOnce(&mut ServiceConfig),
) -> TestResponse {
    let mut req = TestRequest::post().uri(path).peer_addr(peer.parse().unwrap()).set_payload(body.to_string());
    for (name, value) in headers {
        req = req.insert_header((*name, value.as_str()));
    }
    let app = App::new()
        .wrap_fn(move |req, srv| {
            if !guard.allows(req.request()) {
                return ok::<_, Error>(req.error_response(ServerError::ForbiddenPeer)).boxed_local();
            }
            srv.call(req).map(|res| res.map(|r| r.map_into_boxed_body())).boxed_local()
        })
        .configure(configure);
    let service = test::init_service(app).await;
    let res = test::call_service(&service, req.to_request()).await;
    let status = res.status();
    let location = res.headers().get(header::LOCATION).and_then(|v| v.to_str().ok()).map(String::from);
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    TestResponse { status, location, body }
}

async fn send(req: TestRequest, configure: impl FnOnce(&mut ServiceConfig)) -> TestResponse {
    let app = App::new().configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    let res = test::call_service(&service, req.to_request()).await;
    let status = res.status();
    let location = res.headers().get(header::LOCATION).and_then(|v| v.to_str().ok()).map(String::from);
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    TestResponse { status, location, body }
}
