use actix_web::http::StatusCode;

use super::helpers::get_request;
use crate::routes::health;

#[actix_web::test]
async fn health_check() {
    let _ = env_logger::try_init().ok();
    let res = get_request("/health", |cfg| {
        cfg.service(health);
    })
    .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body, "👍️\n");
}
