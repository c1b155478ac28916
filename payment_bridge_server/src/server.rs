use std::time::Duration;

use actix_web::{
    dev::{Server, Service},
    http::KeepAlive,
    middleware::Logger,
    web,
    App,
    Error,
    HttpServer,
};
use futures::{future::ok, FutureExt};
use log::*;
#[cfg(feature = "sqlite")]
use payment_bridge_engine::SqliteSessionStore;
use payment_bridge_engine::{MemorySessionStore, ReconciliationApi, SessionStore, TenantSession};

use crate::{
    config::{ServerConfig, ServerOptions},
    errors::ServerError,
    helpers::WebhookPeerGuard,
    integrations::shopify::ShopifyOrderGateway,
    routes::{health, ConfirmRoute, PayRoute, WebhookRoute},
};

pub const WEBHOOK_PATH: &str = "/webhook";

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let srv = match config.database_url.clone() {
        #[cfg(feature = "sqlite")]
        Some(url) => {
            let store = SqliteSessionStore::new_with_url(&url, 25).await?;
            seed_bootstrap_session(&config, &store).await?;
            create_server_instance(config, store)?
        },
        #[cfg(not(feature = "sqlite"))]
        Some(url) => {
            return Err(ServerError::ConfigurationError(format!(
                "PGB_DATABASE_URL is set to {url}, but this server was built without database support"
            )))
        },
        None => {
            let store = match config.max_tenants {
                Some(max) => MemorySessionStore::new().with_max_tenants(max),
                None => MemorySessionStore::new(),
            };
            seed_bootstrap_session(&config, &store).await?;
            create_server_instance(config, store)?
        },
    };
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

/// Stores the session for the shop configured in the environment, if there is one. An existing session for that
/// shop is replaced.
async fn seed_bootstrap_session<S: SessionStore>(config: &ServerConfig, store: &S) -> Result<(), ServerError> {
    let shopify = &config.shopify_config;
    if shopify.shop.is_empty() || shopify.admin_access_token.is_empty() {
        info!("🛍️ No bootstrap shop session configured");
        return Ok(());
    }
    store.store(TenantSession::new(shopify.shop.as_str(), shopify.admin_access_token.clone())).await?;
    info!("🛍️ Bootstrap session stored for {}", shopify.shop);
    Ok(())
}

pub fn create_server_instance<S>(config: ServerConfig, store: S) -> Result<Server, ServerError>
where S: SessionStore + Clone + Send + 'static {
    let reconciliation_config = config.reconciliation_config()?;
    let options = ServerOptions::from_config(&config);
    let bind_addr = (config.host.clone(), config.port);
    let srv = HttpServer::new(move || {
        let gateway = ShopifyOrderGateway::new(
            store.clone(),
            &config.shopify_config.api_version,
            config.shopify_config.request_timeout,
            &config.gateway.gateway_name,
        );
        let api = ReconciliationApi::new(gateway, reconciliation_config.clone());
        let guard = WebhookPeerGuard::from_config(&config);
        App::new()
            .wrap_fn(move |req, srv| {
                if !guard.allows(req.request()) {
                    return ok::<_, Error>(req.error_response(ServerError::ForbiddenPeer)).boxed_local();
                }
                srv.call(req).map(|res| res.map(|r| r.map_into_boxed_body())).boxed_local()
            })
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("pgb::access_log"))
            .app_data(web::Data::new(api))
            .app_data(web::Data::new(options.clone()))
            .service(health)
            .service(PayRoute::<ShopifyOrderGateway<S>>::new())
            .service(ConfirmRoute::<ShopifyOrderGateway<S>>::new())
            .service(WebhookRoute::<ShopifyOrderGateway<S>>::new())
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((bind_addr.0.as_str(), bind_addr.1))?
    .run();
    Ok(srv)
}
