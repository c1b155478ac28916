use std::time::Duration;

use log::*;
use pgb_common::Secret;

pub const DEFAULT_API_VERSION: &str = "2026-01";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Connection details for a single shop.
#[derive(Debug, Clone)]
pub struct ShopifyConfig {
    /// The storefront domain, e.g. "my-shop.myshopify.com"
    pub shop: String,
    pub admin_access_token: Secret<String>,
    pub api_version: String,
    pub request_timeout: Duration,
}

impl Default for ShopifyConfig {
    fn default() -> Self {
        Self {
            shop: String::default(),
            admin_access_token: Secret::default(),
            api_version: DEFAULT_API_VERSION.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl ShopifyConfig {
    pub fn new(shop: &str, admin_access_token: Secret<String>, api_version: &str) -> Self {
        Self {
            shop: shop.to_string(),
            admin_access_token,
            api_version: api_version.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Reads the bootstrap shop from the environment. The shop and access token are optional, since sessions can also
    /// come from the session store, so missing values are logged at `info` level only.
    pub fn new_from_env_or_default() -> Self {
        let shop = std::env::var("PGB_SHOPIFY_SHOP").unwrap_or_else(|_| {
            info!("🛍️ PGB_SHOPIFY_SHOP not set. No bootstrap shop session will be created.");
            String::default()
        });
        let api_version = std::env::var("PGB_SHOPIFY_API_VERSION").unwrap_or_else(|_| {
            warn!("🛍️ PGB_SHOPIFY_API_VERSION not set, using {DEFAULT_API_VERSION} as default");
            DEFAULT_API_VERSION.to_string()
        });
        let admin_access_token = Secret::new(std::env::var("PGB_SHOPIFY_ADMIN_ACCESS_TOKEN").unwrap_or_else(|_| {
            info!("🛍️ PGB_SHOPIFY_ADMIN_ACCESS_TOKEN not set.");
            String::default()
        }));
        Self { shop, admin_access_token, api_version, request_timeout: DEFAULT_REQUEST_TIMEOUT }
    }
}
