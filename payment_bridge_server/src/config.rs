use std::{env, net::IpAddr, time::Duration as StdDuration};

use chrono::Duration;
use log::*;
use payment_bridge_engine::{
    helpers::{KeyRing, SigningKey, DEFAULT_SIGNATURE_TOLERANCE_SECS},
    ReconciliationConfig,
    DEFAULT_TOKEN_PARAM,
};
use pgb_common::{parse_boolean_flag, parse_list, Secret};
use shopify_tools::ShopifyConfig as ShopifyApiConfig;
use url::Url;

use crate::errors::ServerError;

const DEFAULT_PGB_HOST: &str = "127.0.0.1";
const DEFAULT_PGB_PORT: u16 = 8370;
const DEFAULT_GATEWAY_NAME: &str = "fygaro";
const DEFAULT_SIGNATURE_HEADER: &str = "Fygaro-Signature";
const DEFAULT_KEY_ID_HEADER: &str = "Fygaro-Key-Id";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// SQLite URL for the session store. When `None`, sessions are kept in memory.
    pub database_url: Option<String>,
    /// Maximum number of shops the in-memory session store will hold.
    pub max_tenants: Option<usize>,
    /// If true, the X-Forwarded-For header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_x_forwarded_for: bool,
    /// If true, the Forwarded header will be used to determine the client's IP address, rather than the connection's
    /// remote address.
    pub use_forwarded: bool,
    /// Where buyers are sent when their order status page cannot be resolved.
    pub confirm_fallback_url: Option<String>,
    /// If supplied, requests to /webhook are only accepted from these addresses.
    pub webhook_whitelist: Option<Vec<IpAddr>>,
    /// The bootstrap shop. Its access token is seeded into the session store at startup, and it is the default shop
    /// for requests that don't name one.
    pub shopify_config: ShopifyApiConfig,
    pub gateway: GatewayConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_PGB_HOST.to_string(),
            port: DEFAULT_PGB_PORT,
            database_url: None,
            max_tenants: None,
            use_x_forwarded_for: false,
            use_forwarded: false,
            confirm_fallback_url: None,
            webhook_whitelist: None,
            shopify_config: ShopifyApiConfig::default(),
            gateway: GatewayConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("PGB_HOST").ok().unwrap_or_else(|| DEFAULT_PGB_HOST.into());
        let port = env::var("PGB_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for PGB_PORT. {e} Using the default, {DEFAULT_PGB_PORT}, instead."
                    );
                    DEFAULT_PGB_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_PGB_PORT);
        let database_url = env::var("PGB_DATABASE_URL").ok().filter(|s| !s.trim().is_empty());
        if database_url.is_none() {
            warn!("🪛️ PGB_DATABASE_URL is not set. Sessions will be kept in memory and lost when the server stops.");
        }
        let max_tenants = env::var("PGB_MAX_TENANTS").ok().and_then(|s| {
            s.parse::<usize>().map_err(|e| warn!("🪛️ Ignoring invalid value for PGB_MAX_TENANTS ({s}). {e}")).ok()
        });
        let use_x_forwarded_for = parse_boolean_flag(env::var("PGB_USE_X_FORWARDED_FOR").ok(), false);
        let use_forwarded = parse_boolean_flag(env::var("PGB_USE_FORWARDED").ok(), false);
        let confirm_fallback_url = env::var("PGB_CONFIRM_FALLBACK_URL").ok().filter(|s| !s.trim().is_empty());
        let webhook_whitelist = configure_whitelist(env::var("PGB_GATEWAY_IP_WHITELIST").ok());
        let timeout = env::var("PGB_HTTP_TIMEOUT")
            .ok()
            .and_then(|s| {
                s.parse::<u64>().map_err(|e| warn!("🪛️ Ignoring invalid value for PGB_HTTP_TIMEOUT ({s}). {e}")).ok()
            })
            .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS);
        let shopify_config =
            ShopifyApiConfig::new_from_env_or_default().with_request_timeout(StdDuration::from_secs(timeout));
        let gateway = GatewayConfig::from_env_or_default();
        Self {
            host,
            port,
            database_url,
            max_tenants,
            use_x_forwarded_for,
            use_forwarded,
            confirm_fallback_url,
            webhook_whitelist,
            shopify_config,
            gateway,
        }
    }

    /// The shop used for requests that don't name one.
    pub fn default_shop(&self) -> Option<&str> {
        Some(self.shopify_config.shop.as_str()).filter(|s| !s.is_empty())
    }

    pub fn reconciliation_config(&self) -> Result<ReconciliationConfig, ServerError> {
        let button_url = Url::parse(&self.gateway.button_url).map_err(|e| {
            let url = &self.gateway.button_url;
            ServerError::ConfigurationError(format!("PGB_GATEWAY_BUTTON_URL ({url}) is invalid. {e}"))
        })?;
        if self.gateway.secret.is_empty() {
            return Err(ServerError::ConfigurationError("PGB_GATEWAY_SECRET is not set".into()));
        }
        let mut config = ReconciliationConfig::new(self.gateway.key_ring(), button_url)
            .with_token_param(self.gateway.token_param.as_str())
            .with_signature_tolerance(self.gateway.signature_tolerance);
        if let Some(shop) = self.default_shop() {
            config = config.with_default_shop(shop);
        }
        Ok(config)
    }
}

fn configure_whitelist(value: Option<String>) -> Option<Vec<IpAddr>> {
    let whitelist = value.and_then(|s| {
        if ["none", "false", "0", ""].contains(&s.trim().to_lowercase().as_str()) {
            return None;
        }
        let ip_addrs = parse_list(&s)
            .into_iter()
            .filter_map(|s| {
                s.parse::<IpAddr>()
                    .map_err(|e| warn!("🪛️ Ignoring invalid IP address ({s}) in PGB_GATEWAY_IP_WHITELIST: {e}"))
                    .ok()
            })
            .collect::<Vec<IpAddr>>();
        Some(ip_addrs)
    });
    match &whitelist {
        Some(whitelist) if whitelist.is_empty() => {
            warn!(
                "🚨️ The gateway IP whitelist was configured, but is empty. The server will run, but won't accept any \
                 webhook deliveries."
            );
        },
        None => {
            info!("🪛️ No gateway IP whitelist is set. Only webhook signatures will be checked.");
        },
        Some(v) => {
            let addrs = v.iter().map(|a| a.to_string()).collect::<Vec<_>>().join(", ");
            info!("🪛️ Gateway IP whitelist: {addrs}");
        },
    }
    whitelist
}

//-------------------------------------------------  GatewayConfig  ----------------------------------------------------
#[derive(Clone, Debug)]
pub struct GatewayConfig {
    /// The hosted payment page that buyers are redirected to
    pub button_url: String,
    /// The query parameter that carries the payment token
    pub token_param: String,
    /// Identifies the active secret to the gateway
    pub key_id: String,
    pub secret: Secret<String>,
    /// Secrets that are no longer used for signing, but are still accepted when verifying
    pub retired_keys: Vec<SigningKey>,
    /// Recorded as the gateway on paid transactions
    pub gateway_name: String,
    pub signature_tolerance: Duration,
    pub signature_header: String,
    pub key_id_header: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            button_url: String::default(),
            token_param: DEFAULT_TOKEN_PARAM.to_string(),
            key_id: String::default(),
            secret: Secret::default(),
            retired_keys: Vec::new(),
            gateway_name: DEFAULT_GATEWAY_NAME.to_string(),
            signature_tolerance: Duration::seconds(DEFAULT_SIGNATURE_TOLERANCE_SECS),
            signature_header: DEFAULT_SIGNATURE_HEADER.to_string(),
            key_id_header: DEFAULT_KEY_ID_HEADER.to_string(),
        }
    }
}

impl GatewayConfig {
    pub fn from_env_or_default() -> Self {
        let defaults = Self::default();
        let button_url = env::var("PGB_GATEWAY_BUTTON_URL").ok().unwrap_or_else(|| {
            error!(
                "🪛️ PGB_GATEWAY_BUTTON_URL is not set. Please set it to the URL of the gateway's hosted payment page."
            );
            String::default()
        });
        let token_param = env::var("PGB_GATEWAY_TOKEN_PARAM").ok().filter(|s| !s.is_empty()).unwrap_or_else(|| {
            info!("🪛️ PGB_GATEWAY_TOKEN_PARAM is not set. Using '{DEFAULT_TOKEN_PARAM}'.");
            defaults.token_param.clone()
        });
        let key_id = env::var("PGB_GATEWAY_KEY_ID").ok().unwrap_or_else(|| {
            error!("🪛️ PGB_GATEWAY_KEY_ID is not set. Please set it to the key id issued by the payment gateway.");
            String::default()
        });
        let secret = Secret::new(env::var("PGB_GATEWAY_SECRET").ok().unwrap_or_else(|| {
            error!("🪛️ PGB_GATEWAY_SECRET is not set. Payment requests cannot be signed without it.");
            String::default()
        }));
        let retired_keys = env::var("PGB_GATEWAY_RETIRED_KEYS")
            .ok()
            .map(|s| {
                KeyRing::parse_key_list(&s).unwrap_or_else(|e| {
                    warn!("🪛️ Ignoring PGB_GATEWAY_RETIRED_KEYS. {e}");
                    Vec::new()
                })
            })
            .unwrap_or_default();
        if !retired_keys.is_empty() {
            let ids = retired_keys.iter().map(|k| k.key_id.as_str()).collect::<Vec<_>>().join(", ");
            info!("🪛️ Retired gateway keys are still accepted: {ids}");
        }
        let gateway_name =
            env::var("PGB_GATEWAY_NAME").ok().filter(|s| !s.is_empty()).unwrap_or(defaults.gateway_name);
        let signature_tolerance =
            parse_signature_tolerance(env::var("PGB_SIGNATURE_TOLERANCE").ok(), defaults.signature_tolerance);
        let signature_header = env::var("PGB_WEBHOOK_SIGNATURE_HEADER")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.signature_header);
        let key_id_header =
            env::var("PGB_WEBHOOK_KEY_ID_HEADER").ok().filter(|s| !s.is_empty()).unwrap_or(defaults.key_id_header);
        Self {
            button_url,
            token_param,
            key_id,
            secret,
            retired_keys,
            gateway_name,
            signature_tolerance,
            signature_header,
            key_id_header,
        }
    }

    pub fn key_ring(&self) -> KeyRing {
        KeyRing::new(SigningKey::new(self.key_id.as_str(), self.secret.clone()))
            .with_retired_keys(self.retired_keys.iter().cloned())
    }
}

/// Tolerance in whole seconds. Negative or unparseable values fall back to `default`.
fn parse_signature_tolerance(value: Option<String>, default: Duration) -> Duration {
    value
        .and_then(|s| {
            s.trim()
                .parse::<i64>()
                .map_err(|e| warn!("🪛️ Invalid configuration value for PGB_SIGNATURE_TOLERANCE. {e}"))
                .ok()
        })
        .and_then(|secs| {
            if secs < 0 {
                warn!("🪛️ PGB_SIGNATURE_TOLERANCE cannot be negative ({secs}). Using the default.");
                None
            } else {
                Some(Duration::seconds(secs))
            }
        })
        .unwrap_or(default)
}

//-------------------------------------------------  ServerOptions  ----------------------------------------------------
/// A subset of the server configuration that is used to configure the server's behaviour. Generally we try to keep this
/// as small as possible, and exclude secrets to avoid passing sensitive information around the system.
#[derive(Clone, Debug)]
pub struct ServerOptions {
    pub signature_header: String,
    pub key_id_header: String,
    pub confirm_fallback_url: Option<String>,
    pub default_shop: Option<String>,
}

impl ServerOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            signature_header: config.gateway.signature_header.clone(),
            key_id_header: config.gateway.key_id_header.clone(),
            confirm_fallback_url: config.confirm_fallback_url.clone(),
            default_shop: config.default_shop().map(String::from),
        }
    }

    /// Where to send a returning buyer when their status page can't be resolved.
    pub fn confirm_fallback(&self) -> String {
        self.confirm_fallback_url
            .clone()
            .or_else(|| self.default_shop.as_ref().map(|shop| format!("https://{shop}/account/orders")))
            .unwrap_or_else(|| "/".to_string())
    }
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self::from_config(&ServerConfig::default())
    }
}
