use pgb_common::Secret;
use thiserror::Error;

/// Credentials for a single shop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantSession {
    pub shop: String,
    pub access_token: Secret<String>,
}

impl TenantSession {
    pub fn new<S: Into<String>>(shop: S, access_token: Secret<String>) -> Self {
        Self { shop: shop.into(), access_token }
    }
}

#[derive(Debug, Clone, Error)]
pub enum SessionStoreError {
    #[error("Session store backend error: {0}")]
    Backend(String),
    #[error("The session store is full ({0} tenants). Cannot add {1}")]
    CapacityExceeded(usize, String),
}

#[cfg(feature = "sqlite")]
impl From<sqlx::Error> for SessionStoreError {
    fn from(e: sqlx::Error) -> Self {
        Self::Backend(e.to_string())
    }
}

/// A key-value store for tenant sessions, keyed by shop.
#[allow(async_fn_in_trait)]
pub trait SessionStore {
    async fn load(&self, shop: &str) -> Result<Option<TenantSession>, SessionStoreError>;

    /// Inserts or replaces the session for `session.shop`.
    async fn store(&self, session: TenantSession) -> Result<(), SessionStoreError>;
}
