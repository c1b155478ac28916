//! # SQLite session store
//!
//! Low-level queries live in [`sessions`] as plain functions that accept a `&mut SqliteConnection`, so that callers can
//! run them against a pooled connection or inside a transaction without any other changes.
use std::{fmt::Debug, str::FromStr};

use log::*;
use sqlx::{
    migrate,
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};

use crate::traits::{SessionStore, SessionStoreError, TenantSession};

pub mod sessions;

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    Ok(pool)
}

#[derive(Clone)]
pub struct SqliteSessionStore {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteSessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteSessionStore ({:?})", self.pool)
    }
}

impl SqliteSessionStore {
    /// Connects to the database at `url`, creating it if necessary, and brings the schema up to date.
    ///
    /// Each connection to `sqlite::memory:` is a separate database, so use `max_connections = 1` for in-memory stores.
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, SessionStoreError> {
        trace!("🗃️ Creating new session store connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        migrate!("./src/db/sqlite/migrations")
            .run(&pool)
            .await
            .map_err(|e| SessionStoreError::Backend(format!("Could not run migrations. {e}")))?;
        info!("🗃️ Session store ready at {url}");
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

impl SessionStore for SqliteSessionStore {
    async fn load(&self, shop: &str) -> Result<Option<TenantSession>, SessionStoreError> {
        let mut conn = self.pool.acquire().await?;
        let session = sessions::fetch_session(shop, &mut conn).await?;
        Ok(session)
    }

    async fn store(&self, session: TenantSession) -> Result<(), SessionStoreError> {
        let mut conn = self.pool.acquire().await?;
        sessions::upsert_session(&session, &mut conn).await?;
        debug!("🗃️ Stored session for {}", session.shop);
        Ok(())
    }
}
