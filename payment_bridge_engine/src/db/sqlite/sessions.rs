use pgb_common::Secret;
use sqlx::{FromRow, SqliteConnection};

use crate::traits::{SessionStoreError, TenantSession};

#[derive(Debug, FromRow)]
struct SessionRow {
    shop: String,
    access_token: String,
}

impl From<SessionRow> for TenantSession {
    fn from(row: SessionRow) -> Self {
        TenantSession::new(row.shop, Secret::new(row.access_token))
    }
}

pub async fn fetch_session(
    shop: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<TenantSession>, SessionStoreError> {
    let row: Option<SessionRow> =
        sqlx::query_as("SELECT shop, access_token FROM tenant_sessions WHERE shop = ?;")
            .bind(shop)
            .fetch_optional(conn)
            .await?;
    Ok(row.map(TenantSession::from))
}

pub async fn upsert_session(session: &TenantSession, conn: &mut SqliteConnection) -> Result<(), SessionStoreError> {
    sqlx::query(
        r#"INSERT INTO tenant_sessions (shop, access_token) VALUES (?, ?)
        ON CONFLICT(shop) DO UPDATE SET access_token = excluded.access_token, updated_at = CURRENT_TIMESTAMP;"#,
    )
    .bind(session.shop.as_str())
    .bind(session.access_token.reveal().as_str())
    .execute(conn)
    .await?;
    Ok(())
}
