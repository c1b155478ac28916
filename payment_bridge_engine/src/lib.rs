//! Payment Bridge Engine
//!
//! The payment bridge connects an order platform (e.g. Shopify) with a payment gateway that hosts its own checkout
//! page. This library contains the reconciliation logic. It is provider-agnostic: the order platform is reached through the
//! [`OrderGateway`] trait and tenant credentials through the [`SessionStore`] trait.
//!
//! The library is divided into these sections:
//! 1. The reconciliation API ([`ReconciliationApi`]), which drives the three payment stages. A payment is initiated by
//!    creating a pending order and redirecting the buyer to the gateway with a signed payment token. The buyer's
//!    return is mapped to the order status page. Finally, the gateway's signed webhook is verified and, if the order
//!    is still pending and the amounts agree, a paid transaction is recorded against the order.
//! 2. Signing and pricing helpers ([`mod@helpers`]). Token signing, webhook signature verification with key rotation,
//!    and the surcharge rule that is applied identically when initiating and when verifying a payment.
//! 3. Session store backends ([`mod@db`]). An in-memory store and a SQLite store.
pub mod db;
pub mod helpers;
pub mod order_types;
pub mod traits;

mod bridge_api;

pub use bridge_api::{
    errors::ReconciliationError,
    payment_objects,
    reconciliation_api::{ReconciliationApi, ReconciliationConfig, DEFAULT_TOKEN_PARAM},
};
pub use db::MemorySessionStore;
#[cfg(feature = "sqlite")]
pub use db::SqliteSessionStore;
pub use traits::{OrderGateway, OrderGatewayError, SessionStore, SessionStoreError, TenantSession};
