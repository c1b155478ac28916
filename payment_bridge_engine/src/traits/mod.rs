//! # Collaborator interfaces
//!
//! The reconciliation core talks to the outside world through exactly two capability interfaces. Backends need to
//! implement these traits in order to be used by [`crate::ReconciliationApi`].
//!
//! * [`OrderGateway`] performs all I/O against the external order platform: creating and fetching orders, recording
//!   paid transactions and resolving order status pages. Implementations own per-tenant session acquisition.
//! * [`SessionStore`] is a key-value store for tenant credentials. The reconciliation core never touches it directly;
//!   order gateways use it to look up the credentials for a shop.
mod order_gateway;
mod session_store;

pub use order_gateway::{OrderGateway, OrderGatewayError};
pub use session_store::{SessionStore, SessionStoreError, TenantSession};
