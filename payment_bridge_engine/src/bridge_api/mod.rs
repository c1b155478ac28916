//! # Payment reconciliation API
//!
//! [`reconciliation_api::ReconciliationApi`] orchestrates the initiate, confirm and webhook stages on top of an
//! [`crate::traits::OrderGateway`] implementation. The request and response types for each stage live in
//! [`payment_objects`].
pub mod errors;
pub mod payment_objects;
pub mod reconciliation_api;
