//! Order platform adapters
pub mod shopify;
