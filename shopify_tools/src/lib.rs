//! A small client for the parts of the Shopify Admin API that the payment bridge needs: creating and fetching orders,
//! posting transactions against them, and looking up an order's status page.
mod api;
mod config;
mod error;
mod shopify_order;
mod shopify_transaction;

pub mod data_objects;
pub mod helpers;

pub use api::ShopifyApi;
pub use config::ShopifyConfig;
pub use error::ShopifyApiError;
pub use shopify_order::{NewShopifyOrder, ShopifyOrder};
pub use shopify_transaction::{NewShopifyTransaction, ShopifyTransaction};
