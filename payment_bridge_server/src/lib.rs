//! # Payment bridge server
//! This crate hosts the HTTP server that connects a Shopify storefront to a hosted payment page. It is responsible
//! for:
//! * Creating pending orders and redirecting buyers to the payment gateway with a signed payment token.
//! * Sending buyers who return from the gateway to their order status page.
//! * Verifying signed payment notifications from the gateway and recording the payment against the order.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `GET /pay`: Creates a pending order and redirects (302) to the hosted payment page.
//! * `GET /confirm`: Redirects (302) a returning buyer to their order status page.
//! * `POST /webhook`: Receives signed payment notifications from the gateway.

pub mod cli;
pub mod config;
pub mod errors;

pub mod helpers;
pub mod integrations;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
