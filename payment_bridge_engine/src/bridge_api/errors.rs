use thiserror::Error;

use crate::{helpers::SignatureError, traits::OrderGatewayError};

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ReconciliationError {
    #[error("Invalid input. {0}")]
    InvalidInput(String),
    #[error("Tenant is not authenticated. {0}")]
    NotAuthenticated(String),
    #[error("Order platform request failed. {0}")]
    UpstreamError(String),
    #[error("Order not found. {0}")]
    OrderNotFound(String),
    #[error("Webhook signature is invalid. {0}")]
    InvalidSignature(SignatureError),
    #[error("The notification does not carry an order reference")]
    MissingReference,
    #[error("Payment of {received} does not match the expected {expected}")]
    AmountMismatch { expected: String, received: String },
    #[error("Could not sign the payment request. {0}")]
    SigningError(String),
}

impl From<OrderGatewayError> for ReconciliationError {
    fn from(e: OrderGatewayError) -> Self {
        match e {
            OrderGatewayError::NotAuthenticated(s) => Self::NotAuthenticated(s),
            OrderGatewayError::NotFound(s) => Self::OrderNotFound(s),
            OrderGatewayError::Upstream(s) => Self::UpstreamError(s),
            OrderGatewayError::SessionStore(s) => Self::UpstreamError(format!("Session store error. {s}")),
        }
    }
}
