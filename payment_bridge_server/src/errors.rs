use actix_web::{
    error::ResponseError,
    http::{header::ContentType, StatusCode},
    HttpResponse,
};
use log::*;
use payment_bridge_engine::{ReconciliationError, SessionStoreError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
    #[error("Invalid payment request. {0}")]
    InvalidPaymentRequest(String),
    #[error("Shop is not authenticated. {0}")]
    NotAuthenticated(String),
    #[error("Payment initialization failed. {0}")]
    PaymentInitializationFailed(String),
    #[error("Webhook failed. {0}")]
    WebhookFailed(String),
    #[error("Request came from a peer that is not on the whitelist")]
    ForbiddenPeer,
}

impl ServerError {
    /// What the caller gets to see. Details stay in the logs.
    fn public_message(&self) -> &'static str {
        match self {
            Self::InvalidPaymentRequest(_) => "Invalid payment request",
            Self::NotAuthenticated(_) => "Shop not authenticated",
            Self::PaymentInitializationFailed(_) => "Payment initialization failed",
            Self::WebhookFailed(_) => "Webhook failed",
            Self::ForbiddenPeer => "Forbidden",
            _ => "Internal server error",
        }
    }
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidPaymentRequest(_) => StatusCode::BAD_REQUEST,
            Self::NotAuthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::WebhookFailed(_) => StatusCode::BAD_REQUEST,
            Self::ForbiddenPeer => StatusCode::FORBIDDEN,
            Self::PaymentInitializationFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            error!("💻️ {self}");
        } else {
            warn!("💻️ {self}");
        }
        HttpResponse::build(status).insert_header(ContentType::plaintext()).body(self.public_message())
    }
}

/// Errors from payment initiation. Webhook errors are all reported as [`ServerError::WebhookFailed`] instead.
impl From<ReconciliationError> for ServerError {
    fn from(e: ReconciliationError) -> Self {
        match e {
            ReconciliationError::InvalidInput(_) => Self::InvalidPaymentRequest(e.to_string()),
            ReconciliationError::NotAuthenticated(_) => Self::NotAuthenticated(e.to_string()),
            _ => Self::PaymentInitializationFailed(e.to_string()),
        }
    }
}

impl From<SessionStoreError> for ServerError {
    fn from(e: SessionStoreError) -> Self {
        Self::InitializeError(format!("Session store error. {e}"))
    }
}
