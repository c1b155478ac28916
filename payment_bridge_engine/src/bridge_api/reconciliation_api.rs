use std::fmt::Debug;

use chrono::{Duration, Utc};
use log::*;
use url::Url;

use crate::{
    bridge_api::{
        errors::ReconciliationError,
        payment_objects::{PaymentParams, PaymentRedirect, WebhookDelivery, WebhookOutcome, WebhookPayload},
    },
    helpers::{
        normalize_amount,
        sign_payment_request,
        verify_webhook_signature,
        KeyRing,
        PaymentClaims,
        DEFAULT_SIGNATURE_TOLERANCE_SECS,
    },
    order_types::OrderId,
    traits::OrderGateway,
};

/// Query parameter that carries the payment token on the hosted payment page URL, unless configured otherwise.
pub const DEFAULT_TOKEN_PARAM: &str = "token";

#[derive(Debug, Clone)]
pub struct ReconciliationConfig {
    pub key_ring: KeyRing,
    /// The gateway's hosted payment page
    pub button_url: Url,
    pub token_param: String,
    pub signature_tolerance: Duration,
    /// Used when a request does not name the shop it is for
    pub default_shop: Option<String>,
}

impl ReconciliationConfig {
    pub fn new(key_ring: KeyRing, button_url: Url) -> Self {
        Self {
            key_ring,
            button_url,
            token_param: DEFAULT_TOKEN_PARAM.to_string(),
            signature_tolerance: Duration::seconds(DEFAULT_SIGNATURE_TOLERANCE_SECS),
            default_shop: None,
        }
    }

    pub fn with_default_shop<S: Into<String>>(mut self, shop: S) -> Self {
        self.default_shop = Some(shop.into());
        self
    }

    pub fn with_token_param<S: Into<String>>(mut self, param: S) -> Self {
        self.token_param = param.into();
        self
    }

    pub fn with_signature_tolerance(mut self, tolerance: Duration) -> Self {
        self.signature_tolerance = tolerance;
        self
    }
}

/// `ReconciliationApi` drives the three stages of a gateway payment.
///
/// 1. [`Self::initiate_payment`] creates a pending order and produces the signed redirect to the hosted payment page.
/// 2. [`Self::confirm_return`] resolves where to send the buyer once the gateway sends them back.
/// 3. [`Self::process_webhook`] verifies a gateway notification and records the payment against the order.
///
/// No order state is held locally. The order platform's financial status is the only record of where an order is in
/// this flow, and it is re-read on every webhook.
///
/// Concurrent deliveries for the same order are only separated by the pending-status check in
/// [`Self::process_webhook`]. Two deliveries that both read `pending` before either records its transaction will
/// both record one. The window is narrow and closing it needs support from the order platform itself.
pub struct ReconciliationApi<G> {
    gateway: G,
    config: ReconciliationConfig,
}

impl<G> Debug for ReconciliationApi<G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ReconciliationApi ({})", self.config.button_url)
    }
}

impl<G> ReconciliationApi<G> {
    pub fn new(gateway: G, config: ReconciliationConfig) -> Self {
        Self { gateway, config }
    }

    pub fn config(&self) -> &ReconciliationConfig {
        &self.config
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Picks the shop named in the request, falling back to the configured default.
    pub fn resolve_shop(&self, requested: Option<&str>) -> Result<String, ReconciliationError> {
        requested
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .or(self.config.default_shop.as_deref())
            .map(String::from)
            .ok_or_else(|| ReconciliationError::InvalidInput("No shop was specified".into()))
    }
}

impl<G> ReconciliationApi<G>
where G: OrderGateway
{
    /// Creates a pending order from the buyer's parameters and returns the signed hosted payment page URL.
    ///
    /// Parameters are validated before anything is sent upstream. If signing fails after the order was created, the
    /// order is left pending on the order platform.
    pub async fn initiate_payment(&self, params: PaymentParams) -> Result<PaymentRedirect, ReconciliationError> {
        let shop = self.resolve_shop(params.shop().as_deref())?;
        let new_order = params.to_new_order()?;
        trace!("💳️ Creating order for {shop} with {} line item(s)", new_order.line_items.len());
        let order = self.gateway.create_order(&shop, new_order).await?;
        let amount = normalize_amount(&order.total_price).map_err(|e| {
            ReconciliationError::UpstreamError(format!("Order {} has an invalid total. {e}", order.id))
        })?;
        debug!("💳️ Order {} created on {shop}. Total {} normalized to {amount}", order.id, order.total_price);
        let claims = PaymentClaims::new(amount.as_str(), order.currency.as_str(), order.id.as_str());
        let token = sign_payment_request(&claims, self.config.key_ring.active(), Utc::now())
            .map_err(|e| ReconciliationError::SigningError(e.to_string()))?;
        let mut redirect_url = self.config.button_url.clone();
        redirect_url.query_pairs_mut().append_pair(&self.config.token_param, &token);
        info!("💳️ Payment of {amount} {} initiated for order {}", order.currency, order.id);
        Ok(PaymentRedirect {
            order_id: order.id,
            order_name: order.name,
            amount,
            currency: order.currency,
            token,
            redirect_url,
        })
    }

    /// Resolves the order status page for a buyer returning from the gateway. Performs no financial state change.
    pub async fn confirm_return(
        &self,
        shop: Option<&str>,
        order_reference: Option<&str>,
    ) -> Result<String, ReconciliationError> {
        let order_reference =
            order_reference.map(str::trim).filter(|s| !s.is_empty()).ok_or(ReconciliationError::MissingReference)?;
        let shop = self.resolve_shop(shop)?;
        let order_id = OrderId::from(order_reference);
        let url = self.gateway.status_page_url(&shop, &order_id).await?;
        debug!("↩️ Buyer returning for order {order_id} on {shop} is sent to {url}");
        Ok(url)
    }

    /// Verifies and applies a gateway payment notification.
    ///
    /// The signature is checked before the body is parsed, and a paid transaction is only recorded if the order is
    /// still pending and the notified amount and currency match the order exactly. Redeliveries for orders that are no
    /// longer pending succeed without doing anything.
    pub async fn process_webhook(&self, delivery: WebhookDelivery) -> Result<WebhookOutcome, ReconciliationError> {
        verify_webhook_signature(
            &delivery.body,
            delivery.signature.as_deref(),
            delivery.key_id.as_deref(),
            &self.config.key_ring,
            self.config.signature_tolerance,
            Utc::now(),
        )
        .map_err(|e| {
            warn!("🪝️ Rejecting webhook delivery. {e}");
            ReconciliationError::InvalidSignature(e)
        })?;
        let payload = serde_json::from_slice::<WebhookPayload>(&delivery.body)
            .map_err(|e| ReconciliationError::InvalidInput(format!("Webhook body is not valid. {e}")))?;
        let order_id = payload
            .order_reference
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(OrderId::from)
            .ok_or(ReconciliationError::MissingReference)?;
        let shop = self.resolve_shop(payload.shop.as_deref())?;
        trace!("🪝️ Webhook for order {order_id} on {shop}");

        let order = self.gateway.fetch_order(&shop, &order_id).await.map_err(|e| {
            warn!("🪝️ Could not fetch order {order_id} for webhook. {e}");
            ReconciliationError::UpstreamError(e.to_string())
        })?;
        if !order.financial_status.is_pending() {
            info!("🪝️ Order {order_id} is already {}. Nothing to do", order.financial_status);
            return Ok(WebhookOutcome::AlreadyProcessed(order_id));
        }

        let expected = normalize_amount(&order.total_price).map_err(|e| {
            ReconciliationError::UpstreamError(format!("Order {order_id} has an invalid total. {e}"))
        })?;
        let received_amount = payload.amount.unwrap_or_default();
        let received_currency = payload.currency.unwrap_or_default();
        if received_amount != expected || received_currency != order.currency {
            warn!(
                "🪝️ Payment for order {order_id} does not match. Expected {expected} {}, received {received_amount} \
                 {received_currency}",
                order.currency
            );
            return Err(ReconciliationError::AmountMismatch {
                expected: format!("{expected} {}", order.currency),
                received: format!("{received_amount} {received_currency}"),
            });
        }

        self.gateway.record_paid_transaction(&shop, &order_id, &received_amount, &received_currency).await.map_err(
            |e| {
                error!("🪝️ Payment for order {order_id} was verified but could not be recorded. {e}");
                ReconciliationError::from(e)
            },
        )?;
        info!("🪝️ Payment of {received_amount} {received_currency} recorded for order {order_id}");
        Ok(WebhookOutcome::Recorded(order_id))
    }
}
