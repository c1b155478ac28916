mod payment_token;
mod pricing;
mod signing_keys;
mod webhook_signature;

pub use payment_token::{sign_payment_request, verify_payment_request, PaymentClaims, PAYMENT_TOKEN_ALGORITHM};
pub use pricing::{apply_surcharge, normalize_amount, SURCHARGE, SURCHARGE_THRESHOLD};
pub use signing_keys::{KeyRing, SignatureError, SigningKey, DEFAULT_SIGNATURE_TOLERANCE_SECS};
pub use webhook_signature::{sign_webhook_payload, verify_webhook_signature, WebhookSignatureHeader};
