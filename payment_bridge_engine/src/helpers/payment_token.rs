//! # Payment request tokens
//!
//! The gateway's hosted payment page is opened with a signed JWT that fixes the amount to collect, the currency and
//! the order reference that the gateway will echo back in its webhook. Tokens are signed with HMAC-SHA256 using the
//! active gateway secret, and the header carries the key id (`kid`) so the gateway knows which secret to check against.
//!
//! Every token carries an `iat` timestamp, so signing the same claims twice gives two different, independently valid
//! tokens. Nothing may rely on tokens being byte-for-byte reproducible.
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use log::*;
use serde::{Deserialize, Serialize};

use super::signing_keys::{check_timestamp, SignatureError, SigningKey};

pub const PAYMENT_TOKEN_ALGORITHM: Algorithm = Algorithm::HS256;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentClaims {
    /// Decimal string, two fraction digits
    pub amount: String,
    pub currency: String,
    pub order_reference: String,
    /// Issued-at, unix seconds. Filled in when the token is signed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
}

impl PaymentClaims {
    pub fn new<S: Into<String>>(amount: S, currency: S, order_reference: S) -> Self {
        Self { amount: amount.into(), currency: currency.into(), order_reference: order_reference.into(), iat: None }
    }
}

pub fn sign_payment_request(
    claims: &PaymentClaims,
    key: &SigningKey,
    now: DateTime<Utc>,
) -> Result<String, SignatureError> {
    let mut header = Header::new(PAYMENT_TOKEN_ALGORITHM);
    header.typ = Some("JWT".to_string());
    header.kid = Some(key.key_id.clone());
    let claims = PaymentClaims { iat: Some(now.timestamp()), ..claims.clone() };
    let token = encode(&header, &claims, &EncodingKey::from_secret(key.secret_bytes()))
        .map_err(|e| SignatureError::SigningFailed(e.to_string()))?;
    trace!("🔐️ Signed payment request for order {} with key {}", claims.order_reference, key.key_id);
    Ok(token)
}

/// Verifies a payment request token against an ordered list of keys.
///
/// Each key is tried in turn, so a token signed with a retired secret still verifies during a rotation. The token must
/// be HS256, and if it carries an `iat` it must be within `tolerance` of `now`.
pub fn verify_payment_request(
    token: &str,
    keys: &[SigningKey],
    tolerance: Duration,
    now: DateTime<Utc>,
) -> Result<PaymentClaims, SignatureError> {
    if keys.is_empty() {
        return Err(SignatureError::NoKeys);
    }
    let mut validation = Validation::new(PAYMENT_TOKEN_ALGORITHM);
    validation.required_spec_claims.clear();
    validation.validate_exp = false;
    for key in keys {
        match decode::<PaymentClaims>(token, &DecodingKey::from_secret(key.secret_bytes()), &validation) {
            Ok(data) => {
                if let Some(iat) = data.claims.iat {
                    check_timestamp(iat, tolerance, now)?;
                }
                trace!("🔐️ Payment request verified with key {}", key.key_id);
                return Ok(data.claims);
            },
            Err(e) => match e.kind() {
                ErrorKind::InvalidSignature => continue,
                ErrorKind::InvalidAlgorithm => return Err(SignatureError::WrongAlgorithm),
                _ => return Err(SignatureError::MalformedToken(e.to_string())),
            },
        }
    }
    debug!("🔐️ Payment request did not verify against any of the {} configured keys", keys.len());
    Err(SignatureError::InvalidSignature)
}
