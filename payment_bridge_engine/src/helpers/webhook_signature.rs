//! Webhook signature verification.
//!
//! The gateway signs each webhook delivery with the shared secret and sends the result in a header of the form
//! `t=<unix seconds>,v1=<hex hmac-sha256>`. The signed message is `"<t>.<raw body>"`. A second header names the key id
//! that was used, so that deliveries signed with a retired secret can still be verified during a rotation.
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use log::*;
use sha2::Sha256;

use super::signing_keys::{check_timestamp, KeyRing, SignatureError, SigningKey};

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebhookSignatureHeader {
    pub timestamp: i64,
    /// Every `v1` entry in the header. Any one of them matching is sufficient.
    pub signatures: Vec<Vec<u8>>,
}

impl WebhookSignatureHeader {
    pub fn parse(value: &str) -> Result<Self, SignatureError> {
        let mut timestamp = None;
        let mut signatures = Vec::new();
        for part in value.split(',') {
            let (k, v) = part
                .trim()
                .split_once('=')
                .ok_or_else(|| SignatureError::MalformedHeader(format!("'{part}' is not a key=value pair")))?;
            match k.trim() {
                "t" => {
                    let t = v.trim().parse::<i64>().map_err(|e| SignatureError::MalformedHeader(e.to_string()))?;
                    timestamp = Some(t);
                },
                "v1" => {
                    let sig = hex::decode(v.trim()).map_err(|e| SignatureError::MalformedHeader(e.to_string()))?;
                    signatures.push(sig);
                },
                _ => trace!("🔐️ Ignoring unknown signature header field '{k}'"),
            }
        }
        let timestamp = timestamp.ok_or_else(|| SignatureError::MalformedHeader("Missing timestamp".into()))?;
        if signatures.is_empty() {
            return Err(SignatureError::MalformedHeader("Missing v1 signature".into()));
        }
        Ok(Self { timestamp, signatures })
    }
}

fn mac_for(key: &SigningKey, timestamp: i64, body: &[u8]) -> Result<HmacSha256, SignatureError> {
    let mut mac =
        HmacSha256::new_from_slice(key.secret_bytes()).map_err(|e| SignatureError::SigningFailed(e.to_string()))?;
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(body);
    Ok(mac)
}

/// Produces a signature header value for `body`. This is what the gateway does on its side; the bridge uses it to
/// exercise its own verification.
pub fn sign_webhook_payload(body: &[u8], key: &SigningKey, timestamp: i64) -> Result<String, SignatureError> {
    let mac = mac_for(key, timestamp, body)?;
    Ok(format!("t={timestamp},v1={}", hex::encode(mac.finalize().into_bytes())))
}

/// Verifies a webhook delivery against the key ring.
///
/// If `key_id` is given, only keys with that id are tried, and an unknown id is an error. Otherwise every key in the
/// ring is tried. Comparison is constant time.
pub fn verify_webhook_signature(
    body: &[u8],
    signature_header: Option<&str>,
    key_id: Option<&str>,
    keys: &KeyRing,
    tolerance: Duration,
    now: DateTime<Utc>,
) -> Result<(), SignatureError> {
    let header = signature_header
        .filter(|h| !h.trim().is_empty())
        .ok_or_else(|| SignatureError::MissingHeader("signature".into()))?;
    let header = WebhookSignatureHeader::parse(header)?;
    check_timestamp(header.timestamp, tolerance, now)?;
    let candidates: Vec<&SigningKey> = match key_id.map(str::trim).filter(|k| !k.is_empty()) {
        Some(kid) => {
            let keys = keys.keys_with_id(kid).collect::<Vec<_>>();
            if keys.is_empty() {
                return Err(SignatureError::UnknownKeyId(kid.to_string()));
            }
            keys
        },
        None => keys.keys().iter().collect(),
    };
    for key in candidates {
        for sig in &header.signatures {
            let mac = mac_for(key, header.timestamp, body)?;
            if mac.verify_slice(sig).is_ok() {
                trace!("🔐️ Webhook signature verified with key {}", key.key_id);
                return Ok(());
            }
        }
    }
    warn!("🔐️ Webhook signature did not match any candidate key");
    Err(SignatureError::InvalidSignature)
}
