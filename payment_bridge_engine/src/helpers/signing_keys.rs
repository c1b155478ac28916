use chrono::{DateTime, Duration, Utc};
use log::*;
use pgb_common::{parse_list, Secret};
use thiserror::Error;

/// Signed requests older (or further in the future) than this are rejected.
pub const DEFAULT_SIGNATURE_TOLERANCE_SECS: i64 = 300;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("No signing keys are configured")]
    NoKeys,
    #[error("Required header is missing: {0}")]
    MissingHeader(String),
    #[error("Signature header is malformed. {0}")]
    MalformedHeader(String),
    #[error("Key id {0} is not known")]
    UnknownKeyId(String),
    #[error("Signature timestamp is outside the tolerance window ({0}s off)")]
    StaleTimestamp(i64),
    #[error("Token was signed with an unexpected algorithm")]
    WrongAlgorithm,
    #[error("Token is malformed. {0}")]
    MalformedToken(String),
    #[error("Signature does not match")]
    InvalidSignature,
    #[error("Could not sign the request. {0}")]
    SigningFailed(String),
    #[error("Invalid key definition. {0}")]
    InvalidKeyDefinition(String),
}

/// A shared secret and the identifier the gateway knows it by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningKey {
    pub key_id: String,
    pub secret: Secret<String>,
}

impl SigningKey {
    pub fn new<S: Into<String>>(key_id: S, secret: Secret<String>) -> Self {
        Self { key_id: key_id.into(), secret }
    }

    pub fn secret_bytes(&self) -> &[u8] {
        self.secret.reveal().as_bytes()
    }
}

/// The set of gateway secrets in use.
///
/// The first key is the active key, used for signing new payment requests. Retired keys are still accepted when
/// verifying, which lets secrets be rotated without rejecting requests signed just before the switch.
#[derive(Debug, Clone)]
pub struct KeyRing {
    keys: Vec<SigningKey>,
}

impl KeyRing {
    pub fn new(active: SigningKey) -> Self {
        Self { keys: vec![active] }
    }

    pub fn with_retired_key(mut self, key: SigningKey) -> Self {
        self.keys.push(key);
        self
    }

    pub fn with_retired_keys<I: IntoIterator<Item = SigningKey>>(mut self, keys: I) -> Self {
        self.keys.extend(keys);
        self
    }

    pub fn active(&self) -> &SigningKey {
        &self.keys[0]
    }

    /// All keys, active key first.
    pub fn keys(&self) -> &[SigningKey] {
        &self.keys
    }

    pub fn keys_with_id<'a>(&'a self, key_id: &'a str) -> impl Iterator<Item = &'a SigningKey> + 'a {
        self.keys.iter().filter(move |k| k.key_id == key_id)
    }

    /// Parses a `key_id:secret,key_id:secret` list.
    pub fn parse_key_list(value: &str) -> Result<Vec<SigningKey>, SignatureError> {
        parse_list(value)
            .into_iter()
            .map(|entry| match entry.split_once(':') {
                Some((id, secret)) if !id.trim().is_empty() && !secret.trim().is_empty() => {
                    Ok(SigningKey::new(id.trim(), Secret::new(secret.trim().to_string())))
                },
                _ => Err(SignatureError::InvalidKeyDefinition("Expected 'key_id:secret'".to_string())),
            })
            .collect()
    }
}

/// Checks that `timestamp` (unix seconds) is within `tolerance` of `now`, in either direction.
pub(crate) fn check_timestamp(timestamp: i64, tolerance: Duration, now: DateTime<Utc>) -> Result<(), SignatureError> {
    // Untrusted input, so extreme values must not overflow
    let skew = now.timestamp().checked_sub(timestamp).ok_or(SignatureError::StaleTimestamp(i64::MAX))?;
    if skew.unsigned_abs() > tolerance.num_seconds().unsigned_abs() {
        debug!("🔐️ Signature timestamp {timestamp} is {skew}s from now. Tolerance is {}s", tolerance.num_seconds());
        return Err(SignatureError::StaleTimestamp(skew));
    }
    Ok(())
}
