//! # Amount normalization
//!
//! The gateway is asked to collect the order total plus a flat surcharge on small orders. The same rule is applied
//! twice: once when the payment request is built, and once when the webhook's amount is checked. Both call sites MUST
//! go through [`normalize_amount`], otherwise legitimate payments will be rejected as mismatched.
//!
//! Normalization is not idempotent below the threshold. `normalize_amount("100.00")` is `"115.00"`, and normalizing
//! that result again gives `"130.00"`. Always normalize the order platform's total, never a previously normalized
//! value. At or above the threshold the amount is returned unchanged, so re-normalizing is a no-op there.
use pgb_common::{Amount, AmountError};

/// Orders below this total (in major currency units) attract the surcharge.
pub const SURCHARGE_THRESHOLD: u32 = 200;
/// Flat surcharge in major currency units.
pub const SURCHARGE: u32 = 15;

pub fn apply_surcharge(amount: Amount) -> Amount {
    if amount < Amount::from_major_units(SURCHARGE_THRESHOLD) {
        amount + Amount::from_major_units(SURCHARGE)
    } else {
        amount
    }
}

/// Returns the amount the gateway must collect for an order total, formatted with two fraction digits.
pub fn normalize_amount(raw: &str) -> Result<String, AmountError> {
    let amount = raw.parse::<Amount>()?;
    Ok(apply_surcharge(amount).to_string())
}
