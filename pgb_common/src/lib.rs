mod amount;
mod helpers;
mod secret;

pub use amount::{Amount, AmountError, AMOUNT_FRACTION_DIGITS};
pub use helpers::{parse_boolean_flag, parse_list};
pub use secret::Secret;
