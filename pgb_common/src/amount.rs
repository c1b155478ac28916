use std::{
    fmt::Display,
    ops::Add,
    str::FromStr,
};

use rust_decimal::Decimal;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Order platforms and payment gateways exchange money as decimal strings with exactly two fraction digits.
pub const AMOUNT_FRACTION_DIGITS: u32 = 2;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AmountError {
    #[error("An empty string is not a valid amount")]
    Empty,
    #[error("'{0}' is not a decimal number")]
    NotANumber(String),
    #[error("Negative amounts are not supported: {0}")]
    Negative(String),
    #[error("'{0}' has more than two fraction digits")]
    TooPrecise(String),
}

//--------------------------------------       Amount       ---------------------------------------------------------
/// A non-negative monetary value in major units (e.g. dollars), held as a fixed-point decimal.
///
/// `Amount` never goes through binary floating point. Parsing accepts at most two fraction digits and formatting
/// always produces exactly two, so `"65"`, `"65.0"` and `"65.00"` all display as `65.00`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Amount(Decimal);

impl Amount {
    pub fn from_major_units(units: u32) -> Self {
        Self(Decimal::from(units))
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Err(AmountError::Empty);
        }
        let value = Decimal::from_str(s).map_err(|_| AmountError::NotANumber(s.to_string()))?;
        if value.is_sign_negative() && !value.is_zero() {
            return Err(AmountError::Negative(s.to_string()));
        }
        if value.scale() > AMOUNT_FRACTION_DIGITS {
            return Err(AmountError::TooPrecise(s.to_string()));
        }
        Ok(Self(value.abs()))
    }
}

impl Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut value = self.0;
        value.rescale(AMOUNT_FRACTION_DIGITS);
        write!(f, "{value}")
    }
}

impl Add for Amount {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        s.parse().map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn amount(s: &str) -> Amount {
        s.parse().expect("valid amount")
    }

    #[test]
    fn formatting_always_has_two_fraction_digits() {
        assert_eq!(amount("65").to_string(), "65.00");
        assert_eq!(amount("65.5").to_string(), "65.50");
        assert_eq!(amount("0.00").to_string(), "0.00");
        assert_eq!(amount("1234567.89").to_string(), "1234567.89");
    }

    #[test]
    fn invalid_amounts() {
        assert_eq!("".parse::<Amount>(), Err(AmountError::Empty));
        assert_eq!("abc".parse::<Amount>(), Err(AmountError::NotANumber("abc".into())));
        assert_eq!("-1.00".parse::<Amount>(), Err(AmountError::Negative("-1.00".into())));
        assert_eq!("1.005".parse::<Amount>(), Err(AmountError::TooPrecise("1.005".into())));
    }

    #[test]
    fn arithmetic_is_exact() {
        // 0.1 + 0.2 is the classic floating point trap
        assert_eq!((amount("0.10") + amount("0.20")).to_string(), "0.30");
        assert_eq!((amount("199.99") + Amount::from_major_units(15)).to_string(), "214.99");
        assert!(amount("199.99") < Amount::from_major_units(200));
    }

    #[test]
    fn serde_uses_strings() {
        let json = serde_json::to_string(&amount("50")).unwrap();
        assert_eq!(json, r#""50.00""#);
        let back: Amount = serde_json::from_str(r#""12.30""#).unwrap();
        assert_eq!(back, amount("12.3"));
        assert!(serde_json::from_str::<Amount>(r#""12.345""#).is_err());
    }
}
