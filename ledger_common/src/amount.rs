use std::{
    fmt::{self, Display},
    iter::Sum,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
    str::FromStr,
};

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use sqlx::Type;
use thiserror::Error;

use crate::op;

/// Number of decimal places carried by [`LedgerAmount`].
pub const LEDGER_DECIMALS: usize = 8;
const UNITS_PER_WHOLE: i64 = 100_000_000;

//--------------------------------------     LedgerAmount       --------------------------------------------------------
/// A signed, fixed-point ledger amount with eight decimal places.
///
/// The ledger API reports every amount as a decimal string (`"123.45"`, `"-0.5"`). Converting those strings to binary
/// floats makes balance equations such as `900 + 10 == 910` unreliable, so amounts are held as an integer count of
/// 10^-8 units instead. All arithmetic and comparisons are exact.
#[derive(Debug, Clone, Copy, Default, Type, Ord, PartialOrd, PartialEq, Eq, Hash)]
#[sqlx(transparent)]
pub struct LedgerAmount(i64);

op!(binary LedgerAmount, Add, add);
op!(binary LedgerAmount, Sub, sub);
op!(inplace LedgerAmount, AddAssign, add_assign);
op!(inplace LedgerAmount, SubAssign, sub_assign);
op!(unary LedgerAmount, Neg, neg);

impl Sum for LedgerAmount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Value cannot be represented as a ledger amount: {0}")]
pub struct AmountConversionError(String);

impl From<i64> for LedgerAmount {
    /// Interprets `value` as a raw count of 10^-8 units.
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl LedgerAmount {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn from_whole(units: i64) -> Self {
        Self(units * UNITS_PER_WHOLE)
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// `None` if the sum does not fit in a ledger amount.
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    pub fn checked_sub(self, rhs: Self) -> Option<Self> {
        self.0.checked_sub(rhs.0).map(Self)
    }
}

impl FromStr for LedgerAmount {
    type Err = AmountConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (negative, digits) = match trimmed.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
        };
        let (whole, frac) = digits.split_once('.').unwrap_or((digits, ""));
        if whole.is_empty() && frac.is_empty() {
            return Err(AmountConversionError(format!("'{s}' is empty")));
        }
        let all_digits = |part: &str| part.chars().all(|c| c.is_ascii_digit());
        if !all_digits(whole) || !all_digits(frac) {
            return Err(AmountConversionError(format!("'{s}' is not a decimal number")));
        }
        if frac.len() > LEDGER_DECIMALS {
            return Err(AmountConversionError(format!("'{s}' has more than {LEDGER_DECIMALS} decimal places")));
        }
        let overflow = || AmountConversionError(format!("'{s}' is too large"));
        let whole_units = match whole {
            "" => 0,
            w => w.parse::<i64>().map_err(|_| overflow())?,
        };
        let frac_units = match frac {
            "" => 0,
            f => format!("{:0<width$}", f, width = LEDGER_DECIMALS).parse::<i64>().map_err(|_| overflow())?,
        };
        let value =
            whole_units.checked_mul(UNITS_PER_WHOLE).and_then(|v| v.checked_add(frac_units)).ok_or_else(overflow)?;
        Ok(Self(if negative { -value } else { value }))
    }
}

impl Display for LedgerAmount {
    /// Formats the amount as a decimal string with at least two decimal places, e.g. `-90.00` or `0.12345`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let per_whole = UNITS_PER_WHOLE.unsigned_abs();
        let whole = abs / per_whole;
        let frac = format!("{:0width$}", abs % per_whole, width = LEDGER_DECIMALS);
        let frac = frac.trim_end_matches('0');
        write!(f, "{sign}{whole}.{frac:0<2}")
    }
}

impl Serialize for LedgerAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for LedgerAmount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct AmountVisitor;

        impl<'de> de::Visitor<'de> for AmountVisitor {
            type Value = LedgerAmount;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a decimal string or a whole number")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
                v.parse().map_err(E::custom)
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
                v.checked_mul(UNITS_PER_WHOLE)
                    .map(LedgerAmount)
                    .ok_or_else(|| E::custom(format!("{v} is too large for a ledger amount")))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
                let v = i64::try_from(v).map_err(E::custom)?;
                self.visit_i64(v)
            }
        }

        deserializer.deserialize_any(AmountVisitor)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn amt(s: &str) -> LedgerAmount {
        s.parse().unwrap()
    }

    #[test]
    fn parse_decimal_strings() {
        assert_eq!(amt("123.45").value(), 12_345_000_000);
        assert_eq!(amt("-123.45").value(), -12_345_000_000);
        assert_eq!(amt("-0.5").value(), -50_000_000);
        assert_eq!(amt(".25").value(), 25_000_000);
        assert_eq!(amt("7.").value(), 700_000_000);
        assert_eq!(amt("0.00000001").value(), 1);
        assert_eq!(amt(" 456.00 "), LedgerAmount::from_whole(456));
    }

    #[test]
    fn reject_malformed_strings() {
        assert!("".parse::<LedgerAmount>().is_err());
        assert!(".".parse::<LedgerAmount>().is_err());
        assert!("12a.3".parse::<LedgerAmount>().is_err());
        assert!("1.2.3".parse::<LedgerAmount>().is_err());
        assert!("0.000000001".parse::<LedgerAmount>().is_err());
        assert!("99999999999999999999".parse::<LedgerAmount>().is_err());
    }

    #[test]
    fn display() {
        assert_eq!(amt("123.45").to_string(), "123.45");
        assert_eq!(amt("-90").to_string(), "-90.00");
        assert_eq!(amt("0.5").to_string(), "0.50");
        assert_eq!(amt("0.12345").to_string(), "0.12345");
        assert_eq!(amt("-0.00000001").to_string(), "-0.00000001");
    }

    #[test]
    fn arithmetic_is_exact() {
        // 0.1 + 0.2 != 0.3 in binary floating point
        assert_eq!(amt("0.1") + amt("0.2"), amt("0.3"));
        assert_eq!(amt("900") + amt("10"), amt("910"));
        assert_eq!(-(amt("100") - amt("10")), amt("-90"));
        let total: LedgerAmount = ["1.10", "2.20", "3.30"].iter().map(|s| amt(s)).sum();
        assert_eq!(total, amt("6.6"));
    }

    #[test]
    fn checked_arithmetic_reports_overflow() {
        let big = amt("90000000000");
        assert_eq!(amt("900").checked_add(amt("10")), Some(amt("910")));
        assert_eq!(big.checked_add(big), None);
        assert_eq!(amt("10").checked_sub(amt("100")), Some(amt("-90")));
        assert_eq!((-big).checked_sub(big), None);
    }

    #[test]
    fn serde_uses_decimal_strings() {
        let v = serde_json::to_string(&amt("-123.45")).unwrap();
        assert_eq!(v, "\"-123.45\"");
        let back: LedgerAmount = serde_json::from_str(&v).unwrap();
        assert_eq!(back, amt("-123.45"));
        let whole: LedgerAmount = serde_json::from_str("50").unwrap();
        assert_eq!(whole, LedgerAmount::from_whole(50));
    }
}
