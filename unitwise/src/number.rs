use std::fmt::{self, Debug, Display};

use compact_str::{format_compact, CompactString, ToCompactString};
use num_traits::ToPrimitive;
use pretty_dtoa::FmtFloatConfig;
use thiserror::Error;

#[derive(Clone, Error, Debug, PartialEq, Eq)]
pub enum NumberError {
    #[error("Invalid number literal '{0}'")]
    InvalidLiteral(String),
}

/// A type that acts like an `f64`
///
/// To make this type `Eq`, we actually store a `u64`. To convert to and from `f64`
/// we use the [`f64::from_bits`] and [`f64::to_bits`] functions.
///
/// `PartialEq` compares the float values, so `0.0 == -0.0`.
#[derive(Clone, Copy, Eq)]
pub struct Number(u64);

impl Debug for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Number").field(&self.to_f64()).finish()
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        self.to_f64() == other.to_f64()
    }
}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        self.to_f64().partial_cmp(&other.to_f64())
    }
}

impl Number {
    pub fn from_f64(n: f64) -> Self {
        Number(n.to_bits())
    }

    pub fn to_f64(self) -> f64 {
        let Number(n) = self;
        f64::from_bits(n)
    }

    /// Parse a number literal as written in an expression. Spaces, `_` and
    /// `,` are digit group separators and are ignored: `1 000 000`,
    /// `1_000_000` and `1,000,000` are all the same number.
    pub fn parse_literal(literal: &str) -> Result<Self, NumberError> {
        let digits: String = literal
            .chars()
            .filter(|c| !matches!(c, ' ' | '_' | ',' | '\u{202f}'))
            .collect();

        let invalid = || NumberError::InvalidLiteral(literal.to_owned());

        if digits.is_empty()
            || !digits
                .chars()
                .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'))
        {
            return Err(invalid());
        }

        digits.parse::<f64>().map(Number::from_f64).map_err(|_| invalid())
    }

    pub fn is_zero(self) -> bool {
        self.to_f64() == 0.0
    }

    pub fn abs(self) -> Self {
        Number::from_f64(self.to_f64().abs())
    }

    fn is_integer(self) -> bool {
        self.to_f64().trunc() == self.to_f64()
    }

    /// Format for display: integers get digit grouping with a space
    /// (`1 000 000`), everything else is rounded to six significant digits.
    pub fn pretty_print(self) -> CompactString {
        let number = self.to_f64();

        // Integers up to 2^53 are exact in an f64.
        if self.is_integer() && number.abs() < 1e15 {
            if let Some(integer) = number.to_i64() {
                return group_digits(integer);
            }
        }

        let config = FmtFloatConfig::default()
            .max_significant_digits(6)
            .add_point_zero(false)
            .lower_e_break(-6)
            .upper_e_break(15)
            .round();

        let formatted = pretty_dtoa::dtoa(number, config);

        if formatted.contains('.') && !formatted.contains('e') {
            let trimmed = formatted.trim_end_matches('0');
            match trimmed.strip_suffix('.') {
                Some(integral) => integral.to_compact_string(),
                None => trimmed.to_compact_string(),
            }
        } else if formatted.contains('e') && !formatted.contains("e-") {
            format_compact!("{}", formatted.replace('e', "e+"))
        } else {
            formatted.to_compact_string()
        }
    }
}

fn group_digits(integer: i64) -> CompactString {
    use num_format::{CustomFormat, Grouping, ToFormattedString};

    let grouping = if integer.unsigned_abs() >= 10_000 {
        Grouping::Standard
    } else {
        Grouping::Posix
    };

    match CustomFormat::builder()
        .grouping(grouping)
        .minus_sign("-")
        .separator(" ")
        .build()
    {
        Ok(format) => integer.to_formatted_string(&format).to_compact_string(),
        Err(_) => integer.to_compact_string(),
    }
}

impl Display for Number {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.pretty_print())
    }
}

impl From<f64> for Number {
    fn from(value: f64) -> Self {
        Number::from_f64(value)
    }
}

impl std::ops::Mul for Number {
    type Output = Number;

    fn mul(self, rhs: Self) -> Self::Output {
        Number::from_f64(self.to_f64() * rhs.to_f64())
    }
}

impl std::ops::Neg for Number {
    type Output = Number;

    fn neg(self) -> Self::Output {
        Number::from_f64(-self.to_f64())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_literals() {
        let parse = |s| Number::parse_literal(s).map(Number::to_f64);
        assert_eq!(parse("3291"), Ok(3291.0));
        assert_eq!(parse("1 000 000"), Ok(1.0e6));
        assert_eq!(parse("1_000_000"), Ok(1.0e6));
        assert_eq!(parse("1,000.5"), Ok(1000.5));
        assert_eq!(parse("2.5e-3"), Ok(0.0025));
        assert_eq!(parse(".5"), Ok(0.5));
        assert_eq!(
            parse("12abc"),
            Err(NumberError::InvalidLiteral("12abc".into()))
        );
        assert!(parse("").is_err());
        assert!(parse("1.2.3").is_err());
        assert!(parse("inf").is_err());
    }

    #[test]
    fn pretty_print() {
        assert_eq!(Number::from_f64(1.).pretty_print(), "1");
        assert_eq!(Number::from_f64(100.).pretty_print(), "100");
        assert_eq!(Number::from_f64(1234.).pretty_print(), "1234");
        assert_eq!(Number::from_f64(12345.).pretty_print(), "12 345");
        assert_eq!(Number::from_f64(1e6).pretty_print(), "1 000 000");
        assert_eq!(Number::from_f64(-1234567.).pretty_print(), "-1 234 567");
        assert_eq!(Number::from_f64(1.234).pretty_print(), "1.234");
        assert_eq!(Number::from_f64(1.23456789).pretty_print(), "1.23457");
        assert_eq!(Number::from_f64(0.5).pretty_print(), "0.5");
        assert_eq!(Number::from_f64(1.234e50).pretty_print(), "1.234e+50");
        assert_eq!(Number::from_f64(1.234e-50).pretty_print(), "1.234e-50");
    }

    #[test]
    fn equality_ignores_sign_of_zero() {
        assert_eq!(Number::from_f64(0.0), Number::from_f64(-0.0));
        assert!(Number::from_f64(-0.0).is_zero());
        assert_eq!(Number::from_f64(-2.0).abs(), Number::from_f64(2.0));
    }
}
