use compact_str::CompactString;
use num_rational::Ratio;
use num_traits::{CheckedMul, FromPrimitive, ToPrimitive};

pub type Rational = Ratio<i64>;
pub type Exponent = i32;

/// Why a factor could not be raised to a rational power.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerError {
    NonIntegral,
    OutOfRange,
}

/// A factor that carries an integral exponent, like `m²` or `Time⁻¹`.
pub trait Power: Sized {
    fn exponent(&self) -> Exponent;
    fn with_exponent(self, exponent: Exponent) -> Self;

    fn power(self, e: Exponent) -> Self {
        let exponent = self.exponent().saturating_mul(e);
        self.with_exponent(exponent)
    }

    fn invert(self) -> Self {
        self.power(-1)
    }

    /// Raise to a rational power. The resulting exponent has to be an
    /// integer that fits into an [`Exponent`].
    fn checked_power(self, e: Rational) -> Result<Self, PowerError> {
        let exponent = Rational::from_integer(i64::from(self.exponent()))
            .checked_mul(&e)
            .ok_or(PowerError::OutOfRange)?;
        if !exponent.is_integer() {
            return Err(PowerError::NonIntegral);
        }
        let exponent = exponent
            .to_integer()
            .to_i32()
            .ok_or(PowerError::OutOfRange)?;
        Ok(self.with_exponent(exponent))
    }

    /// The factor with the exponents of `self` and `other` added, if the sum
    /// fits.
    fn checked_merge(self, other: &Self) -> Option<Self> {
        let exponent = self.exponent().checked_add(other.exponent())?;
        Some(self.with_exponent(exponent))
    }
}

/// Best rational approximation of a float exponent, as used for `x^y` with units.
pub fn rational_exponent(value: f64) -> Option<Rational> {
    if !value.is_finite() {
        return None;
    }
    if value.fract() == 0.0 {
        return value.to_i64().map(Rational::from_integer);
    }
    Rational::from_f64(value)
}

pub fn pretty_exponent(e: Exponent) -> CompactString {
    if e == 1 {
        return CompactString::const_new("");
    }

    e.to_string()
        .chars()
        .map(|c| match c {
            '-' => '⁻',
            '0' => '⁰',
            '1' => '¹',
            '2' => '²',
            '3' => '³',
            '4' => '⁴',
            '5' => '⁵',
            '6' => '⁶',
            '7' => '⁷',
            '8' => '⁸',
            '9' => '⁹',
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Factor(Exponent);

    impl Power for Factor {
        fn exponent(&self) -> Exponent {
            self.0
        }

        fn with_exponent(self, exponent: Exponent) -> Self {
            Factor(exponent)
        }
    }

    #[test]
    fn checked_power_requires_integral_result() {
        assert_eq!(Factor(2).checked_power(Rational::new(1, 2)), Ok(Factor(1)));
        assert_eq!(
            Factor(1).checked_power(Rational::new(1, 2)),
            Err(PowerError::NonIntegral)
        );
        assert_eq!(Factor(-3).checked_power(Rational::new(2, 3)), Ok(Factor(-2)));
    }

    #[test]
    fn huge_exponents_are_out_of_range() {
        assert_eq!(
            Factor(2).checked_power(Rational::from_integer(i64::MAX / 2 + 1)),
            Err(PowerError::OutOfRange)
        );
        assert_eq!(
            Factor(1).checked_power(Rational::from_integer(5_000_000_000)),
            Err(PowerError::OutOfRange)
        );
        assert_eq!(Factor(i32::MAX).checked_merge(&Factor(1)), None);
        assert_eq!(Factor(3).checked_merge(&Factor(-1)), Some(Factor(2)));
        assert_eq!(Factor(i32::MAX).power(2), Factor(i32::MAX));
    }

    #[test]
    fn rational_exponents_from_floats() {
        assert_eq!(rational_exponent(2.0), Some(Rational::from_integer(2)));
        assert_eq!(rational_exponent(0.5), Some(Rational::new(1, 2)));
        assert_eq!(rational_exponent(-0.25), Some(Rational::new(-1, 4)));
        assert_eq!(rational_exponent(f64::NAN), None);
    }

    #[test]
    fn superscripts() {
        assert_eq!(pretty_exponent(1), "");
        assert_eq!(pretty_exponent(2), "²");
        assert_eq!(pretty_exponent(-1), "⁻¹");
        assert_eq!(pretty_exponent(12), "¹²");
    }
}
