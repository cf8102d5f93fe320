use std::{fmt::Display, rc::Rc};

use compact_str::{CompactString, ToCompactString};
use itertools::Itertools;
use thiserror::Error;

use crate::{
    arithmetic::{pretty_exponent, rational_exponent, Exponent, Power, PowerError, Rational},
    dimension::Dimension,
    product::{Canonicalize, Product},
};

pub type ConversionFactor = f64;

#[derive(Clone, Error, Debug, PartialEq)]
pub enum UnitError {
    #[error("Incompatible dimensions: {0} and {1}")]
    IncompatibleDimensions(Dimension, Dimension),

    #[error("Raising to the power {0} would result in non-integer unit exponents")]
    NonIntegralExponent(Rational),

    #[error("Unsupported exponent {0} for a quantity with a unit")]
    UnsupportedExponent(f64),

    #[error("Unit exponents are out of range")]
    ExponentOutOfRange,
}

pub type Result<T> = std::result::Result<T, UnitError>;

/// A named unit is either primitive (the reference unit of a base
/// dimension) or derived from another unit through a conversion factor.
#[derive(Debug, Clone)]
pub enum UnitKind {
    Primitive(CompactString),
    Derived(ConversionFactor, Unit),
}

#[derive(Debug, Clone)]
pub struct UnitIdentifier {
    pub name: CompactString,
    pub singular: CompactString,
    pub plural: CompactString,
    kind: UnitKind,
}

impl UnitIdentifier {
    pub fn primitive(name: &str, dimension: &str) -> Self {
        Self {
            name: name.to_compact_string(),
            singular: name.to_compact_string(),
            plural: name.to_compact_string(),
            kind: UnitKind::Primitive(dimension.to_compact_string()),
        }
    }

    pub fn derived(name: &str, factor: ConversionFactor, definition: Unit) -> Self {
        Self {
            name: name.to_compact_string(),
            singular: name.to_compact_string(),
            plural: name.to_compact_string(),
            kind: UnitKind::Derived(factor, definition),
        }
    }

    pub fn with_long_names(mut self, singular: &str, plural: &str) -> Self {
        self.singular = singular.to_compact_string();
        self.plural = plural.to_compact_string();
        self
    }

    pub fn kind(&self) -> &UnitKind {
        &self.kind
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self.kind, UnitKind::Primitive(_))
    }
}

impl PartialEq for UnitIdentifier {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for UnitIdentifier {}

/// A unit expressed through primitive units only, together with the factor
/// that converts a value in the original unit into that representation.
#[derive(Clone, Debug)]
pub struct BaseUnitAndFactor(pub Unit, pub ConversionFactor);

impl std::iter::Product for BaseUnitAndFactor {
    fn product<I: Iterator<Item = Self>>(iter: I) -> Self {
        let (fst, snd) = iter.tee();
        BaseUnitAndFactor(fst.map(|i| i.0).product(), snd.map(|i| i.1).product())
    }
}

#[derive(Debug, Clone)]
pub struct UnitFactor {
    pub unit_id: Rc<UnitIdentifier>,
    pub exponent: Exponent,
}

impl UnitFactor {
    fn base_unit_and_factor(&self) -> BaseUnitAndFactor {
        match &self.unit_id.kind {
            UnitKind::Primitive(_) => BaseUnitAndFactor(Unit::from_factor(self.clone()), 1.0),
            UnitKind::Derived(factor, definition) => {
                let (base_unit, definition_factor) = definition.to_base_unit_representation();
                BaseUnitAndFactor(
                    base_unit.power(self.exponent),
                    (factor * definition_factor).powi(self.exponent),
                )
            }
        }
    }
}

impl PartialEq for UnitFactor {
    fn eq(&self, other: &Self) -> bool {
        self.unit_id == other.unit_id && self.exponent == other.exponent
    }
}

impl Eq for UnitFactor {}

impl Canonicalize for UnitFactor {
    type MergeKey = CompactString;

    fn merge_key(&self) -> Self::MergeKey {
        self.unit_id.name.clone()
    }

    fn merge(self, other: Self) -> Self {
        UnitFactor {
            unit_id: self.unit_id,
            exponent: self.exponent.saturating_add(other.exponent),
        }
    }

    fn is_trivial(&self) -> bool {
        self.exponent == 0
    }
}

impl Power for UnitFactor {
    fn exponent(&self) -> Exponent {
        self.exponent
    }

    fn with_exponent(self, exponent: Exponent) -> Self {
        UnitFactor {
            unit_id: self.unit_id,
            exponent,
        }
    }
}

impl Display for UnitFactor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.unit_id.name, pretty_exponent(self.exponent))
    }
}

pub type Unit = Product<UnitFactor>;

impl Unit {
    pub fn scalar() -> Self {
        Self::unity()
    }

    pub fn is_scalar(&self) -> bool {
        self.is_empty()
    }

    pub fn named(unit_id: UnitIdentifier) -> Self {
        Self::from_identifier(Rc::new(unit_id))
    }

    pub fn from_identifier(unit_id: Rc<UnitIdentifier>) -> Self {
        Self::from_factor(UnitFactor {
            unit_id,
            exponent: 1,
        })
    }

    pub fn by(self, other: Unit) -> Unit {
        self * other
    }

    pub fn per(self, other: Unit) -> Unit {
        self / other
    }

    /// `by` for units that come from user input, where exponents can
    /// overflow.
    pub fn checked_by(self, other: Unit) -> Result<Unit> {
        self.checked_mul(other).ok_or(UnitError::ExponentOutOfRange)
    }

    pub fn checked_per(self, other: Unit) -> Result<Unit> {
        self.checked_div(other).ok_or(UnitError::ExponentOutOfRange)
    }

    /// Raise to a rational power. Only succeeds if every exponent of the
    /// result is an integer, so `(m²)^0.5 = m` but `m^0.5` is an error.
    pub fn pow(self, exponent: Rational) -> Result<Unit> {
        self.checked_power(exponent).map_err(|e| match e {
            PowerError::NonIntegral => UnitError::NonIntegralExponent(exponent),
            PowerError::OutOfRange => UnitError::ExponentOutOfRange,
        })
    }

    pub fn powf(self, exponent: f64) -> Result<Unit> {
        match rational_exponent(exponent) {
            Some(exponent) => self.pow(exponent),
            None if exponent.is_finite() && exponent.fract() == 0.0 => {
                Err(UnitError::ExponentOutOfRange)
            }
            None => Err(UnitError::UnsupportedExponent(exponent)),
        }
    }

    /// The single named unit this unit consists of, if it is exactly one
    /// named unit to the first power.
    pub fn as_named(&self) -> Option<&Rc<UnitIdentifier>> {
        let mut factors = self.iter();
        match (factors.next(), factors.next()) {
            (Some(factor), None) if factor.exponent == 1 => Some(&factor.unit_id),
            _ => None,
        }
    }

    pub fn to_base_unit_representation(&self) -> (Unit, ConversionFactor) {
        let BaseUnitAndFactor(base_unit, factor) = self
            .iter()
            .map(UnitFactor::base_unit_and_factor)
            .product();
        (base_unit, factor)
    }

    /// Factor that converts a value in this unit into primitive units.
    pub fn conversion_factor(&self) -> ConversionFactor {
        self.to_base_unit_representation().1
    }

    pub fn dimension(&self) -> Dimension {
        self.to_base_unit_representation()
            .0
            .iter()
            .filter_map(|factor| match &factor.unit_id.kind {
                UnitKind::Primitive(dimension) => {
                    Some(Dimension::base(dimension).power(factor.exponent))
                }
                UnitKind::Derived(..) => None,
            })
            .product()
    }

    pub fn is_dimensionless(&self) -> bool {
        self.dimension().is_dimensionless()
    }

    /// A unit written as a pure reciprocal, like `s⁻¹`.
    pub fn is_reciprocal(&self) -> bool {
        !self.is_empty() && self.iter().all(|factor| factor.exponent < 0)
    }

    /// Factor by which a value in this unit must be multiplied to express it
    /// in `target`.
    pub fn conversion_ratio_to(&self, target: &Unit) -> Result<f64> {
        let (source_dimension, target_dimension) = (self.dimension(), target.dimension());
        if source_dimension != target_dimension {
            return Err(UnitError::IncompatibleDimensions(
                source_dimension,
                target_dimension,
            ));
        }
        Ok(self.conversion_factor() / target.conversion_factor())
    }

    /// Written out with long unit names, like `meters per second²`.
    pub fn long_name(&self, plural: bool) -> String {
        let name = |factor: &UnitFactor, plural: bool| {
            let id = &factor.unit_id;
            let name = if plural { &id.plural } else { &id.singular };
            format!("{}{}", name, pretty_exponent(factor.exponent.saturating_abs()))
        };

        let positive = self.iter().filter(|f| f.exponent > 0).collect::<Vec<_>>();
        let negative = self.iter().filter(|f| f.exponent < 0).collect::<Vec<_>>();

        let last = positive.len();
        let numerator = positive
            .into_iter()
            .enumerate()
            .map(|(i, f)| name(f, plural && i + 1 == last))
            .join(" ");
        let denominator = negative.into_iter().map(|f| name(f, false)).join(" ");

        match (numerator.is_empty(), denominator.is_empty()) {
            (_, true) => numerator,
            (true, false) => format!("per {denominator}"),
            (false, false) => format!("{numerator} per {denominator}"),
        }
    }

    #[cfg(test)]
    pub fn meter() -> Self {
        Unit::named(UnitIdentifier::primitive("m", "Length").with_long_names("meter", "meters"))
    }

    #[cfg(test)]
    pub fn kilometer() -> Self {
        Unit::named(
            UnitIdentifier::derived("km", 1000.0, Unit::meter())
                .with_long_names("kilometer", "kilometers"),
        )
    }

    #[cfg(test)]
    pub fn centimeter() -> Self {
        Unit::named(UnitIdentifier::derived("cm", 0.01, Unit::meter()))
    }

    #[cfg(test)]
    pub fn second() -> Self {
        Unit::named(UnitIdentifier::primitive("s", "Time").with_long_names("second", "seconds"))
    }

    #[cfg(test)]
    pub fn hour() -> Self {
        Unit::named(UnitIdentifier::derived("h", 3600.0, Unit::second()))
    }

    #[cfg(test)]
    pub fn gram() -> Self {
        Unit::named(UnitIdentifier::primitive("g", "Mass"))
    }

    #[cfg(test)]
    pub fn kilogram() -> Self {
        Unit::named(UnitIdentifier::derived("kg", 1000.0, Unit::gram()))
    }

    #[cfg(test)]
    pub fn newton() -> Self {
        Unit::named(UnitIdentifier::derived(
            "N",
            1.0,
            Unit::kilogram() * Unit::meter() / Unit::second().power(2),
        ))
    }
}

impl Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.as_string("·", "/"))
    }
}
