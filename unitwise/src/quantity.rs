use std::fmt::Display;

use crate::{
    dimension::Dimension,
    number::Number,
    preferences::Preferences,
    unit::{Result, Unit},
};

/// What kind of value a quantity holds. Percentages pick different
/// operator overloads; angles are numbers that are known to measure an
/// angle even when they carry no unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Number,
    Percent,
    Angle,
}

#[derive(Debug, Clone)]
pub struct Quantity {
    number: Number,
    unit: Unit,
    value_type: ValueType,
}

impl Quantity {
    pub fn new(number: f64, unit: Unit) -> Self {
        Quantity {
            number: Number::from_f64(number),
            unit,
            value_type: ValueType::Number,
        }
    }

    pub fn from_scalar(number: f64) -> Self {
        Quantity::new(number, Unit::scalar())
    }

    pub fn from_unit(unit: Unit) -> Self {
        Quantity::new(1.0, unit)
    }

    pub fn percent(number: f64) -> Self {
        Quantity::from_scalar(number).with_value_type(ValueType::Percent)
    }

    pub fn with_value_type(mut self, value_type: ValueType) -> Self {
        self.value_type = value_type;
        self
    }

    pub fn number(&self) -> f64 {
        self.number.to_f64()
    }

    /// The unit, or `None` for a plain scalar.
    pub fn unit(&self) -> Option<&Unit> {
        (!self.unit.is_scalar()).then_some(&self.unit)
    }

    pub fn unit_or_scalar(&self) -> &Unit {
        &self.unit
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn dimension(&self) -> Dimension {
        self.unit.dimension()
    }

    pub fn is_dimensionless(&self) -> bool {
        self.unit.is_dimensionless()
    }

    pub fn is_zero(&self) -> bool {
        self.number.is_zero()
    }

    /// Numeric value with any dimensionless unit (like `km/m`) folded in.
    pub fn scalar_value(&self) -> f64 {
        if self.unit.is_scalar() {
            self.number()
        } else {
            self.number() * self.unit.conversion_factor()
        }
    }

    /// The same quantity expressed in `target`. Fails if the dimensions
    /// differ.
    pub fn convert_to(&self, target: &Unit) -> Result<Quantity> {
        if &self.unit == target {
            return Ok(self.clone());
        }
        let ratio = self.unit.conversion_ratio_to(target)?;
        Ok(Quantity {
            number: Number::from_f64(self.number() * ratio),
            unit: target.clone(),
            value_type: self.value_type,
        })
    }

    /// Display according to the user's preferences: long unit names are
    /// used unless short names are requested.
    pub fn display(&self, preferences: &Preferences) -> String {
        if preferences.display_short_unit_names || self.unit.is_scalar() {
            return self.to_string();
        }
        let plural = self.number() != 1.0;
        format!("{} {}", self.number, self.unit.long_name(plural))
    }
}

impl PartialEq for Quantity {
    fn eq(&self, other: &Self) -> bool {
        if (self.value_type == ValueType::Percent) != (other.value_type == ValueType::Percent) {
            return false;
        }
        match other.convert_to(&self.unit) {
            Ok(converted) => self.number == converted.number,
            Err(_) => false,
        }
    }
}

impl Display for Quantity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.value_type {
            ValueType::Percent => write!(f, "{}%", self.number),
            _ if self.unit.is_scalar() => write!(f, "{}", self.number),
            _ => write!(f, "{} {}", self.number, self.unit),
        }
    }
}
