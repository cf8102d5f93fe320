//! The building blocks operators are assembled from.
//!
//! Every operator runs a [`PreflightCheck`] that may reject the operands with
//! a diagnostic, then a [`UnitCalculator`] that decides on the unit of the
//! result and brings the operands into a common unit, and finally a
//! [`ValueCalculator`] that only ever sees plain numbers.

use crate::{
    context::EvalContext,
    diagnostic::ErrorKind,
    dimension::Dimension,
    operator::{Operand, Operands},
    quantity::{Quantity, ValueType},
    unit::Unit,
};

pub trait PreflightCheck {
    /// Returns `false` if the operator must not be applied. Implementations
    /// report a diagnostic before returning `false`.
    fn check(&self, operands: &Operands<'_>, ctx: &mut EvalContext<'_>) -> bool;
}

/// Inputs for the numeric kernel and the unit of its result.
#[derive(Debug, Clone, PartialEq)]
pub struct Calculation {
    pub inputs: (f64, Option<f64>),
    pub unit: Unit,
    /// Applied to the kernel result.
    pub scale: f64,
}

impl Calculation {
    pub fn new(inputs: (f64, Option<f64>), unit: Unit) -> Self {
        Self {
            inputs,
            unit,
            scale: 1.0,
        }
    }

    pub fn scaled(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }
}

pub trait UnitCalculator {
    fn calculate(&self, operands: &Operands<'_>, ctx: &mut EvalContext<'_>)
        -> Option<Calculation>;
}

pub trait ValueCalculator {
    fn calculate(&self, x: f64, y: Option<f64>) -> f64;
}

pub struct UnaryKernel(pub fn(f64) -> f64);

impl ValueCalculator for UnaryKernel {
    fn calculate(&self, x: f64, _: Option<f64>) -> f64 {
        (self.0)(x)
    }
}

pub struct BinaryKernel(pub fn(f64, f64) -> f64);

impl ValueCalculator for BinaryKernel {
    fn calculate(&self, x: f64, y: Option<f64>) -> f64 {
        match y {
            Some(y) => (self.0)(x, y),
            None => f64::NAN,
        }
    }
}

fn report_mismatch(
    ctx: &mut EvalContext<'_>,
    expected: Dimension,
    offending: &Operand<'_>,
    other: Option<&Operand<'_>>,
) {
    let kind = ErrorKind::DimensionMismatch {
        expected,
        actual: offending.value.dimension(),
    };
    match other {
        Some(other) => ctx.report_pair(kind, offending.node, other.node),
        None => ctx.report(kind, offending.node),
    }
}

pub struct NoCheck;

impl PreflightCheck for NoCheck {
    fn check(&self, _: &Operands<'_>, _: &mut EvalContext<'_>) -> bool {
        true
    }
}

/// Both operands have the same dimension, or one of them is dimensionless
/// and simply adopts the unit of the other.
pub struct MatchingUnits;

impl PreflightCheck for MatchingUnits {
    fn check(&self, operands: &Operands<'_>, ctx: &mut EvalContext<'_>) -> bool {
        let Some(right) = &operands.right else {
            return true;
        };
        let left = &operands.left;
        if left.value.is_dimensionless()
            || right.value.is_dimensionless()
            || left.value.dimension() == right.value.dimension()
        {
            return true;
        }
        report_mismatch(ctx, left.value.dimension(), right, Some(left));
        false
    }
}

/// Both operands have exactly the same dimension. Used for conversions,
/// where a plain number cannot stand in for a unit.
pub struct SameDimension;

impl PreflightCheck for SameDimension {
    fn check(&self, operands: &Operands<'_>, ctx: &mut EvalContext<'_>) -> bool {
        let Some(right) = &operands.right else {
            return true;
        };
        let left = &operands.left;
        if left.value.dimension() == right.value.dimension() {
            return true;
        }
        report_mismatch(ctx, right.value.dimension(), left, Some(right));
        false
    }
}

/// Every operand is dimensionless. Each offending operand gets its own
/// diagnostic.
pub struct NoUnits;

impl PreflightCheck for NoUnits {
    fn check(&self, operands: &Operands<'_>, ctx: &mut EvalContext<'_>) -> bool {
        let mut ok = true;
        for operand in operands.iter() {
            if !operand.value.is_dimensionless() {
                report_mismatch(ctx, Dimension::dimensionless(), operand, None);
                ok = false;
            }
        }
        ok
    }
}

/// Percentages have to be plain numbers; the other operand may carry any
/// unit.
pub struct PercentAware;

impl PreflightCheck for PercentAware {
    fn check(&self, operands: &Operands<'_>, ctx: &mut EvalContext<'_>) -> bool {
        let mut ok = true;
        for operand in operands.iter() {
            if operand.value.value_type() == ValueType::Percent
                && !operand.value.is_dimensionless()
            {
                report_mismatch(ctx, Dimension::dimensionless(), operand, None);
                ok = false;
            }
        }
        ok
    }
}

/// Runs `P`, then rejects a zero right operand.
pub struct NonZeroDivisor<P>(pub P);

impl<P: PreflightCheck> PreflightCheck for NonZeroDivisor<P> {
    fn check(&self, operands: &Operands<'_>, ctx: &mut EvalContext<'_>) -> bool {
        if !self.0.check(operands, ctx) {
            return false;
        }
        match &operands.right {
            Some(divisor) if divisor.value.is_zero() => {
                ctx.report(ErrorKind::DivideByZero, divisor.node);
                false
            }
            _ => true,
        }
    }
}

pub struct DimensionlessExponent;

impl PreflightCheck for DimensionlessExponent {
    fn check(&self, operands: &Operands<'_>, ctx: &mut EvalContext<'_>) -> bool {
        match &operands.right {
            Some(exponent) if !exponent.value.is_dimensionless() => {
                report_mismatch(
                    ctx,
                    Dimension::dimensionless(),
                    exponent,
                    Some(&operands.left),
                );
                false
            }
            _ => true,
        }
    }
}

/// The operand is an angle or a plain number.
pub struct AngleOperand;

impl PreflightCheck for AngleOperand {
    fn check(&self, operands: &Operands<'_>, ctx: &mut EvalContext<'_>) -> bool {
        let operand = &operands.left;
        if operand.value.is_dimensionless() {
            return true;
        }
        match ctx.angle_dimension() {
            Some(angle) if angle == operand.value.dimension() => true,
            angle => {
                report_mismatch(
                    ctx,
                    angle.unwrap_or_else(Dimension::dimensionless),
                    operand,
                    None,
                );
                false
            }
        }
    }
}

fn right_operand<'a, 'n>(operands: &'a Operands<'n>) -> Option<&'a Operand<'n>> {
    operands.right.as_ref()
}

/// Brings the right operand into the unit of the left one. A dimensionless
/// operand adopts the unit of the other side.
#[derive(Default)]
pub struct Matching {
    pub scalar_result: bool,
}

impl Matching {
    pub fn scalar_result() -> Self {
        Self {
            scalar_result: true,
        }
    }
}

impl UnitCalculator for Matching {
    fn calculate(
        &self,
        operands: &Operands<'_>,
        ctx: &mut EvalContext<'_>,
    ) -> Option<Calculation> {
        let left = &operands.left.value;
        let right = right_operand(operands)?;

        let (x, y, unit) = match (left.is_dimensionless(), right.value.is_dimensionless()) {
            (true, true) => (left.scalar_value(), right.value.scalar_value(), Unit::scalar()),
            (true, false) => (
                left.scalar_value(),
                right.value.number(),
                right.value.unit_or_scalar().clone(),
            ),
            (false, true) => (
                left.number(),
                right.value.scalar_value(),
                left.unit_or_scalar().clone(),
            ),
            (false, false) => match right.value.convert_to(left.unit_or_scalar()) {
                Ok(converted) => (
                    left.number(),
                    converted.number(),
                    left.unit_or_scalar().clone(),
                ),
                Err(e) => {
                    ctx.report(ErrorKind::UnitError(e), right.node);
                    return None;
                }
            },
        };

        let unit = if self.scalar_result {
            Unit::scalar()
        } else {
            unit
        };
        Some(Calculation::new((x, Some(y)), unit))
    }
}

pub struct ProductUnit;

impl UnitCalculator for ProductUnit {
    fn calculate(
        &self,
        operands: &Operands<'_>,
        ctx: &mut EvalContext<'_>,
    ) -> Option<Calculation> {
        let left = &operands.left.value;
        let right = right_operand(operands)?;
        let unit = left
            .unit_or_scalar()
            .clone()
            .checked_by(right.value.unit_or_scalar().clone());
        match unit {
            Ok(unit) => Some(Calculation::new(
                (left.number(), Some(right.value.number())),
                unit,
            )),
            Err(e) => {
                ctx.report_pair(ErrorKind::UnitError(e), right.node, operands.left.node);
                None
            }
        }
    }
}

/// `l.unit / r.unit`, except that a plain number divided by a quantity
/// yields the reciprocal of the divisor's unit: `1 / (2 s)` is `0.5 s⁻¹`.
pub struct QuotientUnit;

impl UnitCalculator for QuotientUnit {
    fn calculate(
        &self,
        operands: &Operands<'_>,
        ctx: &mut EvalContext<'_>,
    ) -> Option<Calculation> {
        let left = &operands.left.value;
        let divisor = right_operand(operands)?;
        let right = &divisor.value;

        let reciprocal = left.is_dimensionless()
            && !right.is_dimensionless()
            && !right.unit_or_scalar().is_reciprocal();
        let (x, numerator) = if reciprocal {
            (left.scalar_value(), Unit::scalar())
        } else {
            (left.number(), left.unit_or_scalar().clone())
        };

        match numerator.checked_per(right.unit_or_scalar().clone()) {
            Ok(unit) => Some(Calculation::new((x, Some(right.number())), unit)),
            Err(e) => {
                ctx.report_pair(ErrorKind::UnitError(e), divisor.node, operands.left.node);
                None
            }
        }
    }
}

pub struct PowerUnit;

impl UnitCalculator for PowerUnit {
    fn calculate(
        &self,
        operands: &Operands<'_>,
        ctx: &mut EvalContext<'_>,
    ) -> Option<Calculation> {
        let base = &operands.left;
        let exponent = right_operand(operands)?;
        let y = exponent.value.scalar_value();

        if base.value.is_dimensionless() {
            return Some(Calculation::new(
                (base.value.scalar_value(), Some(y)),
                Unit::scalar(),
            ));
        }

        match base.value.unit_or_scalar().clone().powf(y) {
            Ok(unit) => Some(Calculation::new((base.value.number(), Some(y)), unit)),
            Err(e) => {
                ctx.report_pair(ErrorKind::UnitError(e), exponent.node, base.node);
                None
            }
        }
    }
}

/// Square root: every unit exponent is halved and has to stay integral.
pub struct RootUnit;

impl UnitCalculator for RootUnit {
    fn calculate(
        &self,
        operands: &Operands<'_>,
        ctx: &mut EvalContext<'_>,
    ) -> Option<Calculation> {
        let operand = &operands.left;
        if operand.value.is_dimensionless() {
            return Some(Calculation::new(
                (operand.value.scalar_value(), None),
                Unit::scalar(),
            ));
        }

        match operand.value.unit_or_scalar().clone().powf(0.5) {
            Ok(unit) => Some(Calculation::new((operand.value.number(), None), unit)),
            Err(e) => {
                ctx.report(ErrorKind::UnitError(e), operand.node);
                None
            }
        }
    }
}

pub struct SameUnit;

impl UnitCalculator for SameUnit {
    fn calculate(&self, operands: &Operands<'_>, _: &mut EvalContext<'_>) -> Option<Calculation> {
        let value = &operands.left.value;
        Some(Calculation::new(
            (value.number(), operands.right.as_ref().map(|r| r.value.number())),
            value.unit_or_scalar().clone(),
        ))
    }
}

/// For operands that were checked to be dimensionless.
pub struct ScalarUnit;

impl UnitCalculator for ScalarUnit {
    fn calculate(&self, operands: &Operands<'_>, _: &mut EvalContext<'_>) -> Option<Calculation> {
        Some(Calculation::new(
            (
                operands.left.value.scalar_value(),
                operands.right.as_ref().map(|r| r.value.scalar_value()),
            ),
            Unit::scalar(),
        ))
    }
}

/// Hands the kernel `(base, percentage)` regardless of which side the
/// percentage was written on. The result keeps the unit of the base.
pub struct PercentOf;

impl UnitCalculator for PercentOf {
    fn calculate(&self, operands: &Operands<'_>, _: &mut EvalContext<'_>) -> Option<Calculation> {
        let left = &operands.left.value;
        let right = &right_operand(operands)?.value;

        let (base, percent) = if left.value_type() == ValueType::Percent
            && right.value_type() != ValueType::Percent
        {
            (right, left)
        } else {
            (left, right)
        };

        Some(Calculation::new(
            (base.number(), Some(percent.scalar_value())),
            base.unit_or_scalar().clone(),
        ))
    }
}

/// Converts an angle to radians. Plain numbers are read in the preferred
/// angle unit, or as radians if none is configured. The primitive unit of
/// the angle dimension is taken to be the radian.
pub struct ToRadians;

impl UnitCalculator for ToRadians {
    fn calculate(&self, operands: &Operands<'_>, ctx: &mut EvalContext<'_>) -> Option<Calculation> {
        let operand = &operands.left.value;

        let radians = if !operand.is_dimensionless() {
            operand.number() * operand.unit_or_scalar().conversion_factor()
        } else if operand.value_type() == ValueType::Angle {
            operand.scalar_value()
        } else {
            match ctx.preferred_angle_unit() {
                Some(unit) => operand.scalar_value() * unit.conversion_factor(),
                None => operand.scalar_value(),
            }
        };

        Some(Calculation::new((radians, None), Unit::scalar()))
    }
}

/// Expresses a result in radians in the preferred angle unit, if one is
/// configured.
pub struct FromRadians;

impl UnitCalculator for FromRadians {
    fn calculate(&self, operands: &Operands<'_>, ctx: &mut EvalContext<'_>) -> Option<Calculation> {
        let x = operands.left.value.scalar_value();
        match ctx.preferred_angle_unit() {
            Some(unit) => {
                let scale = 1.0 / unit.conversion_factor();
                Some(Calculation::new((x, None), unit).scaled(scale))
            }
            None => Some(Calculation::new((x, None), Unit::scalar())),
        }
    }
}

/// `x in y`: expresses the left operand in the unit of the right one. The
/// number on the right is ignored.
pub struct Conversion;

impl UnitCalculator for Conversion {
    fn calculate(
        &self,
        operands: &Operands<'_>,
        ctx: &mut EvalContext<'_>,
    ) -> Option<Calculation> {
        let source = &operands.left;
        let target = right_operand(operands)?;
        let converted: Result<Quantity, _> = source
            .value
            .convert_to(target.value.unit_or_scalar());
        match converted {
            Ok(converted) => Some(Calculation::new(
                (converted.number(), None),
                converted.unit_or_scalar().clone(),
            )),
            Err(e) => {
                ctx.report_pair(ErrorKind::UnitError(e), source.node, target.node);
                None
            }
        }
    }
}
