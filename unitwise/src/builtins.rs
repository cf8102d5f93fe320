//! The operators every scope starts out with.

use crate::{
    ast::Fixity,
    math,
    operator::{OperandType, Operator},
    policy::{
        AngleOperand, Conversion, DimensionlessExponent, FromRadians, Matching, MatchingUnits,
        NoCheck, NoUnits, NonZeroDivisor, PercentAware, PercentOf, PowerUnit, ProductUnit,
        QuotientUnit, RootUnit, SameDimension, ScalarUnit, ToRadians, UnaryKernel,
    },
    quantity::ValueType,
};

use crate::operator::OperandType::{Number as N, Percent as P};

fn truth(condition: bool) -> f64 {
    if condition {
        1.0
    } else {
        0.0
    }
}

fn is_true(x: f64) -> bool {
    x != 0.0 && !x.is_nan()
}

fn prefix(symbol: &str, operand: OperandType, kernel: fn(f64) -> f64) -> Operator {
    Operator::unary(symbol, operand, Fixity::Prefix, kernel)
}

fn postfix(symbol: &str, kernel: fn(f64) -> f64) -> Operator {
    Operator::unary(symbol, N, Fixity::Postfix, kernel)
}

fn arithmetic() -> Vec<Operator> {
    vec![
        Operator::binary("+", N, N, |x, y| x + y).with_preflight(MatchingUnits),
        Operator::binary("-", N, N, |x, y| x - y).with_preflight(MatchingUnits),
        Operator::binary("*", N, N, |x, y| x * y).with_units(ProductUnit),
        Operator::binary("/", N, N, |x, y| x / y)
            .with_preflight(NonZeroDivisor(NoCheck))
            .with_units(QuotientUnit),
        Operator::binary("^", N, N, f64::powf)
            .with_preflight(DimensionlessExponent)
            .with_units(PowerUnit),
        Operator::binary("mod", N, N, f64::rem_euclid)
            .with_preflight(NonZeroDivisor(MatchingUnits)),
    ]
}

fn percentages() -> Vec<Operator> {
    fn percent_of(
        symbol: &str,
        left: OperandType,
        right: OperandType,
        kernel: fn(f64, f64) -> f64,
    ) -> Operator {
        Operator::binary(symbol, left, right, kernel)
            .with_preflight(PercentAware)
            .with_units(PercentOf)
    }

    vec![
        percent_of("+", N, P, |x, p| x * (1.0 + p / 100.0)),
        percent_of("-", N, P, |x, p| x * (1.0 - p / 100.0)),
        percent_of("*", N, P, |x, p| x * p / 100.0),
        percent_of("*", P, N, |x, p| x * p / 100.0),
        Operator::binary("/", N, P, |x, p| x / (p / 100.0))
            .with_preflight(NonZeroDivisor(PercentAware))
            .with_units(PercentOf),
        Operator::binary("+", P, P, |x, y| x + y)
            .with_preflight(NoUnits)
            .with_units(ScalarUnit)
            .returning(ValueType::Percent),
        Operator::binary("-", P, P, |x, y| x - y)
            .with_preflight(NoUnits)
            .with_units(ScalarUnit)
            .returning(ValueType::Percent),
        prefix("-", P, |x| -x).returning(ValueType::Percent),
        postfix("%", |x| x)
            .with_preflight(NoUnits)
            .with_units(ScalarUnit)
            .returning(ValueType::Percent),
    ]
}

fn comparisons() -> Vec<Operator> {
    fn compare(symbol: &str, kernel: fn(f64, f64) -> f64) -> Operator {
        Operator::binary(symbol, N, N, kernel)
            .with_preflight(MatchingUnits)
            .with_units(Matching::scalar_result())
    }
    fn logical(symbol: &str, kernel: fn(f64, f64) -> f64) -> Operator {
        Operator::binary(symbol, N, N, kernel)
            .with_preflight(NoUnits)
            .with_units(ScalarUnit)
    }

    vec![
        compare("<", |x, y| truth(x < y)),
        compare("<=", |x, y| truth(x <= y)),
        compare(">", |x, y| truth(x > y)),
        compare(">=", |x, y| truth(x >= y)),
        compare("==", |x, y| truth(x == y)),
        compare("!=", |x, y| truth(x != y)),
        logical("AND", |x, y| truth(is_true(x) && is_true(y))),
        logical("OR", |x, y| truth(is_true(x) || is_true(y))),
        prefix("NOT", N, |x| truth(!is_true(x)))
            .with_preflight(NoUnits)
            .with_units(ScalarUnit),
    ]
}

fn functions() -> Vec<Operator> {
    fn scalar(symbol: &str, kernel: fn(f64) -> f64) -> Operator {
        prefix(symbol, N, kernel)
            .with_preflight(NoUnits)
            .with_units(ScalarUnit)
    }
    fn trigonometric(symbol: &str, kernel: fn(f64) -> f64) -> Operator {
        prefix(symbol, N, kernel)
            .with_preflight(AngleOperand)
            .with_units(ToRadians)
    }
    fn inverse_trigonometric(symbol: &str, kernel: fn(f64) -> f64) -> Operator {
        prefix(symbol, N, kernel)
            .with_preflight(NoUnits)
            .with_units(FromRadians)
            .returning(ValueType::Angle)
    }

    vec![
        prefix("-", N, |x| -x),
        prefix("+", N, |x| x),
        prefix("abs", N, f64::abs),
        prefix("sqrt", N, f64::sqrt).with_units(RootUnit),
        trigonometric("sin", f64::sin),
        trigonometric("cos", f64::cos),
        trigonometric("tan", f64::tan),
        inverse_trigonometric("asin", f64::asin),
        inverse_trigonometric("acos", f64::acos),
        inverse_trigonometric("atan", f64::atan),
        scalar("ln", f64::ln),
        scalar("log", f64::log10),
        scalar("exp", f64::exp),
        postfix("!", math::factorial)
            .with_preflight(NoUnits)
            .with_units(ScalarUnit),
    ]
}

fn conversions() -> Vec<Operator> {
    // The unit calculator already did the conversion and hands over a
    // single number.
    vec![Operator::binary("in", N, N, |x, _| x)
        .with_preflight(SameDimension)
        .with_units(Conversion)
        .with_kernel(UnaryKernel(|x| x))
        .without_simplify()]
}

/// All default operators, one per symbol and signature.
pub fn default_operators() -> Vec<Operator> {
    let mut operators = arithmetic();
    operators.extend(percentages());
    operators.extend(comparisons());
    operators.extend(functions());
    operators.extend(conversions());
    operators
}
