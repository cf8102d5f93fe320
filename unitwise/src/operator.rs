use std::{fmt::Display, rc::Rc};

use compact_str::{CompactString, ToCompactString};
use indexmap::IndexMap;
use log::{debug, trace};
use thiserror::Error;

use crate::{
    ast::{Fixity, Node},
    context::EvalContext,
    policy::{
        BinaryKernel, Matching, NoCheck, PreflightCheck, SameUnit, UnaryKernel, UnitCalculator,
        ValueCalculator,
    },
    quantity::{Quantity, ValueType},
};

/// The runtime type of an operand, as far as operator resolution is
/// concerned. Angles resolve like plain numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperandType {
    Number,
    Percent,
}

impl From<ValueType> for OperandType {
    fn from(value_type: ValueType) -> Self {
        match value_type {
            ValueType::Number | ValueType::Angle => OperandType::Number,
            ValueType::Percent => OperandType::Percent,
        }
    }
}

impl Display for OperandType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OperandType::Number => write!(f, "number"),
            OperandType::Percent => write!(f, "percent"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Signature {
    Binary(OperandType, OperandType),
    Unary(OperandType, Fixity),
}

impl Display for Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Signature::Binary(left, right) => write!(f, "({left}, {right})"),
            Signature::Unary(operand, Fixity::Prefix) => write!(f, "prefix {operand}"),
            Signature::Unary(operand, Fixity::Postfix) => write!(f, "postfix {operand}"),
        }
    }
}

/// An evaluated operand together with the node it came from, so that
/// diagnostics can point at it.
#[derive(Debug, Clone)]
pub struct Operand<'n> {
    pub node: &'n Node,
    pub value: Quantity,
}

impl<'n> Operand<'n> {
    pub fn new(node: &'n Node, value: Quantity) -> Self {
        Self { node, value }
    }
}

/// The operands of one operator application. `right` is `None` for unary
/// operators.
#[derive(Debug, Clone)]
pub struct Operands<'n> {
    pub left: Operand<'n>,
    pub right: Option<Operand<'n>>,
}

impl<'n> Operands<'n> {
    pub fn unary(operand: Operand<'n>) -> Self {
        Self {
            left: operand,
            right: None,
        }
    }

    pub fn binary(left: Operand<'n>, right: Operand<'n>) -> Self {
        Self {
            left,
            right: Some(right),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Operand<'n>> {
        std::iter::once(&self.left).chain(self.right.as_ref())
    }

    pub fn signature(&self, fixity: Fixity) -> Signature {
        let left = OperandType::from(self.left.value.value_type());
        match &self.right {
            Some(right) => Signature::Binary(left, OperandType::from(right.value.value_type())),
            None => Signature::Unary(left, fixity),
        }
    }
}

/// An operator implementation for one symbol and operand signature, put
/// together from a preflight check, a unit calculator and a numeric kernel.
pub struct Operator {
    symbol: CompactString,
    signature: Signature,
    return_type: ValueType,
    preflight: Box<dyn PreflightCheck>,
    units: Box<dyn UnitCalculator>,
    kernel: Box<dyn ValueCalculator>,
    simplify: bool,
}

impl std::fmt::Debug for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Operator")
            .field("symbol", &self.symbol)
            .field("signature", &self.signature)
            .field("return_type", &self.return_type)
            .field("simplify", &self.simplify)
            .finish_non_exhaustive()
    }
}

impl Operator {
    /// A binary operator with matching-unit semantics until configured
    /// otherwise.
    pub fn binary(
        symbol: &str,
        left: OperandType,
        right: OperandType,
        kernel: fn(f64, f64) -> f64,
    ) -> Self {
        Self {
            symbol: symbol.to_compact_string(),
            signature: Signature::Binary(left, right),
            return_type: ValueType::Number,
            preflight: Box::new(NoCheck),
            units: Box::new(Matching::default()),
            kernel: Box::new(BinaryKernel(kernel)),
            simplify: true,
        }
    }

    /// A prefix or postfix operator that keeps the unit of its operand until
    /// configured otherwise.
    pub fn unary(
        symbol: &str,
        operand: OperandType,
        fixity: Fixity,
        kernel: fn(f64) -> f64,
    ) -> Self {
        Self {
            symbol: symbol.to_compact_string(),
            signature: Signature::Unary(operand, fixity),
            return_type: ValueType::Number,
            preflight: Box::new(NoCheck),
            units: Box::new(SameUnit),
            kernel: Box::new(UnaryKernel(kernel)),
            simplify: true,
        }
    }

    pub fn with_preflight(mut self, preflight: impl PreflightCheck + 'static) -> Self {
        self.preflight = Box::new(preflight);
        self
    }

    pub fn with_units(mut self, units: impl UnitCalculator + 'static) -> Self {
        self.units = Box::new(units);
        self
    }

    pub fn with_kernel(mut self, kernel: impl ValueCalculator + 'static) -> Self {
        self.kernel = Box::new(kernel);
        self
    }

    pub fn returning(mut self, return_type: ValueType) -> Self {
        self.return_type = return_type;
        self
    }

    /// Keep the unit computed by the unit calculator as is, as needed for
    /// explicit conversions.
    pub fn without_simplify(mut self) -> Self {
        self.simplify = false;
        self
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn signature(&self) -> Signature {
        self.signature
    }

    pub fn return_type(&self) -> ValueType {
        self.return_type
    }

    /// Apply the operator. Returns `None` after recording a diagnostic if
    /// the operands are not acceptable.
    pub fn evaluate(&self, operands: &Operands<'_>, ctx: &mut EvalContext<'_>) -> Option<Quantity> {
        if !self.preflight.check(operands, ctx) {
            return None;
        }

        let calculation = self.units.calculate(operands, ctx)?;
        let (x, y) = calculation.inputs;
        let number = self.kernel.calculate(x, y) * calculation.scale;

        let quantity = if self.simplify {
            let simplified = ctx.simplify(&calculation.unit);
            Quantity::new(number * simplified.factor, simplified.unit)
        } else {
            Quantity::new(number, calculation.unit)
        };

        Some(quantity.with_value_type(self.return_type))
    }
}

#[derive(Clone, Error, Debug, PartialEq, Eq)]
pub enum OperatorTableError {
    #[error("An operator '{symbol}' for {signature} exists already")]
    Duplicate {
        symbol: String,
        signature: Signature,
    },
}

pub type Result<T> = std::result::Result<T, OperatorTableError>;

/// Operator implementations keyed by symbol and operand signature.
/// Resolution is an exact lookup, so the same key yields the same
/// implementation until the table is modified.
#[derive(Debug, Clone, Default)]
pub struct OperatorTable {
    operators: IndexMap<(CompactString, Signature), Rc<Operator>>,
}

impl OperatorTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, operator: Operator) -> Result<Rc<Operator>> {
        let key = (operator.symbol.clone(), operator.signature);
        if self.operators.contains_key(&key) {
            return Err(OperatorTableError::Duplicate {
                symbol: key.0.to_string(),
                signature: key.1,
            });
        }

        debug!("Registered operator '{}' for {}", key.0, key.1);
        let operator = Rc::new(operator);
        self.operators.insert(key, operator.clone());
        Ok(operator)
    }

    pub fn resolve(&self, symbol: &str, signature: Signature) -> Option<Rc<Operator>> {
        let operator = self
            .operators
            .get(&(symbol.to_compact_string(), signature))
            .cloned();
        trace!(
            "Resolving '{symbol}' for {signature}: {}",
            if operator.is_some() { "found" } else { "none" }
        );
        operator
    }

    pub fn resolve_binary(
        &self,
        symbol: &str,
        left: OperandType,
        right: OperandType,
    ) -> Option<Rc<Operator>> {
        self.resolve(symbol, Signature::Binary(left, right))
    }

    pub fn resolve_unary(
        &self,
        symbol: &str,
        operand: OperandType,
        fixity: Fixity,
    ) -> Option<Rc<Operator>> {
        self.resolve(symbol, Signature::Unary(operand, fixity))
    }

    /// All registered symbols, each listed once, in registration order.
    pub fn symbols(&self) -> Vec<&str> {
        let mut symbols: Vec<&str> = vec![];
        for (symbol, _) in self.operators.keys() {
            if !symbols.contains(&symbol.as_str()) {
                symbols.push(symbol);
            }
        }
        symbols
    }

    pub fn len(&self) -> usize {
        self.operators.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn add() -> Operator {
        Operator::binary("+", OperandType::Number, OperandType::Number, |x, y| x + y)
    }

    #[test]
    fn exact_resolution() {
        let mut table = OperatorTable::new();
        table.register(add()).unwrap();
        table
            .register(Operator::unary(
                "-",
                OperandType::Number,
                Fixity::Prefix,
                |x| -x,
            ))
            .unwrap();

        assert!(table
            .resolve_binary("+", OperandType::Number, OperandType::Number)
            .is_some());
        assert!(table
            .resolve_binary("+", OperandType::Number, OperandType::Percent)
            .is_none());
        assert!(table
            .resolve_unary("-", OperandType::Number, Fixity::Postfix)
            .is_none());
        assert_eq!(table.symbols(), vec!["+", "-"]);
    }

    #[test]
    fn resolution_is_deterministic() {
        let mut table = OperatorTable::new();
        let registered = table.register(add()).unwrap();
        let first = table
            .resolve_binary("+", OperandType::Number, OperandType::Number)
            .unwrap();
        let second = table
            .resolve_binary("+", OperandType::Number, OperandType::Number)
            .unwrap();
        assert!(Rc::ptr_eq(&first, &second));
        assert!(Rc::ptr_eq(&first, &registered));
    }

    #[test]
    fn duplicates_are_rejected() {
        let mut table = OperatorTable::new();
        table.register(add()).unwrap();
        assert_eq!(
            table.register(add()).unwrap_err(),
            OperatorTableError::Duplicate {
                symbol: "+".into(),
                signature: Signature::Binary(OperandType::Number, OperandType::Number),
            }
        );
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn signatures_display() {
        assert_eq!(
            Signature::Binary(OperandType::Number, OperandType::Percent).to_string(),
            "(number, percent)"
        );
        assert_eq!(
            Signature::Unary(OperandType::Number, Fixity::Postfix).to_string(),
            "postfix number"
        );
    }
}
