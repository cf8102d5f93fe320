//! Post-order evaluation of a statement tree.
//!
//! Errors never abort the walk. They are recorded as diagnostics against the
//! node that caused them, and the node evaluates to `None`. Parents of an
//! unevaluated node are unevaluated as well, without a diagnostic of their
//! own.

use crate::{
    ast::{Fixity, Node, UnitOperator},
    context::EvalContext,
    diagnostic::{Diagnostic, ErrorKind},
    number::Number,
    operator::{Operand, Operands},
    preferences::Preferences,
    quantity::Quantity,
    registry::RegistryError,
    scope::{Scope, ScopeError},
    span::Span,
    suggestion::did_you_mean,
    unit_registry::UnitRegistryError,
};

/// Names that refer to the result of the previous statement unless they are
/// bound to something else.
const LAST_RESULT: [&str; 2] = ["ans", "_"];

/// The outcome of evaluating one statement.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub value: Option<Quantity>,
    pub span: Span,
    pub diagnostics: Vec<Diagnostic>,
}

impl Evaluation {
    pub fn is_success(&self) -> bool {
        self.value.is_some() && self.diagnostics.is_empty()
    }
}

pub fn evaluate_statement(scope: &mut Scope, preferences: &Preferences, node: &Node) -> Evaluation {
    let mut ctx = EvalContext::new(scope, preferences);
    let value = evaluate(node, &mut ctx);
    Evaluation {
        value,
        span: node.span(),
        diagnostics: ctx.into_diagnostics(),
    }
}

pub fn evaluate(node: &Node, ctx: &mut EvalContext<'_>) -> Option<Quantity> {
    match node {
        Node::Number { literal, unit, .. } => {
            let number = match Number::parse_literal(literal) {
                Ok(number) => number.to_f64(),
                Err(e) => {
                    ctx.report(ErrorKind::InvalidNumber(e), node);
                    return None;
                }
            };
            match unit {
                None => Some(Quantity::from_scalar(number)),
                Some(unit) => {
                    let unit = evaluate(unit, ctx)?;
                    Some(Quantity::new(
                        number * unit.number(),
                        unit.unit_or_scalar().clone(),
                    ))
                }
            }
        }
        Node::Identifier { name, .. } => resolve_identifier(name, node, ctx),
        Node::Binary {
            symbol, lhs, rhs, ..
        } => {
            let left = evaluate(lhs, ctx);
            let right = evaluate(rhs, ctx);
            let operands = Operands::binary(Operand::new(lhs, left?), Operand::new(rhs, right?));
            apply(symbol, Fixity::Prefix, &operands, node, ctx)
        }
        Node::Unary {
            symbol,
            fixity,
            operand,
            ..
        } => {
            let value = evaluate(operand, ctx)?;
            let operands = Operands::unary(Operand::new(operand, value));
            apply(symbol, *fixity, &operands, node, ctx)
        }
        Node::Parenthesis { inner, .. } => evaluate(inner, ctx),
        Node::UnitLiteral { name, .. } => match ctx.scope.unit(name) {
            Ok(unit) => Some(Quantity::from_unit(unit)),
            Err(e) => {
                let suggestion = match e {
                    UnitRegistryError::RegistryError(RegistryError::UnknownEntry(_, suggestion)) => {
                        suggestion
                    }
                    _ => None,
                };
                ctx.report(
                    ErrorKind::UnknownUnit {
                        name: name.to_string(),
                        suggestion,
                    },
                    node,
                );
                None
            }
        },
        Node::UnitPower { unit, exponent, .. } => {
            let base = evaluate(unit, ctx)?;
            let exponent = match Number::parse_literal(exponent) {
                Ok(exponent) => exponent.to_f64(),
                Err(e) => {
                    ctx.report(ErrorKind::InvalidNumber(e), node);
                    return None;
                }
            };
            match base.unit_or_scalar().clone().powf(exponent) {
                Ok(powered) => Some(Quantity::new(base.number().powf(exponent), powered)),
                Err(e) => {
                    ctx.report(ErrorKind::UnitError(e), node);
                    None
                }
            }
        }
        Node::UnitMultOp { op, lhs, rhs, .. } => {
            let left = evaluate(lhs, ctx);
            let right = evaluate(rhs, ctx);
            let (left, right) = (left?, right?);
            let (lu, ru) = (left.unit_or_scalar().clone(), right.unit_or_scalar().clone());
            let combined = match op {
                UnitOperator::Mul => lu
                    .checked_by(ru)
                    .map(|unit| Quantity::new(left.number() * right.number(), unit)),
                UnitOperator::Div => lu
                    .checked_per(ru)
                    .map(|unit| Quantity::new(left.number() / right.number(), unit)),
            };
            match combined {
                Ok(quantity) => Some(quantity),
                Err(e) => {
                    ctx.report(ErrorKind::UnitError(e), node);
                    None
                }
            }
        }
        Node::VariableDefinition {
            name,
            constant,
            value,
            ..
        } => {
            let value = evaluate(value, ctx)?;
            match ctx.scope.define_variable(name, value.clone(), *constant) {
                Ok(()) => Some(value),
                Err(ScopeError::ReadOnlyVariable(name)) => {
                    ctx.report(ErrorKind::ReadOnlyVariable(name), node);
                    None
                }
                Err(_) => None,
            }
        }
        Node::Statement { inner, .. } => {
            let value = evaluate(inner, ctx)?;
            ctx.scope.set_last_result(value.clone());
            Some(value)
        }
        Node::UnparsedText { .. } => None,
    }
}

fn resolve_identifier(name: &str, node: &Node, ctx: &mut EvalContext<'_>) -> Option<Quantity> {
    if let Some(value) = ctx.scope.variable(name) {
        return Some(value.clone());
    }
    if LAST_RESULT.contains(&name) {
        if let Some(value) = ctx.scope.last_result() {
            return Some(value.clone());
        }
    }
    if let Ok(unit) = ctx.scope.unit(name) {
        return Some(Quantity::from_unit(unit));
    }

    let suggestion = did_you_mean(
        ctx.scope
            .variable_names()
            .map(str::to_owned)
            .chain(LAST_RESULT.iter().map(|s| s.to_string()))
            .chain(ctx.scope.units().iter_units().map(|(n, _)| n.to_string())),
        name,
    );
    ctx.report(
        ErrorKind::UnknownVariable {
            name: name.to_owned(),
            suggestion,
        },
        node,
    );
    None
}

/// Resolve the operator for the runtime types of the operands and apply
/// it. Binary operands ignore `fixity`.
fn apply(
    symbol: &str,
    fixity: Fixity,
    operands: &Operands<'_>,
    node: &Node,
    ctx: &mut EvalContext<'_>,
) -> Option<Quantity> {
    let signature = operands.signature(fixity);
    let Some(operator) = ctx.scope.operators().resolve(symbol, signature) else {
        ctx.report(
            ErrorKind::UnknownOperator {
                symbol: symbol.to_owned(),
                signature,
            },
            node,
        );
        return None;
    };
    operator.evaluate(operands, ctx)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::{
        ast::OperatorToken,
        chain::{fold_left, fold_postfix, fold_prefix},
        scope::UnitDeclaration,
    };

    fn scope() -> Scope {
        let mut scope = Scope::new();
        let meter = scope
            .add_primitive_unit("m", "Length", UnitDeclaration::new())
            .unwrap();
        scope
            .add_derived_unit("km", &Quantity::new(1000.0, meter), UnitDeclaration::new())
            .unwrap();
        scope
            .add_primitive_unit("s", "Time", UnitDeclaration::new())
            .unwrap();
        scope
    }

    fn run(scope: &mut Scope, node: Node) -> Evaluation {
        evaluate_statement(scope, &Preferences::default(), &Node::statement(node))
    }

    fn quantity(literal: &str, offset: usize, unit: &str, unit_offset: usize) -> Node {
        Node::quantity(literal, offset, Node::unit(unit, unit_offset))
    }

    #[test]
    fn adds_quantities_of_the_same_dimension() {
        // 1 km + 500 m
        let node = Node::binary(
            quantity("1", 0, "km", 2),
            OperatorToken::new("+", 5),
            quantity("500", 7, "m", 11),
        );
        let result = run(&mut scope(), node);
        assert!(result.is_success());
        let value = result.value.unwrap();
        assert_relative_eq!(value.number(), 1.5);
        assert_eq!(value.unit_or_scalar().to_string(), "km");
    }

    #[test]
    fn unevaluated_children_add_no_diagnostics() {
        // (1 + foo) * 2
        let inner = Node::binary(
            Node::number("1", 1),
            OperatorToken::new("+", 3),
            Node::identifier("foo", 5),
        );
        let node = Node::binary(
            Node::parenthesis(0, inner, 8),
            OperatorToken::new("*", 10),
            Node::number("2", 12),
        );
        let result = run(&mut scope(), node);
        assert!(result.value.is_none());
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].code(), "UNKNOWN_VARIABLE");
        assert_eq!(result.diagnostics[0].primary, Span::new(5, 8));
    }

    #[test]
    fn unknown_units_come_with_suggestions() {
        let result = run(&mut scope(), quantity("3", 0, "kmm", 2));
        assert_eq!(
            result.diagnostics[0].kind,
            ErrorKind::UnknownUnit {
                name: "kmm".into(),
                suggestion: Some("km".into())
            }
        );
    }

    #[test]
    fn unknown_operators() {
        // 5 % %: the outer '%' has no overload for percentages
        let node = fold_postfix(
            Node::number("5", 0),
            vec![OperatorToken::new("%", 1), OperatorToken::new("%", 2)],
        );
        let result = run(&mut scope(), (*node).clone());
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].code(), "UNKNOWN_OPERATOR");
    }

    #[test]
    fn percentages() {
        // 200 + 10%
        let node = Node::binary(
            Node::number("200", 0),
            OperatorToken::new("+", 4),
            Node::postfix(Node::number("10", 6), OperatorToken::new("%", 8)),
        );
        assert_relative_eq!(run(&mut scope(), node).value.unwrap().number(), 220.0);
    }

    #[test]
    fn variables_and_last_result() {
        let mut scope = scope();
        run(
            &mut scope,
            Node::variable_definition("x", 0, true, Node::number("4", 4)),
        );
        // x * ans
        let node = fold_left(
            Node::identifier("x", 0),
            vec![(
                OperatorToken::new("*", 2),
                std::rc::Rc::new(Node::identifier("ans", 4)),
            )],
        );
        let result = run(&mut scope, (*node).clone());
        assert_relative_eq!(result.value.unwrap().number(), 16.0);

        let result = run(
            &mut scope,
            Node::variable_definition("x", 0, false, Node::number("5", 4)),
        );
        assert_eq!(result.diagnostics[0].code(), "READ_ONLY_VARIABLE");
    }

    #[test]
    fn invalid_numbers_and_unparsed_text() {
        let result = run(&mut scope(), Node::number("1.2.3", 0));
        assert_eq!(result.diagnostics[0].code(), "INVALID_NUMBER");

        let result = run(&mut scope(), Node::unparsed("what is this", 0));
        assert!(result.value.is_none());
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn prefix_operators() {
        // - - 5 m
        let node = fold_prefix(
            vec![OperatorToken::new("-", 0), OperatorToken::new("-", 2)],
            quantity("5", 4, "m", 6),
        );
        let value = run(&mut scope(), (*node).clone()).value.unwrap();
        assert_eq!(value, Quantity::new(5.0, scope().unit("m").unwrap()));
    }
}
