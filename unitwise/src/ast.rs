use std::{fmt::Display, rc::Rc};

use compact_str::{CompactString, ToCompactString};
use thiserror::Error;

use crate::span::Span;

#[derive(Clone, Error, Debug, PartialEq, Eq)]
pub enum AstError {
    #[error("{kind:?} node expects {expected} children, got {actual}")]
    ChildCount {
        kind: NodeKind,
        expected: usize,
        actual: usize,
    },

    #[error("'{0}' is not a unit operator")]
    UnknownUnitOperator(String),
}

pub type Result<T> = std::result::Result<T, AstError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Number,
    Identifier,
    Binary,
    Unary,
    Parenthesis,
    UnitLiteral,
    UnitPower,
    UnitMultOp,
    VariableDefinition,
    Statement,
    UnparsedText,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fixity {
    Prefix,
    Postfix,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitOperator {
    Mul,
    Div,
}

/// An operator as it was written, with its position in the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperatorToken {
    pub literal: CompactString,
    pub span: Span,
}

impl OperatorToken {
    pub fn new(literal: &str, offset: usize) -> Self {
        Self {
            literal: literal.to_compact_string(),
            span: Span::for_literal(offset, literal),
        }
    }

    /// Implicit multiplication by juxtaposition, as in `2 m` or `3 (4 + 5)`.
    pub fn juxtaposition(offset: usize) -> Self {
        Self::new(" ", offset)
    }
}

/// Canonical symbol for a binary operator spelling.
pub fn canonical_binary_symbol(literal: &str) -> CompactString {
    let symbol = match literal.trim() {
        "" | "*" | "×" | "·" | "at" | "of" => "*",
        "/" | "÷" | "per" | "every" => "/",
        "-" | "−" => "-",
        "&&" | "and" => "AND",
        "||" | "or" => "OR",
        "to" | "as" | "->" | "→" => "in",
        "≤" => "<=",
        "≥" => ">=",
        "≠" => "!=",
        "=" => "==",
        "**" => "^",
        other => other,
    };
    symbol.to_compact_string()
}

/// Canonical symbol for a prefix operator spelling.
pub fn canonical_prefix_symbol(literal: &str) -> CompactString {
    let symbol = match literal.trim() {
        "!" | "not" | "¬" => "NOT",
        "√" => "sqrt",
        "−" => "-",
        other => other,
    };
    symbol.to_compact_string()
}

pub fn canonical_postfix_symbol(literal: &str) -> CompactString {
    literal.trim().to_compact_string()
}

fn unit_operator(literal: &str) -> Result<UnitOperator> {
    match canonical_binary_symbol(literal).as_str() {
        "*" => Ok(UnitOperator::Mul),
        "/" => Ok(UnitOperator::Div),
        _ => Err(AstError::UnknownUnitOperator(literal.to_owned())),
    }
}

/// One parsed statement. Nodes are immutable and share their children
/// through `Rc`, so rebuilding a node with new children leaves the original
/// tree intact. Every node knows its source span, computed bottom-up when
/// it is constructed.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Number {
        literal: CompactString,
        literal_span: Span,
        unit: Option<Rc<Node>>,
        span: Span,
    },
    Identifier {
        name: CompactString,
        span: Span,
    },
    Binary {
        symbol: CompactString,
        token: OperatorToken,
        lhs: Rc<Node>,
        rhs: Rc<Node>,
        span: Span,
    },
    Unary {
        symbol: CompactString,
        fixity: Fixity,
        token: OperatorToken,
        operand: Rc<Node>,
        span: Span,
    },
    Parenthesis {
        inner: Rc<Node>,
        span: Span,
    },
    UnitLiteral {
        name: CompactString,
        span: Span,
    },
    UnitPower {
        unit: Rc<Node>,
        token: OperatorToken,
        exponent: CompactString,
        exponent_span: Span,
        span: Span,
    },
    UnitMultOp {
        op: UnitOperator,
        token: OperatorToken,
        lhs: Rc<Node>,
        rhs: Rc<Node>,
        span: Span,
    },
    VariableDefinition {
        name: CompactString,
        name_span: Span,
        constant: bool,
        value: Rc<Node>,
        span: Span,
    },
    Statement {
        inner: Rc<Node>,
        span: Span,
    },
    UnparsedText {
        text: CompactString,
        span: Span,
    },
}

impl Node {
    pub fn number(literal: &str, offset: usize) -> Node {
        let span = Span::for_literal(offset, literal);
        Node::Number {
            literal: literal.to_compact_string(),
            literal_span: span,
            unit: None,
            span,
        }
    }

    /// A number literal followed by a unit expression, like `3 m/s`.
    pub fn quantity(literal: &str, offset: usize, unit: impl Into<Rc<Node>>) -> Node {
        let unit = unit.into();
        let literal_span = Span::for_literal(offset, literal);
        Node::Number {
            literal: literal.to_compact_string(),
            literal_span,
            span: literal_span.extend(&unit.span()),
            unit: Some(unit),
        }
    }

    pub fn identifier(name: &str, offset: usize) -> Node {
        Node::Identifier {
            name: name.to_compact_string(),
            span: Span::for_literal(offset, name),
        }
    }

    pub fn binary(
        lhs: impl Into<Rc<Node>>,
        token: OperatorToken,
        rhs: impl Into<Rc<Node>>,
    ) -> Node {
        let (lhs, rhs) = (lhs.into(), rhs.into());
        Node::Binary {
            symbol: canonical_binary_symbol(&token.literal),
            span: lhs.span().extend(&token.span).extend(&rhs.span()),
            token,
            lhs,
            rhs,
        }
    }

    pub fn prefix(token: OperatorToken, operand: impl Into<Rc<Node>>) -> Node {
        let operand = operand.into();
        Node::Unary {
            symbol: canonical_prefix_symbol(&token.literal),
            fixity: Fixity::Prefix,
            span: token.span.extend(&operand.span()),
            token,
            operand,
        }
    }

    pub fn postfix(operand: impl Into<Rc<Node>>, token: OperatorToken) -> Node {
        let operand = operand.into();
        Node::Unary {
            symbol: canonical_postfix_symbol(&token.literal),
            fixity: Fixity::Postfix,
            span: operand.span().extend(&token.span),
            token,
            operand,
        }
    }

    /// `(inner)`, with the offsets of the opening and closing parenthesis.
    pub fn parenthesis(open: usize, inner: impl Into<Rc<Node>>, close: usize) -> Node {
        let inner = inner.into();
        Node::Parenthesis {
            span: Span::new(open, close + 1).extend(&inner.span()),
            inner,
        }
    }

    pub fn unit(name: &str, offset: usize) -> Node {
        Node::UnitLiteral {
            name: name.to_compact_string(),
            span: Span::for_literal(offset, name),
        }
    }

    pub fn unit_power(
        unit: impl Into<Rc<Node>>,
        token: OperatorToken,
        exponent: &str,
        exponent_offset: usize,
    ) -> Node {
        let unit = unit.into();
        let exponent_span = Span::for_literal(exponent_offset, exponent);
        Node::UnitPower {
            span: unit.span().extend(&exponent_span),
            unit,
            token,
            exponent: exponent.to_compact_string(),
            exponent_span,
        }
    }

    pub fn unit_mult(
        lhs: impl Into<Rc<Node>>,
        token: OperatorToken,
        rhs: impl Into<Rc<Node>>,
    ) -> Result<Node> {
        let (lhs, rhs) = (lhs.into(), rhs.into());
        Ok(Node::UnitMultOp {
            op: unit_operator(&token.literal)?,
            span: lhs.span().extend(&token.span).extend(&rhs.span()),
            token,
            lhs,
            rhs,
        })
    }

    /// `name = value`, or `const name = value` for a read-only binding.
    pub fn variable_definition(
        name: &str,
        name_offset: usize,
        constant: bool,
        value: impl Into<Rc<Node>>,
    ) -> Node {
        let value = value.into();
        let name_span = Span::for_literal(name_offset, name);
        Node::VariableDefinition {
            name: name.to_compact_string(),
            span: name_span.extend(&value.span()),
            name_span,
            constant,
            value,
        }
    }

    pub fn statement(inner: impl Into<Rc<Node>>) -> Node {
        let inner = inner.into();
        Node::Statement {
            span: inner.span(),
            inner,
        }
    }

    pub fn unparsed(text: &str, offset: usize) -> Node {
        Node::UnparsedText {
            text: text.to_compact_string(),
            span: Span::for_literal(offset, text),
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Number { .. } => NodeKind::Number,
            Node::Identifier { .. } => NodeKind::Identifier,
            Node::Binary { .. } => NodeKind::Binary,
            Node::Unary { .. } => NodeKind::Unary,
            Node::Parenthesis { .. } => NodeKind::Parenthesis,
            Node::UnitLiteral { .. } => NodeKind::UnitLiteral,
            Node::UnitPower { .. } => NodeKind::UnitPower,
            Node::UnitMultOp { .. } => NodeKind::UnitMultOp,
            Node::VariableDefinition { .. } => NodeKind::VariableDefinition,
            Node::Statement { .. } => NodeKind::Statement,
            Node::UnparsedText { .. } => NodeKind::UnparsedText,
        }
    }

    /// The source text this node stands for: the literal of leaves, the
    /// operator as written for operators, the bound name for definitions.
    pub fn literal(&self) -> &str {
        match self {
            Node::Number { literal, .. } => literal,
            Node::Identifier { name, .. } | Node::UnitLiteral { name, .. } => name,
            Node::Binary { token, .. }
            | Node::Unary { token, .. }
            | Node::UnitPower { token, .. }
            | Node::UnitMultOp { token, .. } => &token.literal,
            Node::VariableDefinition { name, .. } => name,
            Node::Parenthesis { .. } => "()",
            Node::Statement { inner, .. } => inner.literal(),
            Node::UnparsedText { text, .. } => text,
        }
    }

    /// Grammar-significant children, in source order.
    pub fn children(&self) -> Vec<Rc<Node>> {
        match self {
            Node::Number { unit, .. } => unit.iter().cloned().collect(),
            Node::Identifier { .. } | Node::UnitLiteral { .. } | Node::UnparsedText { .. } => {
                vec![]
            }
            Node::Binary { lhs, rhs, .. } | Node::UnitMultOp { lhs, rhs, .. } => {
                vec![lhs.clone(), rhs.clone()]
            }
            Node::Unary { operand, .. } => vec![operand.clone()],
            Node::Parenthesis { inner, .. } | Node::Statement { inner, .. } => {
                vec![inner.clone()]
            }
            Node::UnitPower { unit, .. } => vec![unit.clone()],
            Node::VariableDefinition { value, .. } => vec![value.clone()],
        }
    }

    pub fn span(&self) -> Span {
        match self {
            Node::Number { span, .. }
            | Node::Identifier { span, .. }
            | Node::Binary { span, .. }
            | Node::Unary { span, .. }
            | Node::Parenthesis { span, .. }
            | Node::UnitLiteral { span, .. }
            | Node::UnitPower { span, .. }
            | Node::UnitMultOp { span, .. }
            | Node::VariableDefinition { span, .. }
            | Node::Statement { span, .. }
            | Node::UnparsedText { span, .. } => *span,
        }
    }

    pub fn offset_first(&self) -> usize {
        self.span().offset_first()
    }

    pub fn offset_last(&self) -> usize {
        self.span().offset_last()
    }

    /// A copy of this node with its children replaced. The number of
    /// children has to match [`Node::children`]. The original is unchanged.
    pub fn with_children(&self, children: Vec<Rc<Node>>) -> Result<Node> {
        let expected = self.children().len();
        if children.len() != expected {
            return Err(AstError::ChildCount {
                kind: self.kind(),
                expected,
                actual: children.len(),
            });
        }
        let mut children = children.into_iter();
        let mut next = || {
            children.next().ok_or(AstError::ChildCount {
                kind: self.kind(),
                expected,
                actual: 0,
            })
        };

        Ok(match self {
            Node::Number {
                literal,
                literal_span,
                unit,
                ..
            } => match unit {
                Some(_) => {
                    let unit = next()?;
                    Node::Number {
                        literal: literal.clone(),
                        literal_span: *literal_span,
                        span: literal_span.extend(&unit.span()),
                        unit: Some(unit),
                    }
                }
                None => self.clone(),
            },
            Node::Identifier { .. } | Node::UnitLiteral { .. } | Node::UnparsedText { .. } => {
                self.clone()
            }
            Node::Binary { token, .. } => {
                let (lhs, rhs) = (next()?, next()?);
                Node::binary(lhs, token.clone(), rhs)
            }
            Node::Unary {
                symbol,
                fixity,
                token,
                ..
            } => {
                let operand = next()?;
                Node::Unary {
                    symbol: symbol.clone(),
                    fixity: *fixity,
                    token: token.clone(),
                    span: token.span.extend(&operand.span()),
                    operand,
                }
            }
            Node::Parenthesis { span, .. } => {
                let inner = next()?;
                Node::Parenthesis {
                    span: span.extend(&inner.span()),
                    inner,
                }
            }
            Node::UnitPower {
                token,
                exponent,
                exponent_span,
                ..
            } => {
                let unit = next()?;
                Node::UnitPower {
                    span: unit.span().extend(exponent_span),
                    unit,
                    token: token.clone(),
                    exponent: exponent.clone(),
                    exponent_span: *exponent_span,
                }
            }
            Node::UnitMultOp { op, token, .. } => {
                let (lhs, rhs) = (next()?, next()?);
                Node::UnitMultOp {
                    op: *op,
                    token: token.clone(),
                    span: lhs.span().extend(&token.span).extend(&rhs.span()),
                    lhs,
                    rhs,
                }
            }
            Node::VariableDefinition {
                name,
                name_span,
                constant,
                ..
            } => {
                let value = next()?;
                Node::VariableDefinition {
                    name: name.clone(),
                    name_span: *name_span,
                    constant: *constant,
                    span: name_span.extend(&value.span()),
                    value,
                }
            }
            Node::Statement { .. } => Node::statement(next()?),
        })
    }
}

/// Fully parenthesized rendering of the tree structure, using canonical
/// operator symbols.
impl Display for Node {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Node::Number { literal, unit, .. } => match unit {
                Some(unit) => write!(f, "{literal} {unit}"),
                None => write!(f, "{literal}"),
            },
            Node::Identifier { name, .. } | Node::UnitLiteral { name, .. } => write!(f, "{name}"),
            Node::Binary {
                symbol, lhs, rhs, ..
            } => write!(f, "({lhs} {symbol} {rhs})"),
            Node::Unary {
                symbol,
                fixity: Fixity::Prefix,
                operand,
                ..
            } => write!(f, "({symbol} {operand})"),
            Node::Unary {
                symbol,
                fixity: Fixity::Postfix,
                operand,
                ..
            } => write!(f, "({operand}{symbol})"),
            Node::Parenthesis { inner, .. } => write!(f, "{inner}"),
            Node::UnitPower { unit, exponent, .. } => write!(f, "{unit}^{exponent}"),
            Node::UnitMultOp { op, lhs, rhs, .. } => match op {
                UnitOperator::Mul => write!(f, "{lhs}·{rhs}"),
                UnitOperator::Div => write!(f, "{lhs}/{rhs}"),
            },
            Node::VariableDefinition {
                name,
                constant,
                value,
                ..
            } => {
                if *constant {
                    write!(f, "const {name} = {value}")
                } else {
                    write!(f, "{name} = {value}")
                }
            }
            Node::Statement { inner, .. } => write!(f, "{inner}"),
            Node::UnparsedText { text, .. } => write!(f, "{text}"),
        }
    }
}
