//! Rebuilding binary trees from the flat operator runs produced by the
//! grammar: `head (op operand)*` for operators of equal precedence, and
//! runs of unary operators around a single operand.

use std::rc::Rc;

use crate::ast::{Node, OperatorToken, Result};

pub type Tail = Vec<(OperatorToken, Rc<Node>)>;

/// Left-associative run, for `+ - * /`: `a - b - c` is `(a - b) - c`.
pub fn fold_left(head: impl Into<Rc<Node>>, tail: Tail) -> Rc<Node> {
    tail.into_iter().fold(head.into(), |lhs, (token, rhs)| {
        Rc::new(Node::binary(lhs, token, rhs))
    })
}

/// Right-associative run, for `^`: `a ^ b ^ c` is `a ^ (b ^ c)`.
pub fn fold_right(head: impl Into<Rc<Node>>, tail: Tail) -> Rc<Node> {
    let head = head.into();
    let mut pairs = tail.into_iter().rev();

    let Some((last_token, last_operand)) = pairs.next() else {
        return head;
    };

    let (token, rhs) = pairs.fold(
        (last_token, last_operand),
        |(token, rhs), (prev_token, lhs)| (prev_token, Rc::new(Node::binary(lhs, token, rhs))),
    );

    Rc::new(Node::binary(head, token, rhs))
}

/// Prefix operators arrive in source order, outermost first. The one
/// closest to the operand is applied first: `- √ x` is `-(√x)`.
pub fn fold_prefix(operators: Vec<OperatorToken>, operand: impl Into<Rc<Node>>) -> Rc<Node> {
    operators
        .into_iter()
        .rev()
        .fold(operand.into(), |operand, token| {
            Rc::new(Node::prefix(token, operand))
        })
}

/// Postfix operators in source order already start with the one closest to
/// the operand: `3!%` is `(3!)%`.
pub fn fold_postfix(operand: impl Into<Rc<Node>>, operators: Vec<OperatorToken>) -> Rc<Node> {
    operators
        .into_iter()
        .fold(operand.into(), |operand, token| {
            Rc::new(Node::postfix(operand, token))
        })
}

/// Left-associative run of unit multiplications and divisions:
/// `kg m / s / s` is `((kg·m)/s)/s`.
pub fn fold_units(head: impl Into<Rc<Node>>, tail: Tail) -> Result<Rc<Node>> {
    tail.into_iter()
        .try_fold(head.into(), |lhs, (token, rhs)| {
            Ok(Rc::new(Node::unit_mult(lhs, token, rhs)?))
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(literal: &str, offset: usize) -> Rc<Node> {
        Rc::new(Node::number(literal, offset))
    }

    fn op(literal: &str, offset: usize) -> OperatorToken {
        OperatorToken::new(literal, offset)
    }

    #[test]
    fn left_fold() {
        // 10 - 3 - 2
        let tree = fold_left(
            num("10", 0),
            vec![(op("-", 3), num("3", 5)), (op("-", 7), num("2", 9))],
        );
        assert_eq!(tree.to_string(), "((10 - 3) - 2)");
        assert_eq!(tree.offset_first(), 0);
        assert_eq!(tree.offset_last(), 9);
    }

    #[test]
    fn right_fold() {
        // 2^3^4
        let tree = fold_right(
            num("2", 0),
            vec![(op("^", 1), num("3", 2)), (op("^", 3), num("4", 4))],
        );
        assert_eq!(tree.to_string(), "(2 ^ (3 ^ 4))");

        // 2^3^4^5
        let tree = fold_right(
            num("2", 0),
            vec![
                (op("^", 1), num("3", 2)),
                (op("^", 3), num("4", 4)),
                (op("**", 5), num("5", 7)),
            ],
        );
        assert_eq!(tree.to_string(), "(2 ^ (3 ^ (4 ^ 5)))");
    }

    #[test]
    fn single_operand() {
        let head = num("7", 0);
        assert!(Rc::ptr_eq(&fold_left(head.clone(), vec![]), &head));
        assert!(Rc::ptr_eq(&fold_right(head.clone(), vec![]), &head));
    }

    #[test]
    fn prefix_chain() {
        // - not 5
        let tree = fold_prefix(vec![op("-", 0), op("not", 2)], num("5", 6));
        assert_eq!(tree.to_string(), "(- (NOT 5))");
        assert_eq!(tree.offset_first(), 0);
    }

    #[test]
    fn postfix_chain() {
        // 3!%
        let tree = fold_postfix(num("3", 0), vec![op("!", 1), op("%", 2)]);
        assert_eq!(tree.to_string(), "((3!)%)");
        assert_eq!(tree.offset_last(), 2);
    }

    #[test]
    fn unit_chain() {
        // kg m / s / s
        let unit = |name: &str, offset| Rc::new(Node::unit(name, offset));
        let tree = fold_units(
            unit("kg", 0),
            vec![
                (OperatorToken::juxtaposition(2), unit("m", 3)),
                (op("/", 5), unit("s", 7)),
                (op("/", 9), unit("s", 11)),
            ],
        )
        .unwrap();
        assert_eq!(tree.to_string(), "kg·m/s/s");
        assert!(fold_units(unit("m", 0), vec![(op("^", 1), unit("s", 2))]).is_err());
    }
}
