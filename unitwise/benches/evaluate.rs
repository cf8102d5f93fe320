use std::rc::Rc;

use criterion::{criterion_group, criterion_main, Criterion};
use unitwise::{
    chain::fold_left, evaluator::evaluate_statement, Node, OperatorToken, Preferences,
    Quantity, Scope, UnitDeclaration,
};

fn scope() -> Scope {
    let mut scope = Scope::new();
    let metric = || UnitDeclaration::new().in_scheme("Metric");
    let m = scope
        .add_primitive_unit("m", "Length", metric())
        .expect("m");
    scope
        .add_derived_unit("km", &Quantity::new(1000.0, m.clone()), metric())
        .expect("km");
    scope
        .add_derived_unit("cm", &Quantity::new(0.01, m), metric())
        .expect("cm");
    scope
}

fn quantity(i: usize, offset: &mut usize) -> Node {
    let units = ["km", "m", "cm"];
    let literal = (i + 1).to_string();
    let unit = units[i % units.len()];
    let node = Node::quantity(
        &literal,
        *offset,
        Node::unit(unit, *offset + literal.len() + 1),
    );
    *offset += literal.len() + unit.len() + 2;
    node
}

/// `1 km + 2 m + 3 cm + ...` with `terms` summands.
fn sum_of_lengths(terms: usize) -> Node {
    let mut offset = 0;
    let head = quantity(0, &mut offset);
    let mut tail = vec![];
    for i in 1..terms {
        let plus = OperatorToken::new("+", offset);
        offset += 2;
        tail.push((plus, Rc::new(quantity(i, &mut offset))));
    }
    Node::statement(fold_left(head, tail))
}

fn evaluate_sum(c: &mut Criterion) {
    let statement = sum_of_lengths(100);
    let preferences = Preferences::default();
    let scope = scope();
    c.bench_function("Evaluate a sum of 100 lengths", |b| {
        b.iter_with_setup(
            || scope.clone(),
            |mut scope| evaluate_statement(&mut scope, &preferences, &statement),
        )
    });
}

fn find_closest_unit(c: &mut Criterion) {
    let scope = scope();
    let cm = scope.unit("cm").expect("cm");
    c.bench_function("Find closest unit", |b| {
        b.iter(|| scope.find_closest_unit(&cm, "Metric", "Length"))
    });
}

criterion_group!(benches, evaluate_sum, find_closest_unit);
criterion_main!(benches);
