#![allow(dead_code)]

use std::f64::consts::PI;

use unitwise::{Node, OperatorToken, Quantity, Scope, UnitDeclaration};

/// A scope with lengths, times, masses and angles in a `Metric` scheme, and
/// feet in an `Imperial` one.
pub fn get_test_scope() -> Scope {
    let mut scope = Scope::new();

    let metric = |singular: &str, plural: &str| {
        UnitDeclaration::new()
            .with_long_names(singular, plural)
            .in_scheme("Metric")
    };

    let m = scope
        .add_primitive_unit("m", "Length", metric("meter", "meters"))
        .expect("m");
    let s = scope
        .add_primitive_unit("s", "Time", metric("second", "seconds"))
        .expect("s");
    let g = scope
        .add_primitive_unit("g", "Mass", metric("gram", "grams"))
        .expect("g");
    let rad = scope
        .add_primitive_unit("rad", "Angle", metric("radian", "radians"))
        .expect("rad");

    let derived = |scope: &mut Scope, name, factor, unit: &unitwise::Unit, declaration| {
        scope
            .add_derived_unit(name, &Quantity::new(factor, unit.clone()), declaration)
            .expect(name)
    };

    derived(&mut scope, "km", 1000.0, &m, metric("kilometer", "kilometers"));
    derived(&mut scope, "cm", 0.01, &m, metric("centimeter", "centimeters"));
    derived(&mut scope, "h", 3600.0, &s, metric("hour", "hours"));
    let kg = derived(&mut scope, "kg", 1000.0, &g, metric("kilogram", "kilograms"));
    derived(&mut scope, "deg", PI / 180.0, &rad, metric("degree", "degrees"));
    derived(
        &mut scope,
        "N",
        1.0,
        &(kg * m.clone() / s.clone().power(2)),
        metric("newton", "newtons"),
    );
    derived(
        &mut scope,
        "ft",
        0.3048,
        &m,
        UnitDeclaration::new()
            .with_long_names("foot", "feet")
            .in_scheme("Imperial"),
    );

    let length = scope.dimensions().get_dimension("Length").expect("Length");
    let time = scope.dimensions().get_dimension("Time").expect("Time");
    scope
        .add_derived_dimension("Velocity", length / time)
        .expect("Velocity");

    scope
}

/// Builds nodes in source order, separated by single spaces, and keeps
/// track of their offsets.
#[derive(Debug, Default)]
pub struct Source {
    text: String,
}

impl Source {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    fn push(&mut self, literal: &str) -> usize {
        if !self.text.is_empty() {
            self.text.push(' ');
        }
        self.push_tight(literal)
    }

    fn push_tight(&mut self, literal: &str) -> usize {
        let offset = self.text.len();
        self.text.push_str(literal);
        offset
    }

    pub fn number(&mut self, literal: &str) -> Node {
        let offset = self.push(literal);
        Node::number(literal, offset)
    }

    /// A number followed by the unit expression built by `unit`.
    pub fn quantity(&mut self, literal: &str, unit: impl FnOnce(&mut Source) -> Node) -> Node {
        let offset = self.push(literal);
        let unit = unit(self);
        Node::quantity(literal, offset, unit)
    }

    pub fn unit(&mut self, name: &str) -> Node {
        let offset = self.push(name);
        Node::unit(name, offset)
    }

    /// `name^exponent`, written without spaces.
    pub fn unit_power(&mut self, name: &str, exponent: &str) -> Node {
        let unit = self.unit(name);
        let caret = OperatorToken::new("^", self.push_tight("^"));
        let exponent_offset = self.push_tight(exponent);
        Node::unit_power(unit, caret, exponent, exponent_offset)
    }

    pub fn identifier(&mut self, name: &str) -> Node {
        let offset = self.push(name);
        Node::identifier(name, offset)
    }

    pub fn op(&mut self, literal: &str) -> OperatorToken {
        let offset = self.push(literal);
        OperatorToken::new(literal, offset)
    }

    pub fn open(&mut self) -> usize {
        self.push("(")
    }

    pub fn close(&mut self) -> usize {
        self.push(")")
    }
}
