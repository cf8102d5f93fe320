use log::trace;

use crate::{
    ast::Node,
    diagnostic::{Diagnostic, ErrorKind},
    dimension::Dimension,
    preferences::Preferences,
    scope::Scope,
    unit::Unit,
    unit_registry::Simplified,
};

/// Everything an evaluation needs besides the tree itself: the scope to
/// resolve names and operators in, the user's preferences, and the sink for
/// diagnostics.
///
/// Diagnostics are collected in the order they are reported. Reporting never
/// stops the evaluation; the node in question just stays unevaluated.
pub struct EvalContext<'a> {
    pub scope: &'a mut Scope,
    pub preferences: &'a Preferences,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> EvalContext<'a> {
    pub fn new(scope: &'a mut Scope, preferences: &'a Preferences) -> Self {
        Self {
            scope,
            preferences,
            diagnostics: vec![],
        }
    }

    pub fn report(&mut self, kind: ErrorKind, node: &Node) {
        trace!("{} at {:?}: {kind}", kind.code(), node.span());
        self.diagnostics.push(Diagnostic::new(kind, node.span()));
    }

    /// Report against `primary`, pointing at `secondary` as the other node
    /// involved.
    pub fn report_pair(&mut self, kind: ErrorKind, primary: &Node, secondary: &Node) {
        trace!("{} at {:?}: {kind}", kind.code(), primary.span());
        self.diagnostics
            .push(Diagnostic::new(kind, primary.span()).with_secondary(secondary.span()));
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    /// The configured angle unit, if it is set and known in the scope.
    pub fn preferred_angle_unit(&self) -> Option<Unit> {
        let name = self.preferences.preferred_angle_unit.as_ref()?;
        self.scope.unit(name).ok()
    }

    /// The dimension angles are measured in: that of the preferred angle
    /// unit, or else a dimension called `Angle`.
    pub fn angle_dimension(&self) -> Option<Dimension> {
        match self.preferred_angle_unit() {
            Some(unit) => Some(unit.dimension()),
            None => self.scope.dimensions().get_dimension("Angle").ok(),
        }
    }

    pub fn simplify(&self, unit: &Unit) -> Simplified {
        self.scope.units().simplify(unit)
    }
}
