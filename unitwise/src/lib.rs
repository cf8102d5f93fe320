mod arithmetic;
pub mod ast;
mod builtins;
pub mod chain;
pub mod context;
pub mod diagnostic;
pub mod dimension;
pub mod evaluator;
mod math;
pub mod number;
pub mod operator;
pub mod policy;
pub mod preferences;
mod product;
pub mod quantity;
mod registry;
pub mod scope;
pub mod span;
mod suggestion;
pub mod unit;
pub mod unit_registry;

pub use arithmetic::{Exponent, Rational};
pub use ast::{Fixity, Node, NodeKind, OperatorToken};
pub use diagnostic::{Diagnostic, ErrorDiagnostic, ErrorKind};
pub use dimension::{Dimension, DimensionRegistry};
pub use evaluator::Evaluation;
pub use preferences::{Preferences, PreferencesError};
pub use quantity::{Quantity, ValueType};
pub use registry::RegistryError;
pub use scope::{Scope, ScopeError, UnitDeclaration};
pub use span::Span;
pub use unit::Unit;

/// A scope together with the preferences it is evaluated under. Statements
/// are evaluated one after another; definitions and the last result carry
/// over from one statement to the next.
#[derive(Debug, Clone, Default)]
pub struct Context {
    scope: Scope,
    preferences: Preferences,
}

impl Context {
    pub fn new(scope: Scope) -> Self {
        Context {
            scope,
            preferences: Preferences::default(),
        }
    }

    pub fn with_preferences(mut self, preferences: Preferences) -> Self {
        self.preferences = preferences;
        self
    }

    /// Read preferences from a TOML document, replacing the current ones.
    pub fn load_preferences(&mut self, toml: &str) -> Result<(), PreferencesError> {
        self.preferences = Preferences::from_toml_str(toml)?;
        Ok(())
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    pub fn scope_mut(&mut self) -> &mut Scope {
        &mut self.scope
    }

    pub fn preferences(&self) -> &Preferences {
        &self.preferences
    }

    pub fn evaluate(&mut self, statement: &Node) -> Evaluation {
        evaluator::evaluate_statement(&mut self.scope, &self.preferences, statement)
    }

    /// Format a result for display, honouring the display preferences.
    pub fn display(&self, quantity: &Quantity) -> String {
        match &self.preferences.preferred_unit_scheme {
            Some(scheme) => self
                .scope
                .convert_to_scheme(quantity, scheme)
                .unwrap_or_else(|| quantity.clone())
                .display(&self.preferences),
            None => quantity.display(&self.preferences),
        }
    }
}
