use std::rc::Rc;

use compact_str::{CompactString, ToCompactString};
use indexmap::IndexMap;
use log::debug;
use thiserror::Error;

use crate::{
    builtins::default_operators,
    dimension::{Dimension, DimensionRegistry},
    operator::{Operator, OperatorTable, OperatorTableError},
    quantity::Quantity,
    registry::RegistryError,
    unit::{Unit, UnitIdentifier},
    unit_registry::{UnitRegistry, UnitRegistryError},
};

#[derive(Clone, Error, Debug, PartialEq, Eq)]
pub enum ScopeError {
    #[error("{0}")]
    Dimension(#[from] RegistryError),

    #[error("{0}")]
    Unit(#[from] UnitRegistryError),

    #[error("{0}")]
    Operator(#[from] OperatorTableError),

    #[error("'{0}' is not a base dimension, so it cannot have a primitive unit")]
    NotABaseDimension(String),

    #[error("Cannot redefine the constant '{0}'")]
    ReadOnlyVariable(String),
}

pub type Result<T> = std::result::Result<T, ScopeError>;

/// Display names and scheme membership of a unit being declared.
#[derive(Debug, Clone, Default)]
pub struct UnitDeclaration {
    long_names: Option<(CompactString, CompactString)>,
    schemes: Vec<CompactString>,
}

impl UnitDeclaration {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_long_names(mut self, singular: &str, plural: &str) -> Self {
        self.long_names = Some((singular.into(), plural.into()));
        self
    }

    pub fn in_scheme(mut self, scheme: &str) -> Self {
        self.schemes.push(scheme.into());
        self
    }

    fn apply(&self, unit_id: UnitIdentifier) -> UnitIdentifier {
        match &self.long_names {
            Some((singular, plural)) => unit_id.with_long_names(singular, plural),
            None => unit_id,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Binding {
    pub value: Quantity,
    pub constant: bool,
}

/// The names an expression is evaluated against: dimensions, units,
/// operators and variables, plus the result of the last statement.
#[derive(Debug, Clone)]
pub struct Scope {
    dimensions: DimensionRegistry,
    units: UnitRegistry,
    operators: OperatorTable,
    variables: IndexMap<CompactString, Binding>,
    last_result: Option<Quantity>,
}

impl Default for Scope {
    fn default() -> Self {
        Self::new()
    }
}

impl Scope {
    /// A scope with the default operators but no dimensions or units.
    pub fn new() -> Self {
        let mut scope = Self::empty();
        for operator in default_operators() {
            if let Err(e) = scope.operators.register(operator) {
                debug!("Skipped default operator: {e}");
            }
        }
        scope
    }

    /// A scope without any operators.
    pub fn empty() -> Self {
        Scope {
            dimensions: DimensionRegistry::default(),
            units: UnitRegistry::new(),
            operators: OperatorTable::new(),
            variables: IndexMap::new(),
            last_result: None,
        }
    }

    pub fn dimensions(&self) -> &DimensionRegistry {
        &self.dimensions
    }

    pub fn units(&self) -> &UnitRegistry {
        &self.units
    }

    pub fn operators(&self) -> &OperatorTable {
        &self.operators
    }

    pub fn add_base_dimension(&mut self, name: &str) -> Result<Dimension> {
        Ok(self.dimensions.add_base_dimension(name)?)
    }

    pub fn add_derived_dimension(&mut self, name: &str, dimension: Dimension) -> Result<Dimension> {
        Ok(self.dimensions.add_derived_dimension(name, dimension)?)
    }

    /// `unit m : Length`. The base dimension is created if it does not exist
    /// yet.
    pub fn add_primitive_unit(
        &mut self,
        name: &str,
        dimension: &str,
        declaration: UnitDeclaration,
    ) -> Result<Unit> {
        if !self.dimensions.contains(dimension) {
            self.dimensions.add_base_dimension(dimension)?;
        } else if !self.dimensions.is_base_dimension(dimension) {
            return Err(ScopeError::NotABaseDimension(dimension.to_owned()));
        }

        let unit_id = declaration.apply(UnitIdentifier::primitive(name, dimension));
        Ok(self.units.add_primitive_unit(unit_id, &declaration.schemes)?)
    }

    /// `unit km : 1000 m`.
    pub fn add_derived_unit(
        &mut self,
        name: &str,
        definition: &Quantity,
        declaration: UnitDeclaration,
    ) -> Result<Unit> {
        let unit_id = declaration.apply(UnitIdentifier::derived(
            name,
            definition.number(),
            definition.unit_or_scalar().clone(),
        ));
        Ok(self.units.add_derived_unit(unit_id, &declaration.schemes)?)
    }

    pub fn unit(&self, name: &str) -> std::result::Result<Unit, UnitRegistryError> {
        self.units.get_unit(name)
    }

    pub fn register_operator(&mut self, operator: Operator) -> Result<Rc<Operator>> {
        Ok(self.operators.register(operator)?)
    }

    /// Bind `name`, replacing an earlier binding unless that one is
    /// constant.
    pub fn define_variable(&mut self, name: &str, value: Quantity, constant: bool) -> Result<()> {
        if self.variables.get(name).is_some_and(|b| b.constant) {
            return Err(ScopeError::ReadOnlyVariable(name.to_owned()));
        }

        debug!(
            "Defined {} '{name}' = {value}",
            if constant { "constant" } else { "variable" }
        );
        self.variables
            .insert(name.to_compact_string(), Binding { value, constant });
        Ok(())
    }

    pub fn variable(&self, name: &str) -> Option<&Quantity> {
        self.variables.get(name).map(|binding| &binding.value)
    }

    pub fn variable_names(&self) -> impl Iterator<Item = &str> {
        self.variables.keys().map(|name| name.as_str())
    }

    pub fn last_result(&self) -> Option<&Quantity> {
        self.last_result.as_ref()
    }

    pub fn set_last_result(&mut self, value: Quantity) {
        self.last_result = Some(value);
    }

    pub fn get_dimensions(&self, scheme: &str) -> Vec<Dimension> {
        self.units.get_dimensions(scheme)
    }

    /// The unit of `scheme` measuring the named dimension whose conversion
    /// ratio to `source` is closest to one.
    pub fn find_closest_unit(
        &self,
        source: &Unit,
        scheme: &str,
        dimension: &str,
    ) -> Result<Option<Unit>> {
        let dimension = self.dimensions.get_dimension(dimension)?;
        Ok(self.units.find_closest_unit(source, scheme, &dimension))
    }

    /// Express `quantity` in the closest unit of `scheme`, if the scheme has
    /// a unit for its dimension.
    pub fn convert_to_scheme(&self, quantity: &Quantity, scheme: &str) -> Option<Quantity> {
        let unit = quantity.unit()?;
        let closest = self
            .units
            .find_closest_unit(unit, scheme, &quantity.dimension())?;
        quantity.convert_to(&closest).ok()
    }
}
