use compact_str::{CompactString, ToCompactString};
use log::debug;

use crate::registry::{BaseRepresentation, Registry, Result};

/// A physical dimension: base dimension names with nonzero integer exponents.
pub type Dimension = BaseRepresentation;

impl Dimension {
    pub fn dimensionless() -> Self {
        Self::unity()
    }

    pub fn is_dimensionless(&self) -> bool {
        self.is_empty()
    }

    /// A base dimension raised to the first power, like `Length`.
    pub fn is_base(&self) -> bool {
        self.len() == 1 && self.iter().all(|factor| factor.1 == 1)
    }
}

/// Base dimensions (`Length`) and named derived dimensions
/// (`Velocity = Length / Time`) known to a scope.
#[derive(Debug, Default, Clone)]
pub struct DimensionRegistry {
    registry: Registry<()>,
}

impl DimensionRegistry {
    pub fn add_base_dimension(&mut self, name: &str) -> Result<Dimension> {
        self.registry.add_base_entry(name, ())?;
        debug!("Added base dimension '{name}'");
        Ok(Dimension::base(name))
    }

    pub fn add_derived_dimension(
        &mut self,
        name: &str,
        dimension: Dimension,
    ) -> Result<Dimension> {
        self.registry.add_derived_entry(name, dimension.clone(), ())?;
        debug!("Added derived dimension '{name}' = {dimension}");
        Ok(dimension)
    }

    pub fn get_dimension(&self, name: &str) -> Result<Dimension> {
        self.registry
            .get_base_representation_for_name(name)
            .map(|(dimension, _)| dimension)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.registry.contains(name)
    }

    pub fn is_base_dimension(&self, name: &str) -> bool {
        self.registry.is_base_entry(name)
    }

    /// All names under which this dimension is known: the base dimension
    /// itself (if it is one) followed by derived dimensions in registration
    /// order.
    pub fn names_for(&self, dimension: &Dimension) -> Vec<CompactString> {
        let mut names = vec![];

        if dimension.is_base() {
            if let Some(factor) = dimension.iter().next() {
                if self.registry.is_base_entry(&factor.0) {
                    names.push(factor.0.clone());
                }
            }
        }

        names.extend(self.registry.get_derived_entry_names_for(dimension));
        names
    }

    /// Preferred display name: the first registered name, or the formatted
    /// product of base dimensions.
    pub fn name_for(&self, dimension: &Dimension) -> CompactString {
        self.names_for(dimension)
            .into_iter()
            .next()
            .unwrap_or_else(|| dimension.to_compact_string())
    }
}
