use std::{cell::RefCell, collections::HashMap};

use compact_str::{CompactString, ToCompactString};
use log::debug;
use thiserror::Error;

use crate::{
    arithmetic::Exponent,
    dimension::Dimension,
    registry::{BaseRepresentation, BaseRepresentationFactor, Registry, RegistryError},
    unit::{ConversionFactor, Unit, UnitFactor, UnitIdentifier, UnitKind},
};

#[derive(Clone, Error, Debug, PartialEq, Eq)]
pub enum UnitRegistryError {
    #[error("{0}")]
    RegistryError(#[from] RegistryError),

    #[error("Dimension '{dimension}' already has the primitive unit '{existing}'")]
    DuplicatePrimitiveUnit {
        dimension: String,
        existing: String,
    },

    #[error("Unit '{0}' is not a primitive unit")]
    NotPrimitive(String),
}

pub type Result<T> = std::result::Result<T, UnitRegistryError>;

#[derive(Debug, Clone)]
pub struct UnitMetadata {
    pub unit: Unit,
    pub schemes: Vec<CompactString>,
}

/// The result of [`UnitRegistry::simplify`]: a unit and the scalar that has
/// to be folded into the number when switching to it.
#[derive(Debug, Clone, PartialEq)]
pub struct Simplified {
    pub unit: Unit,
    pub factor: ConversionFactor,
}

type DimensionKey = Vec<(CompactString, Exponent)>;

fn dimension_key(dimension: &Dimension) -> DimensionKey {
    let mut key: DimensionKey = dimension.iter().map(|f| (f.0.clone(), f.1)).collect();
    key.sort();
    key
}

fn unit_key(unit: &Unit) -> DimensionKey {
    let mut key: DimensionKey = unit
        .iter()
        .map(|f| (f.unit_id.name.clone(), f.exponent))
        .collect();
    key.sort();
    key
}

#[derive(Debug, Default)]
struct SchemeCache {
    scheme_names: Option<Vec<CompactString>>,
    dimensions: HashMap<CompactString, Vec<Dimension>>,
    units: HashMap<(CompactString, DimensionKey), Vec<Unit>>,
    closest: HashMap<(DimensionKey, CompactString, DimensionKey), Option<Unit>>,
}

/// Named units of a scope, and their grouping into display schemes.
///
/// Scheme lookups are cached. The whole cache is dropped whenever a unit is
/// registered and rebuilt lazily on the next query.
#[derive(Debug, Default)]
pub struct UnitRegistry {
    inner: Registry<UnitMetadata>,
    cache: RefCell<SchemeCache>,
}

impl Clone for UnitRegistry {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            cache: RefCell::default(),
        }
    }
}

impl UnitRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_primitive_unit(
        &mut self,
        unit_id: UnitIdentifier,
        schemes: &[CompactString],
    ) -> Result<Unit> {
        let UnitKind::Primitive(dimension) = unit_id.kind() else {
            return Err(UnitRegistryError::NotPrimitive(unit_id.name.to_string()));
        };

        if let Some(existing) = self.primitive_unit_for(dimension) {
            return Err(UnitRegistryError::DuplicatePrimitiveUnit {
                dimension: dimension.to_string(),
                existing: existing.to_string(),
            });
        }

        let name = unit_id.name.clone();
        let unit = Unit::named(unit_id);
        self.inner.add_base_entry(
            &name,
            UnitMetadata {
                unit: unit.clone(),
                schemes: schemes.to_vec(),
            },
        )?;
        self.invalidate_cache();

        debug!("Added primitive unit '{name}' for dimension {}", unit.dimension());
        Ok(unit)
    }

    pub fn add_derived_unit(
        &mut self,
        unit_id: UnitIdentifier,
        schemes: &[CompactString],
    ) -> Result<Unit> {
        let name = unit_id.name.clone();
        let unit = Unit::named(unit_id);
        let (base_representation, factor) = base_representation(&unit);

        self.inner.add_derived_entry(
            &name,
            base_representation.clone(),
            UnitMetadata {
                unit: unit.clone(),
                schemes: schemes.to_vec(),
            },
        )?;
        self.invalidate_cache();

        debug!("Added derived unit '{name}' = {factor} {base_representation}");
        Ok(unit)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.contains(name)
    }

    pub fn get_unit(&self, name: &str) -> Result<Unit> {
        Ok(self.inner.get_metadata(name)?.unit.clone())
    }

    /// Primitive units first, then derived units, each in registration order.
    pub fn iter_units(&self) -> impl Iterator<Item = (&CompactString, &UnitMetadata)> + '_ {
        self.inner.iter_base_entries().chain(
            self.inner
                .iter_derived_entries()
                .map(|(name, (_, metadata))| (name, metadata)),
        )
    }

    fn primitive_unit_for(&self, dimension: &str) -> Option<&CompactString> {
        self.inner
            .iter_base_entries()
            .find(|(_, metadata)| {
                metadata.unit.as_named().is_some_and(|id| {
                    matches!(id.kind(), UnitKind::Primitive(d) if d == dimension)
                })
            })
            .map(|(name, _)| name)
    }

    fn invalidate_cache(&mut self) {
        *self.cache.get_mut() = SchemeCache::default();
    }

    /// Bring a composite unit into a more readable form:
    ///
    /// - a dimensionless composition becomes no unit at all,
    /// - a composition that is exactly a registered unit becomes that unit,
    /// - factors that share a base dimension are merged into the first one,
    ///   so `m·km` becomes `m²` with a factor of 1000.
    pub fn simplify(&self, unit: &Unit) -> Simplified {
        if unit.is_scalar() {
            return Simplified {
                unit: Unit::scalar(),
                factor: 1.0,
            };
        }

        if unit.is_dimensionless() {
            return Simplified {
                unit: Unit::scalar(),
                factor: unit.conversion_factor(),
            };
        }

        if let Some(named) = self.matching_named_unit(unit) {
            return Simplified {
                unit: named,
                factor: 1.0,
            };
        }

        let (merged, factor) = merge_same_dimension(unit);
        let unit = self.matching_named_unit(&merged).unwrap_or(merged);
        Simplified { unit, factor }
    }

    fn matching_named_unit(&self, unit: &Unit) -> Option<Unit> {
        if unit.as_named().is_some() {
            return None;
        }

        let (base_representation, factor) = base_representation(unit);

        let primitive_match = base_representation
            .iter()
            .next()
            .filter(|f| base_representation.cardinality() == 1 && f.1 == 1)
            .filter(|f| self.inner.is_base_entry(&f.0))
            .map(|f| f.0.clone());

        primitive_match
            .into_iter()
            .chain(self.inner.get_derived_entry_names_for(&base_representation))
            .filter_map(|name| self.inner.get_metadata(&name).ok())
            .map(|metadata| metadata.unit.clone())
            .find(|candidate| same_factor(candidate.conversion_factor(), factor))
    }

    /// Names of all schemes any unit is registered in, in order of first use.
    pub fn scheme_names(&self) -> Vec<CompactString> {
        let mut cache = self.cache.borrow_mut();
        cache
            .scheme_names
            .get_or_insert_with(|| {
                debug!("Rebuilding unit scheme names");
                let mut names: Vec<CompactString> = vec![];
                for (_, metadata) in self.iter_units() {
                    for scheme in &metadata.schemes {
                        if !names.contains(scheme) {
                            names.push(scheme.clone());
                        }
                    }
                }
                names
            })
            .clone()
    }

    /// Units of the given scheme that measure `dimension`, in registration order.
    pub fn units_for(&self, scheme: &str, dimension: &Dimension) -> Vec<Unit> {
        let key = (scheme.to_compact_string(), dimension_key(dimension));
        if let Some(units) = self.cache.borrow().units.get(&key) {
            return units.clone();
        }

        debug!("Collecting '{scheme}' units for dimension {dimension}");
        let units: Vec<Unit> = self
            .iter_units()
            .filter(|(_, metadata)| metadata.schemes.iter().any(|s| s == scheme))
            .map(|(_, metadata)| metadata.unit.clone())
            .filter(|unit| &unit.dimension() == dimension)
            .collect();

        self.cache.borrow_mut().units.insert(key, units.clone());
        units
    }

    /// Dimensions that have at least one unit in the given scheme, ordered by
    /// ascending number of base dimensions. Equal cardinalities keep
    /// registration order.
    pub fn get_dimensions(&self, scheme: &str) -> Vec<Dimension> {
        if let Some(dimensions) = self.cache.borrow().dimensions.get(scheme) {
            return dimensions.clone();
        }

        debug!("Collecting dimensions of scheme '{scheme}'");
        let mut dimensions: Vec<Dimension> = vec![];
        for (_, metadata) in self.iter_units() {
            if metadata.schemes.iter().any(|s| s == scheme) {
                let dimension = metadata.unit.dimension();
                if !dimensions.contains(&dimension) {
                    dimensions.push(dimension);
                }
            }
        }
        dimensions.sort_by_key(|d| d.cardinality());

        self.cache
            .borrow_mut()
            .dimensions
            .insert(scheme.to_compact_string(), dimensions.clone());
        dimensions
    }

    /// Among the units of `scheme` measuring `dimension`, the one whose
    /// conversion ratio to `source` is closest to one. The comparison only
    /// looks at the units, never at the magnitude of a value. Ties keep the
    /// unit registered first.
    pub fn find_closest_unit(
        &self,
        source: &Unit,
        scheme: &str,
        dimension: &Dimension,
    ) -> Option<Unit> {
        let key = (
            unit_key(source),
            scheme.to_compact_string(),
            dimension_key(dimension),
        );
        if let Some(closest) = self.cache.borrow().closest.get(&key) {
            return closest.clone();
        }

        let source_factor = source.conversion_factor();
        let mut closest: Option<(Unit, f64)> = None;
        for candidate in self.units_for(scheme, dimension) {
            let distance = (candidate.conversion_factor() / source_factor - 1.0).abs();
            if closest.as_ref().map_or(true, |(_, best)| distance < *best) {
                closest = Some((candidate, distance));
            }
        }
        let closest = closest.map(|(unit, _)| unit);

        self.cache
            .borrow_mut()
            .closest
            .insert(key, closest.clone());
        closest
    }
}

fn base_representation(unit: &Unit) -> (BaseRepresentation, ConversionFactor) {
    let (base_unit, factor) = unit.to_base_unit_representation();
    let representation = BaseRepresentation::from_factors(
        base_unit
            .iter()
            .map(|f| BaseRepresentationFactor(f.unit_id.name.clone(), f.exponent)),
    );
    (representation, factor)
}

fn same_factor(a: ConversionFactor, b: ConversionFactor) -> bool {
    (a - b).abs() <= 1e-12 * a.abs().max(b.abs())
}

fn merge_same_dimension(unit: &Unit) -> (Unit, ConversionFactor) {
    let mut factors: Vec<UnitFactor> = vec![];
    let mut scalar = 1.0;

    for factor in unit.iter() {
        let single = Unit::from_identifier(factor.unit_id.clone());
        let dimension = single.dimension();

        let target = dimension
            .is_base()
            .then(|| {
                factors.iter().find(|f| {
                    f.unit_id != factor.unit_id
                        && Unit::from_identifier(f.unit_id.clone()).dimension() == dimension
                })
            })
            .flatten()
            .map(|f| f.unit_id.clone());

        match target {
            Some(target) => {
                let ratio = single.conversion_factor()
                    / Unit::from_identifier(target.clone()).conversion_factor();
                scalar *= ratio.powi(factor.exponent);
                factors.push(UnitFactor {
                    unit_id: target,
                    exponent: factor.exponent,
                });
            }
            None => factors.push(factor.clone()),
        }
    }

    (Unit::from_factors(factors), scalar)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    fn metric() -> Vec<CompactString> {
        vec!["Metric".into()]
    }

    fn registry() -> UnitRegistry {
        let mut registry = UnitRegistry::new();
        let meter = registry
            .add_primitive_unit(UnitIdentifier::primitive("m", "Length"), &metric())
            .unwrap();
        let second = registry
            .add_primitive_unit(UnitIdentifier::primitive("s", "Time"), &metric())
            .unwrap();
        let gram = registry
            .add_primitive_unit(UnitIdentifier::primitive("g", "Mass"), &metric())
            .unwrap();
        registry
            .add_derived_unit(
                UnitIdentifier::derived("km", 1000.0, meter.clone()),
                &metric(),
            )
            .unwrap();
        let kilogram = registry
            .add_derived_unit(UnitIdentifier::derived("kg", 1000.0, gram), &metric())
            .unwrap();
        registry
            .add_derived_unit(
                UnitIdentifier::derived("N", 1.0, kilogram * meter / second.power(2)),
                &metric(),
            )
            .unwrap();
        registry
    }

    fn unit(registry: &UnitRegistry, name: &str) -> Unit {
        registry.get_unit(name).unwrap()
    }

    #[test]
    fn one_primitive_unit_per_dimension() {
        let mut registry = registry();
        assert_eq!(
            registry.add_primitive_unit(UnitIdentifier::primitive("ft", "Length"), &[]),
            Err(UnitRegistryError::DuplicatePrimitiveUnit {
                dimension: "Length".into(),
                existing: "m".into()
            })
        );
        assert!(matches!(
            registry.add_derived_unit(UnitIdentifier::derived("km", 1000.0, Unit::scalar()), &[]),
            Err(UnitRegistryError::RegistryError(
                RegistryError::EntryExists(_)
            ))
        ));
    }

    #[test]
    fn unknown_units_come_with_suggestions() {
        let registry = registry();
        assert_eq!(
            registry.get_unit("kgg"),
            Err(UnitRegistryError::RegistryError(RegistryError::UnknownEntry(
                "kgg".into(),
                Some("kg".into())
            )))
        );
    }

    #[test]
    fn simplify_to_named_unit() {
        let registry = registry();
        let composite =
            unit(&registry, "kg") * unit(&registry, "m") / unit(&registry, "s").power(2);
        let simplified = registry.simplify(&composite);
        assert_eq!(simplified.unit.to_string(), "N");
        assert_relative_eq!(simplified.factor, 1.0);
    }

    #[test]
    fn simplify_merges_same_dimension() {
        let registry = registry();
        let composite = unit(&registry, "m") * unit(&registry, "km");
        let simplified = registry.simplify(&composite);
        assert_eq!(simplified.unit, unit(&registry, "m").power(2));
        assert_relative_eq!(simplified.factor, 1000.0);
    }

    #[test]
    fn simplify_dimensionless() {
        let registry = registry();
        let composite = unit(&registry, "km") / unit(&registry, "m");
        let simplified = registry.simplify(&composite);
        assert!(simplified.unit.is_scalar());
        assert_relative_eq!(simplified.factor, 1000.0);
    }

    #[test]
    fn simplify_keeps_irreducible_units() {
        let registry = registry();
        let velocity = unit(&registry, "km") / unit(&registry, "s");
        assert_eq!(
            registry.simplify(&velocity),
            Simplified {
                unit: velocity,
                factor: 1.0
            }
        );
    }

    #[test]
    fn schemes() {
        let registry = registry();
        assert_eq!(registry.scheme_names(), vec![CompactString::from("Metric")]);

        let dimensions = registry.get_dimensions("Metric");
        assert_eq!(dimensions.len(), 4);
        assert_eq!(dimensions[0], Dimension::base("Length"));
        assert_eq!(dimensions[3].cardinality(), 3);

        let lengths = registry.units_for("Metric", &Dimension::base("Length"));
        assert_eq!(lengths, vec![unit(&registry, "m"), unit(&registry, "km")]);
        assert!(registry.units_for("Imperial", &Dimension::base("Length")).is_empty());
    }

    #[test]
    fn closest_unit_compares_static_ratios() {
        let registry = registry();
        let meter = unit(&registry, "m");
        let length = Dimension::base("Length");

        assert_eq!(
            registry.find_closest_unit(&meter, "Metric", &length),
            Some(meter.clone())
        );
        assert_eq!(
            registry.find_closest_unit(&unit(&registry, "km"), "Metric", &length),
            Some(unit(&registry, "km"))
        );
        assert_eq!(registry.find_closest_unit(&meter, "Imperial", &length), None);
    }

    #[test]
    fn registration_invalidates_scheme_cache() {
        let mut registry = registry();
        let length = Dimension::base("Length");
        let centimeter = UnitIdentifier::derived("cm", 0.01, unit(&registry, "m"));

        assert_eq!(registry.units_for("Metric", &length).len(), 2);
        assert!(registry.get_dimensions("Imperial").is_empty());
        let source = Unit::named(centimeter.clone());
        assert_eq!(
            registry.find_closest_unit(&source, "Metric", &length),
            Some(unit(&registry, "m"))
        );

        registry.add_derived_unit(centimeter, &metric()).unwrap();

        assert_eq!(registry.units_for("Metric", &length).len(), 3);

        let foot = UnitIdentifier::derived("ft", 0.3048, unit(&registry, "m"));
        registry
            .add_derived_unit(foot, &[CompactString::from("Imperial")])
            .unwrap();
        assert_eq!(registry.get_dimensions("Imperial"), vec![length.clone()]);
        assert_eq!(
            registry.find_closest_unit(&source, "Metric", &length),
            Some(unit(&registry, "cm"))
        );
    }
}
