use std::fmt::Display;

use compact_str::{CompactString, ToCompactString};
use indexmap::IndexMap;
use thiserror::Error;

use crate::{
    arithmetic::{pretty_exponent, Exponent, Power},
    product::{Canonicalize, Product},
    suggestion,
};

#[derive(Clone, Error, Debug, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Entry '{0}' exists already.")]
    EntryExists(String),

    #[error("Unknown entry '{0}'.")]
    UnknownEntry(String, Option<String>),
}

pub type Result<T> = std::result::Result<T, RegistryError>;

pub type BaseEntry = CompactString;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BaseRepresentationFactor(pub BaseEntry, pub Exponent);

impl Display for BaseRepresentationFactor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.0, pretty_exponent(self.1))
    }
}

impl Canonicalize for BaseRepresentationFactor {
    type MergeKey = BaseEntry;

    fn merge_key(&self) -> Self::MergeKey {
        self.0.clone()
    }

    fn merge(self, other: Self) -> Self {
        BaseRepresentationFactor(self.0, self.1.saturating_add(other.1))
    }

    fn is_trivial(&self) -> bool {
        self.1 == 0
    }
}

impl Power for BaseRepresentationFactor {
    fn exponent(&self) -> Exponent {
        self.1
    }

    fn with_exponent(self, exponent: Exponent) -> Self {
        BaseRepresentationFactor(self.0, exponent)
    }
}

/// A product of base entries with integer exponents. Used both for physical
/// dimensions (`Length·Time⁻¹`) and for the primitive-unit composition of a
/// unit (`m·s⁻¹`).
pub type BaseRepresentation = Product<BaseRepresentationFactor>;

impl BaseRepresentation {
    pub fn base(name: &str) -> Self {
        Self::from_factor(BaseRepresentationFactor(name.to_compact_string(), 1))
    }

    /// Number of base entries with a nonzero exponent.
    pub fn cardinality(&self) -> usize {
        self.len()
    }

    pub fn exponent_of(&self, name: &str) -> Exponent {
        self.iter()
            .find(|f| f.0 == name)
            .map(|f| f.1)
            .unwrap_or(0)
    }
}

impl Display for BaseRepresentation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            f.write_str("Scalar")
        } else {
            f.write_str(&self.as_string(" × ", " / "))
        }
    }
}

/// Named entries that are either base entries or derived from a product of
/// base entries. Iteration order is registration order.
#[derive(Debug, Clone)]
pub struct Registry<Metadata> {
    base_entries: IndexMap<CompactString, Metadata>,
    derived_entries: IndexMap<CompactString, (BaseRepresentation, Metadata)>,
}

impl<T> Default for Registry<T> {
    fn default() -> Self {
        Self {
            base_entries: IndexMap::default(),
            derived_entries: IndexMap::default(),
        }
    }
}

impl<Metadata: Clone> Registry<Metadata> {
    pub fn add_base_entry(&mut self, name: &str, metadata: Metadata) -> Result<()> {
        if self.contains(name) {
            return Err(RegistryError::EntryExists(name.to_owned()));
        }
        self.base_entries.insert(name.to_compact_string(), metadata);

        Ok(())
    }

    pub fn add_derived_entry(
        &mut self,
        name: &str,
        base_representation: BaseRepresentation,
        metadata: Metadata,
    ) -> Result<()> {
        if self.contains(name) {
            return Err(RegistryError::EntryExists(name.to_owned()));
        }

        self.derived_entries
            .insert(name.to_compact_string(), (base_representation, metadata));

        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.base_entries.contains_key(name) || self.derived_entries.contains_key(name)
    }

    pub fn is_base_entry(&self, name: &str) -> bool {
        self.base_entries.contains_key(name)
    }

    pub fn get_base_representation_for_name(
        &self,
        name: &str,
    ) -> Result<(BaseRepresentation, Metadata)> {
        if let Some(metadata) = self.base_entries.get(name) {
            Ok((BaseRepresentation::base(name), metadata.clone()))
        } else {
            self.derived_entries
                .get(name)
                .cloned()
                .ok_or_else(|| self.unknown_entry(name))
        }
    }

    pub fn get_metadata(&self, name: &str) -> Result<&Metadata> {
        self.base_entries
            .get(name)
            .or_else(|| self.derived_entries.get(name).map(|(_, m)| m))
            .ok_or_else(|| self.unknown_entry(name))
    }

    /// Names of derived entries with exactly this base representation, in
    /// registration order.
    pub fn get_derived_entry_names_for(
        &self,
        base_representation: &BaseRepresentation,
    ) -> Vec<CompactString> {
        self.derived_entries
            .iter()
            .filter(|(_, (br, _))| br == base_representation)
            .map(|(name, _)| name.clone())
            .collect()
    }

    pub fn iter_base_entries(&self) -> impl Iterator<Item = (&CompactString, &Metadata)> + '_ {
        self.base_entries.iter()
    }

    pub fn iter_derived_entries(
        &self,
    ) -> impl Iterator<Item = (&CompactString, &(BaseRepresentation, Metadata))> + '_ {
        self.derived_entries.iter()
    }

    fn unknown_entry(&self, name: &str) -> RegistryError {
        let suggestion = suggestion::did_you_mean(
            self.base_entries.keys().chain(self.derived_entries.keys()),
            name,
        );
        RegistryError::UnknownEntry(name.to_owned(), suggestion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_and_derived_entries() {
        let mut registry = Registry::<()>::default();
        registry.add_base_entry("Length", ()).unwrap();
        registry.add_base_entry("Time", ()).unwrap();
        registry
            .add_derived_entry(
                "Velocity",
                BaseRepresentation::base("Length") / BaseRepresentation::base("Time"),
                (),
            )
            .unwrap();

        assert!(registry.is_base_entry("Length"));
        assert!(!registry.is_base_entry("Velocity"));
        assert_eq!(
            registry.get_base_representation_for_name("Velocity").unwrap().0,
            BaseRepresentation::from_factors([
                BaseRepresentationFactor("Length".into(), 1),
                BaseRepresentationFactor("Time".into(), -1),
            ])
        );
        assert_eq!(
            registry.get_derived_entry_names_for(
                &(BaseRepresentation::base("Length") / BaseRepresentation::base("Time"))
            ),
            vec![CompactString::from("Velocity")]
        );
    }

    #[test]
    fn duplicate_entries_are_rejected() {
        let mut registry = Registry::<()>::default();
        registry.add_base_entry("Length", ()).unwrap();
        assert_eq!(
            registry.add_base_entry("Length", ()),
            Err(RegistryError::EntryExists("Length".into()))
        );
        assert!(registry
            .add_derived_entry("Length", BaseRepresentation::unity(), ())
            .is_err());
    }

    #[test]
    fn unknown_entries_come_with_suggestions() {
        let mut registry = Registry::<()>::default();
        registry.add_base_entry("Length", ()).unwrap();
        assert_eq!(
            registry.get_base_representation_for_name("Lenght"),
            Err(RegistryError::UnknownEntry(
                "Lenght".into(),
                Some("Length".into())
            ))
        );
    }

    #[test]
    fn display() {
        assert_eq!(BaseRepresentation::unity().to_string(), "Scalar");
        let acceleration = BaseRepresentation::base("Length")
            / BaseRepresentation::base("Time").power(2);
        assert_eq!(acceleration.to_string(), "Length / Time²");
        assert_eq!(acceleration.cardinality(), 2);
    }
}
