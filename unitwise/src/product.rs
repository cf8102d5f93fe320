use std::{
    fmt::Display,
    ops::{Div, Mul},
};

use crate::arithmetic::{Exponent, Power, PowerError, Rational};

pub trait Canonicalize {
    type MergeKey: PartialEq;

    fn merge_key(&self) -> Self::MergeKey;
    /// Saturates if the combined exponent does not fit.
    fn merge(self, other: Self) -> Self;
    fn is_trivial(&self) -> bool;
}

/// A formal product of factors, always kept in canonical form: factors with
/// equal merge keys are combined and trivial factors (exponent zero) are
/// dropped. The order of first appearance is preserved, so `m·s` stays `m·s`.
#[derive(Debug, Clone)]
pub struct Product<Factor> {
    factors: Vec<Factor>,
}

impl<Factor: Power + Clone + Canonicalize + Display> Product<Factor> {
    pub fn as_string(&self, times_separator: &str, over_separator: &str) -> String {
        let join = |fs: &[Factor]| -> String {
            fs.iter()
                .map(|f| f.to_string())
                .collect::<Vec<_>>()
                .join(times_separator)
        };

        let positive: Vec<_> = self.iter().filter(|f| f.exponent() > 0).cloned().collect();
        let negative: Vec<_> = self
            .iter()
            .filter(|f| f.exponent() < 0)
            .map(|f| f.clone().invert())
            .collect();

        match (&positive[..], &negative[..]) {
            ([], []) => String::new(),
            ([], _) => join(
                &negative
                    .iter()
                    .map(|f| f.clone().invert())
                    .collect::<Vec<_>>(),
            ),
            (positive, []) => join(positive),
            (positive, [single]) => {
                format!("{}{over_separator}{}", join(positive), single)
            }
            (positive, negative) => {
                format!("{}{over_separator}({})", join(positive), join(negative))
            }
        }
    }
}

impl<Factor: Clone + Canonicalize> Product<Factor> {
    pub fn unity() -> Self {
        Self { factors: vec![] }
    }

    pub fn from_factors(factors: impl IntoIterator<Item = Factor>) -> Self {
        let mut product = Self {
            factors: factors.into_iter().collect(),
        };
        product.canonicalize();
        product
    }

    pub fn from_factor(factor: Factor) -> Self {
        Self::from_factors([factor])
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Factor> {
        self.factors.iter()
    }

    pub fn len(&self) -> usize {
        self.factors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }

    fn canonicalize(&mut self) {
        let mut merged: Vec<Factor> = Vec::with_capacity(self.factors.len());

        for factor in self.factors.drain(..) {
            let key = factor.merge_key();
            match merged.iter().position(|f| f.merge_key() == key) {
                Some(index) => merged[index] = merged[index].clone().merge(factor),
                None => merged.push(factor),
            }
        }

        merged.retain(|f| !f.is_trivial());
        self.factors = merged;
    }
}

impl<Factor: Power + Clone + Canonicalize> Product<Factor> {
    pub fn power(self, e: Exponent) -> Self {
        Self::from_factors(self.factors.into_iter().map(|f| f.power(e)))
    }

    pub fn invert(self) -> Self {
        self.power(-1)
    }

    /// Raise every factor to a rational power. Fails if any resulting
    /// exponent is not integral or out of range.
    pub fn checked_power(self, e: Rational) -> Result<Self, PowerError> {
        let factors = self
            .factors
            .into_iter()
            .map(|f| f.checked_power(e))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_factors(factors))
    }

    /// Like `*`, but `None` instead of saturating when an exponent
    /// overflows.
    pub fn checked_mul(self, other: Self) -> Option<Self> {
        let mut factors = self.factors;
        for factor in other.factors {
            let key = factor.merge_key();
            match factors.iter().position(|f| f.merge_key() == key) {
                Some(index) => factors[index] = factors[index].clone().checked_merge(&factor)?,
                None => factors.push(factor),
            }
        }
        Some(Self::from_factors(factors))
    }

    pub fn checked_div(self, other: Self) -> Option<Self> {
        let inverted = other
            .factors
            .into_iter()
            .map(|f| {
                let exponent = f.exponent().checked_neg()?;
                Some(f.with_exponent(exponent))
            })
            .collect::<Option<Vec<_>>>()?;
        self.checked_mul(Self { factors: inverted })
    }
}

impl<Factor: Clone + Canonicalize> Mul for Product<Factor> {
    type Output = Self;

    fn mul(mut self, mut other: Self) -> Self {
        self.factors.append(&mut other.factors);
        Self::from_factors(self.factors)
    }
}

impl<Factor: Power + Clone + Canonicalize> Div for Product<Factor> {
    type Output = Self;

    fn div(self, other: Self) -> Self {
        #[allow(clippy::suspicious_arithmetic_impl)]
        let result = self * other.invert();
        result
    }
}

impl<Factor: Clone + PartialEq + Canonicalize> PartialEq for Product<Factor> {
    fn eq(&self, other: &Self) -> bool {
        // Both sides are canonical, so merge keys are unique on each side.
        self.factors.len() == other.factors.len()
            && self.factors.iter().all(|f| other.factors.contains(f))
    }
}

impl<Factor: Clone + Eq + Canonicalize> Eq for Product<Factor> {}

impl<Factor> IntoIterator for Product<Factor> {
    type IntoIter = <Vec<Factor> as IntoIterator>::IntoIter;
    type Item = Factor;

    fn into_iter(self) -> Self::IntoIter {
        self.factors.into_iter()
    }
}

impl<Factor: Clone + Canonicalize> std::iter::Product<Factor> for Product<Factor> {
    fn product<I>(iter: I) -> Self
    where
        I: Iterator<Item = Factor>,
    {
        Self::from_factors(iter)
    }
}

impl<Factor: Clone + Canonicalize> std::iter::Product for Product<Factor> {
    fn product<I>(iter: I) -> Self
    where
        I: Iterator<Item = Self>,
    {
        iter.fold(Product::unity(), |acc, prod| acc * prod)
    }
}
