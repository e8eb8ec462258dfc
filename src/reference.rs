//! Read-only gene-set catalogue.
//!
//! Curated category tables (for example resistance versus sensitivity gene
//! panels) are supplied by the caller and passed explicitly into the analyses
//! that need them. The engine never embeds biological content of its own.

use crate::errors::{ValidationError, ValidationResult};
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Named sets of gene identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GeneSetCatalog {
    sets: BTreeMap<String, BTreeSet<String>>,
}

impl GeneSetCatalog {
    /// Empty catalogue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insertion of one labelled set.
    pub fn with_set<I, S>(mut self, label: impl Into<String>, genes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert_set(label, genes);
        self
    }

    /// Insert or extend a labelled set.
    pub fn insert_set<I, S>(&mut self, label: impl Into<String>, genes: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.sets
            .entry(label.into())
            .or_default()
            .extend(genes.into_iter().map(Into::into));
    }

    /// Genes under `label`.
    pub fn get(&self, label: &str) -> Option<&BTreeSet<String>> {
        self.sets.get(label)
    }

    /// True when `gene` belongs to `label`.
    pub fn contains(&self, label: &str, gene: &str) -> bool {
        self.sets.get(label).map_or(false, |set| set.contains(gene))
    }

    /// Every label containing `gene`.
    pub fn categories_of(&self, gene: &str) -> Vec<&str> {
        self.sets
            .iter()
            .filter(|(_, set)| set.contains(gene))
            .map(|(label, _)| label.as_str())
            .collect()
    }

    /// Labels in sorted order.
    pub fn labels(&self) -> Vec<&str> {
        self.sets.keys().map(|k| k.as_str()).collect()
    }

    /// Number of labelled sets.
    pub fn len(&self) -> usize {
        self.sets.len()
    }

    /// True when no set is registered.
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Values of the genes in `label` that appear in `values`, in gene order.
    ///
    /// Unknown labels and labels with no matching genes are an
    /// [`ValidationError::EmptyGroup`].
    pub fn values_for(&self, label: &str, values: &BTreeMap<String, f64>) -> ValidationResult<Vec<f64>> {
        let picked: Vec<f64> = self
            .sets
            .get(label)
            .into_iter()
            .flat_map(|set| set.iter())
            .filter_map(|gene| values.get(gene).copied())
            .collect();
        if picked.is_empty() {
            return Err(ValidationError::EmptyGroup {
                group: label.to_string(),
            });
        }
        Ok(picked)
    }
}
