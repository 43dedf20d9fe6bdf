//! Affix-based variant generation.
//!
//! A [`VariantGenerator`] takes a [`BaseSubject`] (a name plus stats), draws
//! prefixes and suffixes from a modifier pool, and returns a
//! [`GeneratedVariant`]. Generation never mutates the subject or the pool; the
//! only state consumed is the injected RNG.

mod compose;
mod generator;

pub use compose::{compose_name, merge_stats};
pub use generator::{VariantGenerator, weighted_index};

use std::collections::BTreeSet;

use crate::stats::StatBlock;

/// The entity or item being varied.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BaseSubject {
    pub name: String,
    pub stats: StatBlock,
}

impl BaseSubject {
    pub fn new(name: impl Into<String>, stats: StatBlock) -> Self {
        Self {
            name: name.into(),
            stats,
        }
    }
}

/// Result of one generation call. Owned by the caller; never registered.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeneratedVariant {
    pub base_name: String,
    pub final_name: String,
    pub final_stats: StatBlock,
    pub granted_effects: BTreeSet<String>,

    /// Applied prefix ids in selection order.
    pub prefixes: Vec<String>,

    /// Applied suffix ids in selection order.
    pub suffixes: Vec<String>,
}

impl GeneratedVariant {
    /// The subject with nothing applied.
    pub fn unmodified(subject: &BaseSubject) -> Self {
        Self {
            base_name: subject.name.clone(),
            final_name: subject.name.clone(),
            final_stats: subject.stats.clone(),
            granted_effects: BTreeSet::new(),
            prefixes: Vec::new(),
            suffixes: Vec::new(),
        }
    }

    pub fn is_modified(&self) -> bool {
        !self.prefixes.is_empty() || !self.suffixes.is_empty()
    }

    pub fn modifier_count(&self) -> usize {
        self.prefixes.len() + self.suffixes.len()
    }

    /// Ids of every applied modifier, prefixes first.
    pub fn applied(&self) -> impl Iterator<Item = &str> {
        self.prefixes
            .iter()
            .chain(self.suffixes.iter())
            .map(String::as_str)
    }

    pub fn grants(&self, effect: &str) -> bool {
        self.granted_effects.contains(effect)
    }
}
