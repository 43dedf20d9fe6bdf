//! Named integer stats.
//!
//! Content files describe stats as free-form `{"attack": 5}` maps, so stats are
//! keyed by name rather than fixed struct fields. Missing keys read as zero.

use std::collections::BTreeMap;

/// Mapping from stat name to signed value.
///
/// Used both for absolute stats (a subject's base stats) and for deltas (a
/// modifier's `stat_modifiers`). Iteration order is sorted by stat name.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct StatBlock(BTreeMap<String, i32>);

impl StatBlock {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Returns the value of `stat`, or 0 when absent.
    pub fn get(&self, stat: &str) -> i32 {
        self.0.get(stat).copied().unwrap_or(0)
    }

    pub fn contains(&self, stat: &str) -> bool {
        self.0.contains_key(stat)
    }

    pub fn set(&mut self, stat: impl Into<String>, value: i32) {
        self.0.insert(stat.into(), value);
    }

    /// Adds `delta` to `stat`, treating a missing stat as 0. No clamping.
    pub fn add(&mut self, stat: &str, delta: i32) {
        let entry = self.0.entry(stat.to_owned()).or_insert(0);
        *entry = entry.wrapping_add(delta);
    }

    /// Adds every entry of `deltas` key-wise.
    pub fn apply(&mut self, deltas: &StatBlock) {
        for (stat, delta) in deltas.iter() {
            self.add(stat, delta);
        }
    }

    /// Returns a copy with every value multiplied by `factor`.
    pub fn scaled(&self, factor: i32) -> Self {
        self.iter()
            .map(|(stat, value)| (stat.to_owned(), value.wrapping_mul(factor)))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i32)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, i32)> for StatBlock {
    fn from_iter<I: IntoIterator<Item = (K, i32)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl<K: Into<String>, const N: usize> From<[(K, i32); N]> for StatBlock {
    fn from(entries: [(K, i32); N]) -> Self {
        entries.into_iter().collect()
    }
}
