//! Reloadable keyed stores of content records.
//!
//! A [`Registry`] reads its records from a [`ContentSource`], builds a fresh
//! [`RegistryTable`] off to the side, and swaps it in with a single pointer
//! store. Readers holding an older snapshot keep seeing the old table; no
//! reader ever observes a half-built one.

mod queries;

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use serde_json::json;

use game_content::{ContentRecord, ContentSource, LoadIssue, SourceBatch, SourcedRecord};

use crate::events::{Signal, SignalBus};

/// Summary of one load or reload.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// Distinct ids now in the table.
    pub count: usize,
    /// Files, entries, or sources that were skipped.
    pub errors: Vec<LoadIssue>,
    /// Ids declared more than once; the last declaration won.
    pub duplicates: Vec<String>,
    /// Files (or tables) examined.
    pub units_scanned: usize,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty() && self.duplicates.is_empty()
    }
}

/// An immutable, fully-built table of records.
#[derive(Debug)]
pub struct RegistryTable<T> {
    entries: Vec<Arc<T>>,
    index: HashMap<String, usize>,
}

impl<T> Default for RegistryTable<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            index: HashMap::new(),
        }
    }
}

impl<T: ContentRecord> RegistryTable<T> {
    /// Builds a table from records in source order. Returns the ids that were
    /// declared twice.
    fn build(registry: &str, records: Vec<SourcedRecord<T>>) -> (Self, Vec<String>) {
        let mut table = Self::default();
        let mut duplicates = Vec::new();

        for sourced in records {
            let id = sourced.record.id().to_owned();
            match table.index.get(&id) {
                Some(&pos) => {
                    tracing::warn!(
                        registry,
                        id = %id,
                        origin = %sourced.origin,
                        "duplicate id, later definition replaces earlier one"
                    );
                    table.entries[pos] = Arc::new(sourced.record);
                    duplicates.push(id);
                }
                None => {
                    table.index.insert(id, table.entries.len());
                    table.entries.push(Arc::new(sourced.record));
                }
            }
        }
        (table, duplicates)
    }

    pub fn get(&self, id: &str) -> Option<Arc<T>> {
        self.index.get(id).map(|&pos| Arc::clone(&self.entries[pos]))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Records in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().map(|entry| entry.as_ref())
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.iter().map(|record| record.id())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Keyed, reloadable store for one record kind.
pub struct Registry<T: ContentRecord> {
    source: Box<dyn ContentSource<T>>,
    table: RwLock<Arc<RegistryTable<T>>>,
    bus: Option<SignalBus>,
}

impl<T: ContentRecord> Registry<T> {
    pub fn new(source: impl ContentSource<T> + 'static) -> Self {
        Self::from_boxed(Box::new(source))
    }

    pub fn from_boxed(source: Box<dyn ContentSource<T>>) -> Self {
        Self {
            source,
            table: RwLock::new(Arc::new(RegistryTable::default())),
            bus: None,
        }
    }

    /// Publishes registry signals on `bus`.
    pub fn with_signals(mut self, bus: SignalBus) -> Self {
        self.bus = Some(bus);
        self
    }

    /// Registry name used in logs and signal payloads.
    pub fn name(&self) -> &'static str {
        T::COLLECTION
    }

    /// Where the records come from.
    pub fn data_path(&self) -> String {
        self.source.describe()
    }

    /// Loads the table from the source. Emits `REGISTRY_INITIALIZED`.
    pub fn load(&self) -> LoadReport {
        let report = self.refresh();
        self.publish(
            Signal::RegistryInitialized,
            json!({
                "registry_name": self.name(),
                "item_count": report.count,
                "error_count": report.errors.len(),
                "data_path": self.data_path(),
            }),
        );
        report
    }

    /// Rebuilds the table and swaps it in. Emits `REGISTRY_RELOADED`.
    pub fn reload(&self) -> LoadReport {
        let previous = self.len();
        let report = self.refresh();
        self.publish(
            Signal::RegistryReloaded,
            json!({
                "registry_name": self.name(),
                "item_count": report.count,
                "previous_count": previous,
                "error_count": report.errors.len(),
                "data_path": self.data_path(),
            }),
        );
        report
    }

    fn refresh(&self) -> LoadReport {
        let registry = self.name();
        let batch = match self.source.fetch() {
            Ok(batch) => batch,
            Err(err) => {
                // Keep serving the current table.
                tracing::warn!(registry, "content source unavailable, table unchanged");
                let issue = LoadIssue::new(self.data_path(), err);
                self.report_issue(&issue);
                return LoadReport {
                    count: self.len(),
                    errors: vec![issue],
                    ..LoadReport::default()
                };
            }
        };

        let SourceBatch {
            records,
            issues,
            units_scanned,
        } = batch;
        for issue in &issues {
            self.report_issue(issue);
        }

        let (table, duplicates) = RegistryTable::build(registry, records);
        let count = table.len();
        {
            let mut slot = self.table.write().unwrap_or_else(PoisonError::into_inner);
            *slot = Arc::new(table);
        }

        if count == 0 {
            tracing::warn!(registry, source = %self.data_path(), "registry loaded no records");
        }
        tracing::info!(
            registry,
            count,
            errors = issues.len(),
            duplicates = duplicates.len(),
            files = units_scanned,
            "registry loaded"
        );

        LoadReport {
            count,
            errors: issues,
            duplicates,
            units_scanned,
        }
    }

    fn report_issue(&self, issue: &LoadIssue) {
        tracing::error!(
            registry = self.name(),
            origin = %issue.origin,
            message = %issue.message,
            "skipped content"
        );
        self.publish(
            Signal::RegistryError,
            json!({
                "registry_name": self.name(),
                "origin": issue.origin,
                "message": issue.message,
            }),
        );
    }

    fn publish(&self, signal: Signal, payload: serde_json::Value) {
        if let Some(bus) = &self.bus {
            bus.publish(signal, format!("registry:{}", self.name()), payload);
        }
    }

    /// The current table. Stays valid and unchanged across later reloads.
    pub fn snapshot(&self) -> Arc<RegistryTable<T>> {
        let guard = self.table.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    pub fn get(&self, id: &str) -> Option<Arc<T>> {
        self.snapshot().get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.snapshot().contains(id)
    }

    /// Every record in insertion order.
    pub fn all(&self) -> Vec<Arc<T>> {
        self.snapshot().entries.clone()
    }

    /// Records matching `predicate`, in insertion order.
    pub fn filter(&self, predicate: impl Fn(&T) -> bool) -> Vec<Arc<T>> {
        self.snapshot()
            .entries
            .iter()
            .filter(|entry| predicate(entry))
            .cloned()
            .collect()
    }

    pub fn ids(&self) -> Vec<String> {
        self.snapshot().ids().map(str::to_owned).collect()
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }
}
