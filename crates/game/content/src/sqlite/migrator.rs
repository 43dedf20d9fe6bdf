use std::fs;
use std::path::{Path, PathBuf};

use rusqlite::Connection;
use serde_json::Value;

use game_core::{AbilityDef, BuffDef, EntityTemplate, ModifierRecord, StatusEffectDef};

use super::db::{ContentDb, DatabaseError, StoredRow, upsert_with};
use crate::record::ContentRecord;
use crate::source::{ContentSource, JsonDirectorySource, LoadIssue, ScanMode};

/// Result of copying records between a JSON data directory and the database.
#[derive(Clone, Debug, Default)]
pub struct MigrationReport {
    /// Records written per collection, in copy order.
    pub migrated: Vec<(&'static str, usize)>,
    pub issues: Vec<LoadIssue>,
}

impl MigrationReport {
    pub fn total(&self) -> usize {
        self.migrated.iter().map(|(_, n)| n).sum()
    }

    pub fn count(&self, collection: &str) -> usize {
        self.migrated
            .iter()
            .find(|(name, _)| *name == collection)
            .map_or(0, |(_, n)| *n)
    }
}

/// Copies every record kind from a JSON data directory into a [`ContentDb`].
///
/// All kinds are written in one transaction. Entries that fail to decode are
/// reported and skipped; they never abort the migration.
pub struct JsonMigrator {
    data_dir: PathBuf,
    scan: ScanMode,
}

impl JsonMigrator {
    pub fn new(data_dir: impl Into<PathBuf>, scan: ScanMode) -> Self {
        Self {
            data_dir: data_dir.into(),
            scan,
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn migrate(&self, db: &mut ContentDb) -> Result<MigrationReport, DatabaseError> {
        let mut report = MigrationReport::default();
        let tx = db.transaction()?;

        self.copy::<ModifierRecord>(&tx, &mut report)?;
        self.copy::<StatusEffectDef>(&tx, &mut report)?;
        self.copy::<BuffDef>(&tx, &mut report)?;
        self.copy::<AbilityDef>(&tx, &mut report)?;
        self.copy::<EntityTemplate>(&tx, &mut report)?;

        tx.commit()?;
        tracing::info!(
            data_dir = %self.data_dir.display(),
            records = report.total(),
            issues = report.issues.len(),
            "json content migrated to sqlite"
        );
        Ok(report)
    }

    fn copy<T: ContentRecord>(
        &self,
        conn: &Connection,
        report: &mut MigrationReport,
    ) -> Result<(), DatabaseError> {
        let source = JsonDirectorySource::<T>::new(self.data_dir.join(T::COLLECTION), self.scan);
        let batch = match source.fetch() {
            Ok(batch) => batch,
            Err(err) => {
                tracing::warn!(kind = T::KIND, error = %err, "skipping collection");
                report.issues.push(LoadIssue::new(source.describe(), err));
                report.migrated.push((T::COLLECTION, 0));
                return Ok(());
            }
        };

        for sourced in &batch.records {
            upsert_with(conn, &sourced.record)?;
        }
        report.migrated.push((T::COLLECTION, batch.records.len()));
        report.issues.extend(batch.issues);
        Ok(())
    }
}

/// Writes the database back out as a JSON data directory.
///
/// Each kind lands in `<out_dir>/<collection>/<collection>.json` as one array
/// in insertion order, the layout [`JsonMigrator`] and the JSON registries
/// read. Empty tables still produce an empty array.
pub struct JsonExporter {
    out_dir: PathBuf,
}

impl JsonExporter {
    pub fn new(out_dir: impl Into<PathBuf>) -> Self {
        Self {
            out_dir: out_dir.into(),
        }
    }

    pub fn out_dir(&self) -> &Path {
        &self.out_dir
    }

    pub fn export(&self, db: &ContentDb) -> Result<MigrationReport, DatabaseError> {
        let mut report = MigrationReport::default();

        self.write::<ModifierRecord>(db, &mut report)?;
        self.write::<StatusEffectDef>(db, &mut report)?;
        self.write::<BuffDef>(db, &mut report)?;
        self.write::<AbilityDef>(db, &mut report)?;
        self.write::<EntityTemplate>(db, &mut report)?;

        tracing::info!(
            out_dir = %self.out_dir.display(),
            records = report.total(),
            "sqlite content exported to json"
        );
        Ok(report)
    }

    fn write<T: ContentRecord>(
        &self,
        db: &ContentDb,
        report: &mut MigrationReport,
    ) -> Result<(), DatabaseError> {
        let entries = db
            .rows::<T>()?
            .iter()
            .map(parse_row::<T>)
            .collect::<Result<Vec<_>, _>>()?;

        let count = entries.len();
        let dir = self.out_dir.join(T::COLLECTION);
        let path = dir.join(format!("{}.json", T::COLLECTION));
        fs::create_dir_all(&dir).map_err(|source| DatabaseError::Io {
            path: dir.clone(),
            source,
        })?;
        fs::write(&path, format!("{:#}\n", Value::Array(entries)))
            .map_err(|source| DatabaseError::Io { path, source })?;

        tracing::debug!(kind = T::KIND, records = count, "collection exported");
        report.migrated.push((T::COLLECTION, count));
        Ok(())
    }
}

fn parse_row<T: ContentRecord>(row: &StoredRow) -> Result<Value, DatabaseError> {
    serde_json::from_str(&row.data).map_err(|source| DatabaseError::Json {
        table: T::COLLECTION,
        id: row.id.clone(),
        source,
    })
}
