use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use super::db::{ContentDb, decode};
use crate::error::LoadError;
use crate::record::ContentRecord;
use crate::source::{ContentSource, LoadIssue, SourceBatch, SourcedRecord};

/// Reads records of kind `T` from a content database file.
///
/// The file is opened read-only on every fetch, so a reload sees whatever the
/// database holds at that moment.
pub struct SqliteSource<T> {
    path: PathBuf,
    _record: PhantomData<fn() -> T>,
}

impl<T: ContentRecord> SqliteSource<T> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _record: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<T: ContentRecord> ContentSource<T> for SqliteSource<T> {
    fn describe(&self) -> String {
        format!("{}:{}", self.path.display(), T::COLLECTION)
    }

    fn fetch(&self) -> Result<SourceBatch<T>, LoadError> {
        let db = ContentDb::open_existing(&self.path)?;
        let rows = db.rows::<T>()?;

        let mut batch = SourceBatch {
            units_scanned: 1,
            ..SourceBatch::default()
        };
        for row in rows {
            let origin = format!("{}/{}", T::COLLECTION, row.id);
            match decode::<T>(&row) {
                Ok(record) => batch.records.push(SourcedRecord { record, origin }),
                Err(err) => batch.issues.push(LoadIssue::new(origin, err)),
            }
        }
        Ok(batch)
    }
}

#[cfg(test)]
mod tests {
    use game_core::{AffixSlot, ModifierRecord, Rarity, StatusEffectDef};
    use rusqlite::params;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn fetches_rows_and_reports_corrupt_ones() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("content.db");
        {
            let db = ContentDb::open(&path).unwrap();
            db.upsert(&ModifierRecord::new("brave", "Brave", AffixSlot::Prefix, Rarity::Common))
                .unwrap();
            let conn = rusqlite::Connection::open(&path).unwrap();
            conn.execute(
                "INSERT INTO modifiers (id, name, data, updated_at) VALUES (?1, ?2, ?3, ?4)",
                params!["junk", "Junk", "{not json", "now"],
            )
            .unwrap();
        }

        let batch = SqliteSource::<ModifierRecord>::new(&path).fetch().unwrap();
        assert_eq!(batch.records.len(), 1);
        assert_eq!(batch.records[0].origin, "modifiers/brave");
        assert_eq!(batch.issues.len(), 1);
        assert_eq!(batch.issues[0].origin, "modifiers/junk");

        let statuses = SqliteSource::<StatusEffectDef>::new(&path).fetch().unwrap();
        assert!(statuses.records.is_empty());
    }

    #[test]
    fn missing_database_fails_the_fetch() {
        let source = SqliteSource::<ModifierRecord>::new("/definitely/not/here.db");
        assert!(matches!(source.fetch(), Err(LoadError::Database(_))));
    }
}
