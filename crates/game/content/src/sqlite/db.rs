use std::path::{Path, PathBuf};

use rusqlite::{Connection, OpenFlags, OptionalExtension, Transaction, params};

use game_core::{
    AbilityDef, BuffDef, EntityTemplate, ErrorSeverity, GameError, ModifierRecord,
    StatusEffectDef,
};

use crate::error::SchemaError;
use crate::record::ContentRecord;

/// Current layout version written to `schema_version`.
pub const SCHEMA_VERSION: i64 = 1;

const CONTENT_TABLES: [&str; 5] = [
    ModifierRecord::COLLECTION,
    StatusEffectDef::COLLECTION,
    BuffDef::COLLECTION,
    AbilityDef::COLLECTION,
    EntityTemplate::COLLECTION,
];

/// Errors raised by the content database.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("database file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("filesystem error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("stored JSON for {table}/{id} is invalid: {source}")]
    Json {
        table: &'static str,
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("stored record {table}/{id} failed validation: {source}")]
    Schema {
        table: &'static str,
        id: String,
        #[source]
        source: SchemaError,
    },

    #[error("failed to encode record: {0}")]
    Encode(SchemaError),

    #[error("database schema version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: i64, supported: i64 },
}

impl GameError for DatabaseError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::NotFound(_) | Self::Io { .. } => ErrorSeverity::Recoverable,
            Self::Json { .. } | Self::Schema { .. } | Self::Encode(_) => ErrorSeverity::Validation,
            Self::Sqlite(_) => ErrorSeverity::Internal,
            Self::UnsupportedVersion { .. } => ErrorSeverity::Fatal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Sqlite(_) => "DB_SQLITE",
            Self::NotFound(_) => "DB_NOT_FOUND",
            Self::Io { .. } => "DB_IO",
            Self::Json { .. } => "DB_JSON",
            Self::Schema { .. } => "DB_SCHEMA",
            Self::Encode(_) => "DB_ENCODE",
            Self::UnsupportedVersion { .. } => "DB_UNSUPPORTED_VERSION",
        }
    }
}

/// A raw row: record id and its JSON text.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredRow {
    pub id: String,
    pub data: String,
}

/// Connection to the content database.
pub struct ContentDb {
    conn: Connection,
    location: String,
}

impl ContentDb {
    /// Opens (creating if needed) a database file and ensures the schema.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, DatabaseError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| DatabaseError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let db = Self {
            conn: Connection::open(path)?,
            location: path.display().to_string(),
        };
        db.initialize()?;
        tracing::debug!(path = %db.location, "content database opened");
        Ok(db)
    }

    /// Opens an existing database read-only. Never creates a file.
    pub fn open_existing(path: impl AsRef<Path>) -> Result<Self, DatabaseError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(DatabaseError::NotFound(path.to_path_buf()));
        }
        let db = Self {
            conn: Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)?,
            location: path.display().to_string(),
        };
        db.check_version()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self, DatabaseError> {
        let db = Self {
            conn: Connection::open_in_memory()?,
            location: ":memory:".to_owned(),
        };
        db.initialize()?;
        Ok(db)
    }

    pub fn location(&self) -> &str {
        &self.location
    }

    fn initialize(&self) -> Result<(), DatabaseError> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY,
                applied_at TEXT NOT NULL
            );",
        )?;
        for table in CONTENT_TABLES {
            self.conn.execute_batch(&format!(
                "CREATE TABLE IF NOT EXISTS {table} (
                    id TEXT PRIMARY KEY,
                    name TEXT NOT NULL,
                    data TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );"
            ))?;
        }

        match self.check_version()? {
            Some(_) => {}
            None => {
                self.conn.execute(
                    "INSERT INTO schema_version (version, applied_at) VALUES (?1, ?2)",
                    params![SCHEMA_VERSION, chrono::Utc::now().to_rfc3339()],
                )?;
            }
        }
        Ok(())
    }

    fn check_version(&self) -> Result<Option<i64>, DatabaseError> {
        let version = self.schema_version()?;
        if let Some(found) = version.filter(|v| *v > SCHEMA_VERSION) {
            return Err(DatabaseError::UnsupportedVersion {
                found,
                supported: SCHEMA_VERSION,
            });
        }
        Ok(version)
    }

    /// Highest applied schema version, if any.
    pub fn schema_version(&self) -> Result<Option<i64>, DatabaseError> {
        let version = self
            .conn
            .query_row("SELECT MAX(version) FROM schema_version", [], |row| {
                row.get::<_, Option<i64>>(0)
            })?;
        Ok(version)
    }

    /// Inserts or replaces a record. An existing row keeps its position.
    pub fn upsert<T: ContentRecord>(&self, record: &T) -> Result<(), DatabaseError> {
        upsert_with(&self.conn, record)
    }

    pub fn get<T: ContentRecord>(&self, id: &str) -> Result<Option<T>, DatabaseError> {
        let data: Option<String> = self
            .conn
            .query_row(
                &format!("SELECT data FROM {} WHERE id = ?1", T::COLLECTION),
                params![id],
                |row| row.get(0),
            )
            .optional()?;

        data.map(|data| {
            decode::<T>(&StoredRow {
                id: id.to_owned(),
                data,
            })
        })
        .transpose()
    }

    /// Every record of kind `T` in insertion order.
    pub fn all<T: ContentRecord>(&self) -> Result<Vec<T>, DatabaseError> {
        self.rows::<T>()?.iter().map(decode::<T>).collect()
    }

    /// Raw rows of kind `T` in insertion order, without decoding.
    pub fn rows<T: ContentRecord>(&self) -> Result<Vec<StoredRow>, DatabaseError> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT id, data FROM {} ORDER BY rowid",
            T::COLLECTION
        ))?;
        let rows = stmt.query_map([], |row| {
            Ok(StoredRow {
                id: row.get(0)?,
                data: row.get(1)?,
            })
        })?;

        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Removes a record. Returns true if a row was deleted.
    pub fn delete<T: ContentRecord>(&self, id: &str) -> Result<bool, DatabaseError> {
        let changed = self.conn.execute(
            &format!("DELETE FROM {} WHERE id = ?1", T::COLLECTION),
            params![id],
        )?;
        Ok(changed > 0)
    }

    pub fn count<T: ContentRecord>(&self) -> Result<usize, DatabaseError> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {}", T::COLLECTION),
            [],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// Runs `PRAGMA integrity_check`; true when SQLite reports `ok`.
    pub fn integrity_check(&self) -> Result<bool, DatabaseError> {
        let result: String = self
            .conn
            .query_row("PRAGMA integrity_check", [], |row| row.get(0))?;
        Ok(result == "ok")
    }

    /// Writes a compacted copy of the database to `dest`.
    ///
    /// `dest` must not exist yet.
    pub fn backup_to(&self, dest: impl AsRef<Path>) -> Result<(), DatabaseError> {
        let dest = dest.as_ref();
        self.conn
            .execute("VACUUM INTO ?1", params![dest.display().to_string()])?;
        tracing::info!(from = %self.location, to = %dest.display(), "content database backed up");
        Ok(())
    }

    pub fn transaction(&mut self) -> Result<Transaction<'_>, DatabaseError> {
        Ok(self.conn.transaction()?)
    }
}

pub(crate) fn upsert_with<T: ContentRecord>(
    conn: &Connection,
    record: &T,
) -> Result<(), DatabaseError> {
    let data = record.to_json().map_err(DatabaseError::Encode)?.to_string();
    conn.execute(
        &format!(
            "INSERT INTO {} (id, name, data, updated_at) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                data = excluded.data,
                updated_at = excluded.updated_at",
            T::COLLECTION
        ),
        params![record.id(), record.name(), data, chrono::Utc::now().to_rfc3339()],
    )?;
    Ok(())
}

pub(crate) fn decode<T: ContentRecord>(row: &StoredRow) -> Result<T, DatabaseError> {
    let value: serde_json::Value =
        serde_json::from_str(&row.data).map_err(|source| DatabaseError::Json {
            table: T::COLLECTION,
            id: row.id.clone(),
            source,
        })?;
    T::from_json(value).map_err(|source| DatabaseError::Schema {
        table: T::COLLECTION,
        id: row.id.clone(),
        source,
    })
}
