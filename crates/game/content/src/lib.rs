//! Data-driven content loading.
//!
//! This crate turns JSON data files (or the SQLite mirror of them) into
//! validated game-core definitions:
//! - Modifiers (prefix/suffix affixes)
//! - Status effects
//! - Buffs
//! - Abilities
//! - Entity templates
//! - Game configuration (TOML)
//!
//! Loading never panics on bad data. Every record is checked against its
//! declared field table, and anything that fails is reported as a
//! [`LoadIssue`] while the rest of the batch loads normally.

pub mod document;
pub mod error;
pub mod loaders;
pub mod record;
pub mod source;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use error::{FieldKind, LoadError, SchemaError};
pub use loaders::{ConfigLoader, ContentFactory, LoadResult};
pub use record::{ContentRecord, FieldSpec, check_fields};
pub use source::{
    ContentSource, JsonDirectorySource, LoadIssue, MemorySource, ScanMode, SourceBatch, SourcedRecord,
};

#[cfg(feature = "sqlite")]
pub use sqlite::{
    ContentDb, DatabaseError, JsonExporter, JsonMigrator, MigrationReport, SqliteSource,
};
