//! SQLite content mirror.
//!
//! The database stores each record kind in its own table as a JSON blob keyed
//! by record id. It is an alternate registry source: a registry loaded through
//! [`SqliteSource`] behaves exactly like one loaded from JSON files.

mod db;
mod migrator;
mod source;

pub use db::{ContentDb, DatabaseError, SCHEMA_VERSION, StoredRow};
pub use migrator::{JsonExporter, JsonMigrator, MigrationReport};
pub use source::SqliteSource;
