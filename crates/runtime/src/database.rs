//! Content database bootstrap with signal reporting.

use std::path::Path;

use serde_json::json;

use game_content::{ContentDb, DatabaseError, JsonMigrator, MigrationReport, ScanMode};
use game_core::GameError;

use crate::events::{Signal, SignalBus};

const SOURCE: &str = "database";

/// Opens (creating if needed) the content database at `db_path`, and when
/// `migrate_from` is given, copies that JSON data directory into it first.
///
/// Publishes `DATABASE_INITIALIZED` on success and `DATABASE_ERROR` on
/// failure.
pub fn initialize_database(
    db_path: &Path,
    migrate_from: Option<(&Path, ScanMode)>,
    bus: &SignalBus,
) -> Result<Option<MigrationReport>, DatabaseError> {
    match open_and_migrate(db_path, migrate_from) {
        Ok((version, report)) => {
            bus.publish(
                Signal::DatabaseInitialized,
                SOURCE,
                json!({
                    "path": db_path.display().to_string(),
                    "schema_version": version,
                    "migrated_records": report.as_ref().map(MigrationReport::total),
                    "migration_issues": report.as_ref().map(|r| r.issues.len()),
                }),
            );
            Ok(report)
        }
        Err(err) => {
            tracing::error!(path = %db_path.display(), error = %err, "content database unavailable");
            bus.publish(
                Signal::DatabaseError,
                SOURCE,
                json!({
                    "path": db_path.display().to_string(),
                    "error": err.to_string(),
                    "error_code": err.error_code(),
                }),
            );
            Err(err)
        }
    }
}

fn open_and_migrate(
    db_path: &Path,
    migrate_from: Option<(&Path, ScanMode)>,
) -> Result<(Option<i64>, Option<MigrationReport>), DatabaseError> {
    let mut db = ContentDb::open(db_path)?;
    let report = match migrate_from {
        Some((data_dir, scan)) => Some(JsonMigrator::new(data_dir, scan).migrate(&mut db)?),
        None => None,
    };
    if !db.integrity_check()? {
        tracing::warn!(path = %db_path.display(), "integrity check reported problems");
    }
    Ok((db.schema_version()?, report))
}
