//! Content sources: where registry records come from.
//!
//! A [`ContentSource`] produces a [`SourceBatch`]: the records that decoded
//! cleanly, plus an issue for every file or entry that did not. Per-file and
//! per-record problems never fail the whole fetch; only a source that cannot
//! be read at all (missing directory, unopenable database) returns `Err`.

use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::document::split_document;
use crate::error::LoadError;
use crate::record::ContentRecord;

/// A record together with where it was read from.
#[derive(Clone, Debug)]
pub struct SourcedRecord<T> {
    pub record: T,
    /// `path#/location` for files, `table/id` for databases.
    pub origin: String,
}

/// A file or entry that was skipped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoadIssue {
    pub origin: String,
    pub message: String,
}

impl LoadIssue {
    pub fn new(origin: impl Into<String>, message: impl ToString) -> Self {
        Self {
            origin: origin.into(),
            message: message.to_string(),
        }
    }
}

/// Everything one fetch produced.
#[derive(Clone, Debug)]
pub struct SourceBatch<T> {
    /// Records in source order.
    pub records: Vec<SourcedRecord<T>>,
    pub issues: Vec<LoadIssue>,
    /// Files (or tables) examined.
    pub units_scanned: usize,
}

impl<T> Default for SourceBatch<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            issues: Vec::new(),
            units_scanned: 0,
        }
    }
}

/// Backing store for a registry.
pub trait ContentSource<T>: Send + Sync {
    /// Human-readable location, used in logs and signals.
    fn describe(&self) -> String;

    /// Reads every record currently in the source.
    fn fetch(&self) -> Result<SourceBatch<T>, LoadError>;
}

/// Whether a directory scan descends into sub-directories.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScanMode {
    /// Only files directly inside the directory.
    Flat,
    #[default]
    Recursive,
}

impl ScanMode {
    pub fn from_recursive(recursive: bool) -> Self {
        if recursive { Self::Recursive } else { Self::Flat }
    }
}

/// Reads `*.json` files from a directory.
///
/// Files are visited in file-name order within each directory, so when two
/// files declare the same id the later name wins deterministically.
pub struct JsonDirectorySource<T> {
    root: PathBuf,
    scan: ScanMode,
    _record: PhantomData<fn() -> T>,
}

impl<T: ContentRecord> JsonDirectorySource<T> {
    pub fn new(root: impl Into<PathBuf>, scan: ScanMode) -> Self {
        Self {
            root: root.into(),
            scan,
            _record: PhantomData,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn scan(&self) -> ScanMode {
        self.scan
    }

    /// Paths of the JSON files a fetch would read, in visit order.
    pub fn files(&self) -> Result<Vec<PathBuf>, LoadError> {
        if !self.root.is_dir() {
            return Err(LoadError::MissingDirectory(self.root.clone()));
        }

        let mut walker = WalkDir::new(&self.root).min_depth(1).sort_by_file_name();
        if self.scan == ScanMode::Flat {
            walker = walker.max_depth(1);
        }

        let mut files = Vec::new();
        for entry in walker {
            let entry = entry?;
            if entry.file_type().is_file() && is_json(entry.path()) {
                files.push(entry.into_path());
            }
        }
        Ok(files)
    }

    fn read_file_into(&self, path: &Path, batch: &mut SourceBatch<T>) -> Result<(), LoadError> {
        let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let document: serde_json::Value =
            serde_json::from_str(&text).map_err(|source| LoadError::Json {
                path: path.to_path_buf(),
                source,
            })?;
        let entries = split_document(document).map_err(|reason| LoadError::Shape {
            path: path.to_path_buf(),
            reason,
        })?;

        for entry in entries {
            let origin = format!("{}#{}", path.display(), entry.location);
            match T::from_json(entry.value) {
                Ok(record) => batch.records.push(SourcedRecord { record, origin }),
                Err(source) => batch
                    .issues
                    .push(LoadIssue::new(origin.clone(), LoadError::Schema { origin, source })),
            }
        }
        Ok(())
    }
}

impl<T: ContentRecord> ContentSource<T> for JsonDirectorySource<T> {
    fn describe(&self) -> String {
        self.root.display().to_string()
    }

    fn fetch(&self) -> Result<SourceBatch<T>, LoadError> {
        let files = self.files()?;
        tracing::debug!(
            kind = T::KIND,
            root = %self.root.display(),
            files = files.len(),
            "scanning content directory"
        );

        let mut batch = SourceBatch::default();
        for path in files {
            batch.units_scanned += 1;
            if let Err(err) = self.read_file_into(&path, &mut batch) {
                batch
                    .issues
                    .push(LoadIssue::new(path.display().to_string(), err));
            }
        }
        Ok(batch)
    }
}

/// Records held in memory; every fetch returns a copy of them.
pub struct MemorySource<T> {
    label: String,
    records: Vec<T>,
}

impl<T: ContentRecord> MemorySource<T> {
    pub fn new(label: impl Into<String>, records: Vec<T>) -> Self {
        Self {
            label: label.into(),
            records,
        }
    }
}

impl<T: ContentRecord> ContentSource<T> for MemorySource<T> {
    fn describe(&self) -> String {
        self.label.clone()
    }

    fn fetch(&self) -> Result<SourceBatch<T>, LoadError> {
        let records = self
            .records
            .iter()
            .enumerate()
            .map(|(i, record)| SourcedRecord {
                record: record.clone(),
                origin: format!("{}#/{i}", self.label),
            })
            .collect();
        Ok(SourceBatch {
            records,
            issues: Vec::new(),
            units_scanned: 1,
        })
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use game_core::ModifierRecord;
    use tempfile::TempDir;

    use super::*;

    fn write(dir: &Path, name: &str, body: &str) {
        if let Some(parent) = dir.join(name).parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(dir.join(name), body).unwrap();
    }

    fn ids(batch: &SourceBatch<ModifierRecord>) -> Vec<&str> {
        batch.records.iter().map(|r| r.record.id.as_str()).collect()
    }

    #[test]
    fn missing_directory_is_an_error() {
        let source = JsonDirectorySource::<ModifierRecord>::new("/definitely/not/here", ScanMode::Flat);
        assert!(matches!(source.fetch(), Err(LoadError::MissingDirectory(_))));
    }

    #[test]
    fn files_are_read_in_name_order_and_bad_files_skipped() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "b.json", r#"{"id": "b", "name": "B", "type": "prefix"}"#);
        write(dir.path(), "a.json", r#"[{"id": "a", "name": "A", "type": "suffix"}]"#);
        write(dir.path(), "broken.json", "{ not json");
        write(dir.path(), "notes.txt", "ignored");

        let source = JsonDirectorySource::<ModifierRecord>::new(dir.path(), ScanMode::Flat);
        let batch = source.fetch().unwrap();

        assert_eq!(ids(&batch), vec!["a", "b"]);
        assert_eq!(batch.units_scanned, 3);
        assert_eq!(batch.issues.len(), 1);
        assert!(batch.issues[0].origin.ends_with("broken.json"));
    }

    #[test]
    fn bad_entries_do_not_drop_their_siblings() {
        let dir = TempDir::new().unwrap();
        write(
            dir.path(),
            "mixed.json",
            r#"[{"id": "ok", "name": "Ok", "type": "prefix"}, {"id": "bad", "name": "Bad"}]"#,
        );

        let source = JsonDirectorySource::<ModifierRecord>::new(dir.path(), ScanMode::Flat);
        let batch = source.fetch().unwrap();

        assert_eq!(ids(&batch), vec!["ok"]);
        assert_eq!(batch.issues.len(), 1);
        assert!(batch.issues[0].origin.ends_with("mixed.json#/1"));
        assert!(batch.issues[0].message.contains("type"));
    }

    #[test]
    fn scan_mode_controls_recursion() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "top.json", r#"{"id": "top", "name": "Top", "type": "prefix"}"#);
        write(dir.path(), "nested/deep.json", r#"{"id": "deep", "name": "Deep", "type": "prefix"}"#);

        let flat = JsonDirectorySource::<ModifierRecord>::new(dir.path(), ScanMode::Flat);
        assert_eq!(ids(&flat.fetch().unwrap()), vec!["top"]);

        let recursive = JsonDirectorySource::<ModifierRecord>::new(dir.path(), ScanMode::Recursive);
        assert_eq!(ids(&recursive.fetch().unwrap()), vec!["deep", "top"]);
    }
}
