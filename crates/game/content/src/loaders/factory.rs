//! Content factory for locating data files and building sources.

use std::path::{Path, PathBuf};

use game_core::GameConfig;

use crate::loaders::{ConfigLoader, LoadResult};
use crate::record::ContentRecord;
use crate::source::{JsonDirectorySource, ScanMode};

/// Content factory rooted at a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── config.toml
/// ├── modifiers/
/// ├── status_effects/
/// ├── buffs/
/// ├── abilities/
/// └── entities/
/// ```
///
/// Each sub-directory holds JSON files for one record kind and is named after
/// [`ContentRecord::COLLECTION`].
pub struct ContentFactory {
    data_dir: PathBuf,
}

impl ContentFactory {
    /// Creates a new content factory pointing to a data directory.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Load game configuration from `config.toml`, or defaults if absent.
    pub fn load_config(&self) -> LoadResult<GameConfig> {
        ConfigLoader::load_or_default(&self.config_path())
    }

    pub fn config_path(&self) -> PathBuf {
        self.data_dir.join("config.toml")
    }

    /// Directory holding records of kind `T`.
    pub fn collection_dir<T: ContentRecord>(&self) -> PathBuf {
        self.data_dir.join(T::COLLECTION)
    }

    /// JSON source for records of kind `T`.
    pub fn json_source<T: ContentRecord>(&self, scan: ScanMode) -> JsonDirectorySource<T> {
        JsonDirectorySource::new(self.collection_dir::<T>(), scan)
    }

    /// Returns the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

#[cfg(test)]
mod tests {
    use game_core::{AbilityDef, ModifierRecord};

    use super::*;

    #[test]
    fn test_factory_paths() {
        let factory = ContentFactory::new("/tmp/data");
        assert_eq!(factory.data_dir(), Path::new("/tmp/data"));
        assert_eq!(factory.config_path(), Path::new("/tmp/data/config.toml"));
        assert_eq!(
            factory.collection_dir::<AbilityDef>(),
            Path::new("/tmp/data/abilities")
        );
        assert_eq!(
            factory.json_source::<ModifierRecord>(ScanMode::Flat).root(),
            Path::new("/tmp/data/modifiers")
        );
    }
}
