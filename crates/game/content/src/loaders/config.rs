//! Game configuration loader.

use std::path::Path;

use game_core::GameConfig;

use crate::loaders::{LoadResult, read_file};

/// Loader for game configuration from TOML files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load config data from a TOML file.
    ///
    /// Keys absent from the file keep their defaults.
    pub fn load(path: &Path) -> LoadResult<GameConfig> {
        let content = read_file(path)?;
        Self::parse(&content)
    }

    /// Like [`ConfigLoader::load`], but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> LoadResult<GameConfig> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "no config file, using defaults");
            return Ok(GameConfig::default());
        }
        Self::load(path)
    }

    pub fn parse(content: &str) -> LoadResult<GameConfig> {
        let config: GameConfig = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config TOML: {}", e))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config = ConfigLoader::parse(
            r#"
            signal_history = 50

            [variants]
            base_chance = 0.5
            "#,
        )
        .unwrap();
        assert_eq!(config.signal_history, 50);
        assert_eq!(config.variants.base_chance, 0.5);
        assert_eq!(config.variants.max_suffixes, 2);
        assert_eq!(config.rarity_weights.common, 100);
        assert!(config.recursive_scan);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = ConfigLoader::load_or_default(&dir.path().join("config.toml")).unwrap();
        assert_eq!(config, GameConfig::default());
        assert!(ConfigLoader::load(&dir.path().join("config.toml")).is_err());
    }

    #[test]
    fn malformed_file_is_an_error() {
        assert!(ConfigLoader::parse("signal_history = \"lots\"").is_err());
    }
}
