//! Client configuration read from the process environment.
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

/// Where registries load their content from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, strum::Display, strum::EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Backend {
    /// JSON documents under the data directory.
    #[default]
    Json,
    /// The SQLite content mirror.
    Sqlite,
}

/// Settings for one client run.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub data_dir: PathBuf,
    pub backend: Backend,
    /// Database file for the SQLite backend.
    pub db_path: PathBuf,
    /// Copy the JSON data directory into the database before loading.
    pub migrate: bool,
    /// Seed for variant and combat rolls; derived from the clock when unset.
    pub seed: Option<u64>,
    pub session_id: Option<String>,
    /// Root of per-session log directories; platform cache dir when unset.
    pub log_dir: Option<PathBuf>,
    pub log_to_stderr: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        let data_dir = PathBuf::from("data");
        Self {
            db_path: data_dir.join("content.db"),
            data_dir,
            backend: Backend::default(),
            migrate: false,
            seed: None,
            session_id: None,
            log_dir: None,
            log_to_stderr: false,
        }
    }
}

impl ClientConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `DIVINITY_DATA_DIR` - Content data directory (default: `data`)
    /// - `DIVINITY_BACKEND` - `json` or `sqlite` (default: `json`)
    /// - `DIVINITY_DB_PATH` - SQLite file (default: `<data_dir>/content.db`)
    /// - `DIVINITY_MIGRATE` - Migrate JSON into the database first (default: false)
    /// - `DIVINITY_SEED` - RNG seed (default: current time)
    /// - `GAME_SESSION_ID` - Session identifier for log files (default: auto-generated)
    /// - `DIVINITY_LOG_DIR` - Log root (default: platform-specific)
    /// - `DIVINITY_LOG_STDERR` - Also log to stderr (default: false)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`Self::from_env`], reading values through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(dir) = lookup("DIVINITY_DATA_DIR") {
            config.data_dir = PathBuf::from(dir);
            config.db_path = config.data_dir.join("content.db");
        }
        if let Some(path) = lookup("DIVINITY_DB_PATH") {
            config.db_path = PathBuf::from(path);
        }

        if let Some(raw) = lookup("DIVINITY_BACKEND") {
            match raw.parse() {
                Ok(backend) => config.backend = backend,
                Err(_) => tracing::warn!(value = %raw, "unknown DIVINITY_BACKEND, using json"),
            }
        }

        config.migrate = read_flag(&lookup, "DIVINITY_MIGRATE");
        config.log_to_stderr = read_flag(&lookup, "DIVINITY_LOG_STDERR");
        config.seed = read_parsed(&lookup, "DIVINITY_SEED");
        config.session_id = lookup("GAME_SESSION_ID").filter(|id| !id.is_empty());
        config.log_dir = lookup("DIVINITY_LOG_DIR").map(PathBuf::from);

        config
    }

    /// The configured seed, or one taken from the system clock.
    pub fn seed_or_clock(&self) -> u64 {
        self.seed.unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|elapsed| elapsed.as_secs())
                .unwrap_or_default()
        })
    }
}

fn read_parsed<F, T>(lookup: &F, key: &str) -> Option<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    lookup(key)?.trim().parse().ok()
}

/// `true`/`false` values, `1`/`0`, or a bare variable with no value as true.
fn read_flag<F>(lookup: &F, key: &str) -> bool
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) if raw.trim().is_empty() => true,
        Some(raw) => match raw.trim() {
            "1" => true,
            "0" => false,
            other => other.parse().unwrap_or(false),
        },
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> ClientConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ClientConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_without_environment() {
        let config = config(&[]);
        assert_eq!(config.backend, Backend::Json);
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.db_path, PathBuf::from("data/content.db"));
        assert!(!config.migrate);
        assert!(config.seed.is_none());
    }

    #[test]
    fn reads_every_variable() {
        let config = config(&[
            ("DIVINITY_DATA_DIR", "/srv/content"),
            ("DIVINITY_BACKEND", "SQLite"),
            ("DIVINITY_MIGRATE", "1"),
            ("DIVINITY_SEED", " 42 "),
            ("GAME_SESSION_ID", "night-one"),
            ("DIVINITY_LOG_DIR", "/tmp/logs"),
            ("DIVINITY_LOG_STDERR", ""),
        ]);
        assert_eq!(config.backend, Backend::Sqlite);
        assert_eq!(config.db_path, PathBuf::from("/srv/content/content.db"));
        assert!(config.migrate);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.seed_or_clock(), 42);
        assert_eq!(config.session_id.as_deref(), Some("night-one"));
        assert_eq!(config.log_dir, Some(PathBuf::from("/tmp/logs")));
        assert!(config.log_to_stderr);
    }

    #[test]
    fn explicit_db_path_wins_and_bad_values_fall_back() {
        let config = config(&[
            ("DIVINITY_DATA_DIR", "content"),
            ("DIVINITY_DB_PATH", "mirror.db"),
            ("DIVINITY_BACKEND", "postgres"),
            ("DIVINITY_SEED", "soon"),
            ("DIVINITY_MIGRATE", "false"),
        ]);
        assert_eq!(config.db_path, PathBuf::from("mirror.db"));
        assert_eq!(config.backend, Backend::Json);
        assert!(config.seed.is_none());
        assert!(!config.migrate);
    }
}
