//! Signal kinds and published records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Every event kind the bus routes.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum Signal {
    // Content
    RegistryInitialized,
    RegistryReloaded,
    RegistryError,
    DatabaseInitialized,
    DatabaseError,

    // Combat
    CombatStarted,
    CombatEnded,
    TurnStarted,
    TurnEnded,
    EntityHpChanged,
    EntityDied,
    AbilityUsed,
    StatusApplied,
    StatusRemoved,
    StatusTick,
}

impl Signal {
    pub fn is_content(self) -> bool {
        matches!(
            self,
            Self::RegistryInitialized
                | Self::RegistryReloaded
                | Self::RegistryError
                | Self::DatabaseInitialized
                | Self::DatabaseError
        )
    }
}

/// One published signal, as handlers and the history see it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SignalRecord {
    /// Monotonic per bus, starting at 1.
    pub seq: u64,
    pub signal: Signal,
    /// Publisher label (`"registry:modifiers"`, `"battle"`).
    pub source: String,
    pub payload: Value,
    pub timestamp: DateTime<Utc>,
}

impl SignalRecord {
    /// Reads a string field of the payload.
    pub fn str_field(&self, key: &str) -> Option<&str> {
        self.payload.get(key).and_then(Value::as_str)
    }

    /// Reads an integer field of the payload.
    pub fn int_field(&self, key: &str) -> Option<i64> {
        self.payload.get(key).and_then(Value::as_i64)
    }
}
