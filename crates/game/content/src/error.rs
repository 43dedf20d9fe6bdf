//! Error types for content loading.

use std::fmt;
use std::path::PathBuf;

use game_core::{ErrorSeverity, GameError};

/// JSON value categories used by record schemas.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Integer,
    Number,
    Bool,
    Array,
    Object,
}

impl FieldKind {
    /// Name of the JSON category `value` belongs to.
    pub fn describe(value: &serde_json::Value) -> &'static str {
        use serde_json::Value;
        match value {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Object(_) => "object",
        }
    }

    pub fn matches(self, value: &serde_json::Value) -> bool {
        use serde_json::Value;
        match (self, value) {
            (Self::String, Value::String(_)) => true,
            (Self::Integer, Value::Number(n)) => n.is_i64() || n.is_u64(),
            (Self::Number, Value::Number(_)) => true,
            (Self::Bool, Value::Bool(_)) => true,
            (Self::Array, Value::Array(_)) => true,
            (Self::Object, Value::Object(_)) => true,
            _ => false,
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Number => "number",
            Self::Bool => "bool",
            Self::Array => "array",
            Self::Object => "object",
        };
        f.write_str(name)
    }
}

/// A single record failed its schema.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SchemaError {
    #[error("entry is a {found}, expected an object")]
    NotAnObject { found: &'static str },

    #[error("missing required field `{field}`")]
    MissingField { field: &'static str },

    #[error("field `{field}` must be {expected}, found {found}")]
    WrongType {
        field: &'static str,
        expected: FieldKind,
        found: &'static str,
    },

    #[error("field `{field}` is invalid: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to decode record: {0}")]
    Decode(String),
}

impl GameError for SchemaError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::NotAnObject { .. } => "SCHEMA_NOT_AN_OBJECT",
            Self::MissingField { .. } => "SCHEMA_MISSING_FIELD",
            Self::WrongType { .. } => "SCHEMA_WRONG_TYPE",
            Self::InvalidValue { .. } => "SCHEMA_INVALID_VALUE",
            Self::Decode(_) => "SCHEMA_DECODE",
        }
    }
}

/// Errors raised while reading a content source.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("content directory not found: {}", .0.display())]
    MissingDirectory(PathBuf),

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse JSON in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("unsupported document shape in {}: {reason}", .path.display())]
    Shape { path: PathBuf, reason: String },

    #[error("invalid record at {origin}: {source}")]
    Schema {
        origin: String,
        #[source]
        source: SchemaError,
    },

    #[error("failed to walk content directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    Database(#[from] crate::sqlite::DatabaseError),
}

impl GameError for LoadError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Json { .. } | Self::Shape { .. } | Self::Schema { .. } => {
                ErrorSeverity::Validation
            }
            Self::MissingDirectory(_) | Self::Io { .. } | Self::Walk(_) => {
                ErrorSeverity::Recoverable
            }
            #[cfg(feature = "sqlite")]
            Self::Database(_) => ErrorSeverity::Recoverable,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::MissingDirectory(_) => "LOAD_MISSING_DIRECTORY",
            Self::Io { .. } => "LOAD_IO",
            Self::Json { .. } => "LOAD_JSON",
            Self::Shape { .. } => "LOAD_SHAPE",
            Self::Schema { .. } => "LOAD_SCHEMA",
            Self::Walk(_) => "LOAD_WALK",
            #[cfg(feature = "sqlite")]
            Self::Database(_) => "LOAD_DATABASE",
        }
    }
}
