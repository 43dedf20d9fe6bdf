//! Splitting a parsed JSON document into record entries.
//!
//! Content files come in three shapes:
//!
//! ```text
//! { "id": "imp", ... }                          single record
//! [ { "id": "imp" }, { "id": "wraith" } ]       array of records
//! { "enemies": [ {..}, {..} ], "boss": {..} }   object of arrays / objects
//! ```
//!
//! In the third shape each array element or nested object is one entry; other
//! values (strings, numbers) are ignored so files can carry metadata keys.

use serde_json::Value;

/// One candidate record plus where it came from inside its document.
#[derive(Clone, Debug, PartialEq)]
pub struct RawEntry {
    /// JSON-pointer style location, e.g. `"/"`, `"/3"`, `"/enemies/0"`.
    pub location: String,
    pub value: Value,
}

impl RawEntry {
    fn new(location: String, value: Value) -> Self {
        Self { location, value }
    }
}

/// Splits a document into entries. Returns `Err` with a reason when the
/// document root is neither an object nor an array.
pub fn split_document(document: Value) -> Result<Vec<RawEntry>, String> {
    match document {
        Value::Object(map) if map.contains_key("id") => {
            Ok(vec![RawEntry::new("/".to_owned(), Value::Object(map))])
        }
        Value::Object(map) => {
            let mut entries = Vec::new();
            for (key, value) in map {
                match value {
                    Value::Array(items) => entries.extend(
                        items
                            .into_iter()
                            .enumerate()
                            .map(|(i, item)| RawEntry::new(format!("/{key}/{i}"), item)),
                    ),
                    Value::Object(_) => entries.push(RawEntry::new(format!("/{key}"), value)),
                    _ => {}
                }
            }
            Ok(entries)
        }
        Value::Array(items) => Ok(items
            .into_iter()
            .enumerate()
            .map(|(i, item)| RawEntry::new(format!("/{i}"), item))
            .collect()),
        other => Err(format!(
            "document root is a {}, expected an object or array",
            crate::FieldKind::describe(&other)
        )),
    }
}
