//! Schema-checked decoding of content records.
//!
//! Every record kind declares its fields up front. An entry is checked against
//! that table before serde sees it, so a file with `"max_stacks": "three"`
//! fails with a field-level message instead of a generic decode error.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use game_core::{
    AbilityDef, BuffDef, EntityTemplate, ModifierRecord, StatusEffectDef,
};

use crate::error::{FieldKind, SchemaError};

/// One entry in a record schema.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

impl FieldSpec {
    pub const fn required(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: true,
        }
    }

    pub const fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: false,
        }
    }
}

/// A content record that can be loaded into a registry.
pub trait ContentRecord: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// Singular name used in logs and signals (`"modifier"`).
    const KIND: &'static str;

    /// Data sub-directory and database table (`"modifiers"`).
    const COLLECTION: &'static str;

    /// Declared fields. Unknown fields are ignored.
    const FIELDS: &'static [FieldSpec];

    fn id(&self) -> &str;

    fn name(&self) -> &str;

    /// Semantic checks that serde cannot express.
    fn validate(&self) -> Result<(), SchemaError> {
        Ok(())
    }

    /// Fills derived fields after a successful decode.
    fn normalize(&mut self) {}

    /// Checks, decodes, validates, and normalizes one JSON entry.
    fn from_json(value: Value) -> Result<Self, SchemaError> {
        let fields = check_fields(value, Self::FIELDS)?;
        let mut record: Self = serde_json::from_value(Value::Object(fields))
            .map_err(|e| SchemaError::Decode(e.to_string()))?;
        if record.id().trim().is_empty() {
            return Err(SchemaError::InvalidValue {
                field: "id",
                reason: "must not be empty".to_owned(),
            });
        }
        record.validate()?;
        record.normalize();
        Ok(record)
    }

    fn to_json(&self) -> Result<Value, SchemaError> {
        serde_json::to_value(self).map_err(|e| SchemaError::Decode(e.to_string()))
    }
}

/// Checks `value` against `fields` and returns its object map.
///
/// Optional fields set to `null` are dropped so serde falls back to their
/// defaults.
pub fn check_fields(value: Value, fields: &[FieldSpec]) -> Result<Map<String, Value>, SchemaError> {
    let mut map = match value {
        Value::Object(map) => map,
        other => {
            return Err(SchemaError::NotAnObject {
                found: FieldKind::describe(&other),
            });
        }
    };

    for spec in fields {
        match map.get(spec.name) {
            None if spec.required => {
                return Err(SchemaError::MissingField { field: spec.name });
            }
            None => {}
            Some(Value::Null) if !spec.required => {
                map.remove(spec.name);
            }
            Some(found) if !spec.kind.matches(found) => {
                return Err(SchemaError::WrongType {
                    field: spec.name,
                    expected: spec.kind,
                    found: FieldKind::describe(found),
                });
            }
            Some(_) => {}
        }
    }
    Ok(map)
}

fn invalid(field: &'static str, reason: impl Into<String>) -> SchemaError {
    SchemaError::InvalidValue {
        field,
        reason: reason.into(),
    }
}

impl ContentRecord for ModifierRecord {
    const KIND: &'static str = "modifier";
    const COLLECTION: &'static str = "modifiers";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required("id", FieldKind::String),
        FieldSpec::required("name", FieldKind::String),
        FieldSpec::optional("description", FieldKind::String),
        FieldSpec::required("type", FieldKind::String),
        FieldSpec::optional("rarity", FieldKind::String),
        FieldSpec::optional("stat_modifiers", FieldKind::Object),
        FieldSpec::optional("special_effects", FieldKind::Array),
        FieldSpec::optional("restrictions", FieldKind::Array),
        FieldSpec::optional("weight", FieldKind::Integer),
    ];

    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.display_name
    }

    fn validate(&self) -> Result<(), SchemaError> {
        if self.selection_weight == Some(0) {
            return Err(invalid("weight", "must be a positive integer"));
        }
        Ok(())
    }
}

impl ContentRecord for StatusEffectDef {
    const KIND: &'static str = "status_effect";
    const COLLECTION: &'static str = "status_effects";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required("id", FieldKind::String),
        FieldSpec::required("name", FieldKind::String),
        FieldSpec::optional("description", FieldKind::String),
        FieldSpec::optional("default_duration", FieldKind::Integer),
        FieldSpec::optional("max_stacks", FieldKind::Integer),
        FieldSpec::optional("conflicts", FieldKind::Array),
        FieldSpec::optional("stat_changes", FieldKind::Object),
        FieldSpec::optional("duration_hours", FieldKind::Integer),
        FieldSpec::optional("duration_minutes", FieldKind::Integer),
        FieldSpec::optional("effect_type", FieldKind::String),
        FieldSpec::optional("damage_over_time", FieldKind::Integer),
        FieldSpec::optional("removable", FieldKind::Bool),
        FieldSpec::optional("display_name", FieldKind::String),
    ];

    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn validate(&self) -> Result<(), SchemaError> {
        if self.max_stacks == 0 {
            return Err(invalid("max_stacks", "must be at least 1"));
        }
        Ok(())
    }

    fn normalize(&mut self) {
        if self.display_name.is_empty() {
            self.display_name = self.label();
        }
    }
}

impl ContentRecord for BuffDef {
    const KIND: &'static str = "buff";
    const COLLECTION: &'static str = "buffs";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required("id", FieldKind::String),
        FieldSpec::required("name", FieldKind::String),
        FieldSpec::required("description", FieldKind::String),
        FieldSpec::required("stat_modifiers", FieldKind::Object),
        FieldSpec::optional("default_duration", FieldKind::Integer),
        FieldSpec::optional("max_stacks", FieldKind::Integer),
        FieldSpec::optional("buff_type", FieldKind::String),
        FieldSpec::optional("is_permanent", FieldKind::Bool),
        FieldSpec::optional("display_name", FieldKind::String),
        FieldSpec::optional("effect_type", FieldKind::String),
        FieldSpec::optional("stacks", FieldKind::Bool),
        FieldSpec::optional("conflicts", FieldKind::Array),
        FieldSpec::optional("visual_indicator", FieldKind::String),
    ];

    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn validate(&self) -> Result<(), SchemaError> {
        if self.max_stacks == 0 {
            return Err(invalid("max_stacks", "must be at least 1"));
        }
        Ok(())
    }

    fn normalize(&mut self) {
        BuffDef::normalize(self);
    }
}

impl ContentRecord for AbilityDef {
    const KIND: &'static str = "ability";
    const COLLECTION: &'static str = "abilities";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required("id", FieldKind::String),
        FieldSpec::required("name", FieldKind::String),
        FieldSpec::optional("description", FieldKind::String),
        FieldSpec::required("type", FieldKind::String),
        FieldSpec::optional("damage_type", FieldKind::String),
        FieldSpec::optional("cost", FieldKind::Object),
        FieldSpec::optional("cooldown", FieldKind::Integer),
        FieldSpec::optional("range", FieldKind::Integer),
        FieldSpec::required("targeting", FieldKind::String),
        FieldSpec::optional("effects", FieldKind::Object),
        FieldSpec::optional("animation", FieldKind::String),
        FieldSpec::optional("sound", FieldKind::String),
    ];

    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn validate(&self) -> Result<(), SchemaError> {
        let chance = self.effects.critical_chance;
        if !(0.0..=1.0).contains(&chance) {
            return Err(invalid("effects.critical_chance", "must be within [0, 1]"));
        }
        Ok(())
    }
}

impl ContentRecord for EntityTemplate {
    const KIND: &'static str = "entity";
    const COLLECTION: &'static str = "entities";
    const FIELDS: &'static [FieldSpec] = &[
        FieldSpec::required("id", FieldKind::String),
        FieldSpec::required("name", FieldKind::String),
        FieldSpec::required("description", FieldKind::String),
        FieldSpec::required("entity_type", FieldKind::String),
        FieldSpec::optional("base_health", FieldKind::Integer),
        FieldSpec::optional("base_attack", FieldKind::Integer),
        FieldSpec::optional("base_defense", FieldKind::Integer),
        FieldSpec::optional("base_speed", FieldKind::Integer),
        FieldSpec::optional("base_mana", FieldKind::Integer),
        FieldSpec::optional("flee_chance", FieldKind::Number),
        FieldSpec::optional("is_boss", FieldKind::Bool),
        FieldSpec::optional("is_elite", FieldKind::Bool),
        FieldSpec::optional("immunities", FieldKind::Array),
    ];

    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn validate(&self) -> Result<(), SchemaError> {
        if !(0.0..=1.0).contains(&self.flee_chance) {
            return Err(invalid("flee_chance", "must be within [0, 1]"));
        }
        Ok(())
    }
}
