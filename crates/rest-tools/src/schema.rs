//! Resource schemas and payload construction.
//!
//! A [`ResourceSchema`] declares the field shape of one REST resource. The
//! payload builders validate caller input against it and emit the JSON bodies
//! for create and update calls. Unknown input fields are dropped; declared
//! field order is preserved in the emitted objects so serialization stays
//! deterministic.

use crate::error::{Result, ValidationReport};
use serde_json::{Map, Value};

/// Primitive field types a resource can declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Number,
    Boolean,
}

impl FieldType {
    /// JSON Schema type name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
        }
    }

    #[must_use]
    pub fn matches(self, value: &Value) -> bool {
        match self {
            FieldType::String => value.is_string(),
            FieldType::Number => value.is_number(),
            FieldType::Boolean => value.is_boolean(),
        }
    }
}

/// JSON type name of a value, for validation messages.
#[must_use]
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// One declared field of a resource.
#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: String,
    pub required: bool,
    pub field_type: FieldType,
}

impl FieldSpec {
    #[must_use]
    pub fn required(name: &str, field_type: FieldType) -> Self {
        Self {
            name: name.to_string(),
            required: true,
            field_type,
        }
    }

    #[must_use]
    pub fn optional(name: &str, field_type: FieldType) -> Self {
        Self {
            name: name.to_string(),
            required: false,
            field_type,
        }
    }
}

/// A relation listing hung off a resource (e.g. "authors of a book").
#[derive(Debug, Clone)]
pub struct RelationSpec {
    /// Singular name of the related resource, used in the tool name.
    pub via: String,
    /// Path parameter name, e.g. `idBook`.
    pub parameter: String,
    /// Full path template containing `{parameter}`.
    pub path_template: String,
    pub description: String,
}

/// Declared field shape + routing for one resource type.
#[derive(Debug, Clone)]
pub struct ResourceSchema {
    /// Display name, e.g. "Book".
    pub display_name: String,
    /// Singular snake_case name, e.g. "book".
    pub singular: String,
    /// Plural snake_case name, e.g. "books".
    pub plural: String,
    /// Collection path, e.g. "/api/v1/Books".
    pub collection_path: String,
    /// Name of the identifier field; must appear in `fields`.
    pub id_field: String,
    /// Fields in declared order.
    pub fields: Vec<FieldSpec>,
    /// Optional relation listing.
    pub relation: Option<RelationSpec>,
}

impl ResourceSchema {
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Build the JSON body for a create call.
    ///
    /// Checks all `required` fields are present and type-correct, validates
    /// optional fields when supplied, drops fields not in the schema, and
    /// preserves declared field order. All problems are reported in one
    /// `ValidationError`.
    ///
    /// # Errors
    ///
    /// Returns `RestToolsError::Validation` enumerating every missing or
    /// mistyped field.
    pub fn build_create_payload(&self, input: &Map<String, Value>) -> Result<Value> {
        let mut report = ValidationReport::default();
        let mut out = Map::new();

        for f in &self.fields {
            // Explicit null counts as absent.
            let value = match input.get(&f.name) {
                Some(Value::Null) | None => None,
                Some(v) => Some(v),
            };
            match value {
                Some(v) if f.field_type.matches(v) => {
                    out.insert(f.name.clone(), v.clone());
                }
                Some(v) => report.wrong_type(&f.name, f.field_type.name(), json_type_name(v)),
                None if f.required => report.missing(&f.name),
                None => {}
            }
        }

        report.into_result()?;
        Ok(Value::Object(out))
    }

    /// Build the JSON body for an update call.
    ///
    /// The payload contains exactly the identifier plus the fields the caller
    /// supplied. Absent optional fields are absent from the payload; nothing
    /// is defaulted or nulled in.
    ///
    /// # Errors
    ///
    /// Returns `RestToolsError::Validation` if the identifier is missing or
    /// any supplied field is mistyped.
    pub fn build_update_payload(&self, input: &Map<String, Value>) -> Result<Value> {
        let mut report = ValidationReport::default();
        let mut out = Map::new();

        for f in &self.fields {
            let value = match input.get(&f.name) {
                Some(Value::Null) | None => None,
                Some(v) => Some(v),
            };
            let is_id = f.name == self.id_field;
            match value {
                Some(v) if f.field_type.matches(v) => {
                    out.insert(f.name.clone(), v.clone());
                }
                Some(v) => report.wrong_type(&f.name, f.field_type.name(), json_type_name(v)),
                None if is_id => report.missing(&f.name),
                None => {}
            }
        }

        report.into_result()?;
        Ok(Value::Object(out))
    }
}
