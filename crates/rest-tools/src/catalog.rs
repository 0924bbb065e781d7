//! Tool catalog: one tool per (resource, verb) pair.
//!
//! The catalog is generated once from the resource schema set and the fixed
//! verb set. Adding a resource means adding one [`ResourceSchema`] entry; no
//! new dispatch code. Names, descriptions, and input schemas are all derived
//! mechanically so `describe`/`resolve` stay consistent by construction.

use crate::error::{RestToolsError, Result};
use crate::schema::{FieldType, ResourceSchema};
use reqwest::Method;
use rmcp::model::{JsonObject, Tool};
use serde_json::{Value, json};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// CRUD verbs the catalog knows how to map onto HTTP.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    List,
    Create,
    GetById,
    UpdateById,
    DeleteById,
    ListByRelation,
}

impl Verb {
    /// The fixed verb set applied to every resource. `ListByRelation` is
    /// appended only for resources that declare a relation.
    pub const FIXED: [Verb; 5] = [
        Verb::List,
        Verb::Create,
        Verb::GetById,
        Verb::UpdateById,
        Verb::DeleteById,
    ];

    #[must_use]
    pub fn http_method(self) -> Method {
        match self {
            Verb::List | Verb::GetById | Verb::ListByRelation => Method::GET,
            Verb::Create => Method::POST,
            Verb::UpdateById => Method::PUT,
            Verb::DeleteById => Method::DELETE,
        }
    }
}

/// One (resource, verb) pairing mapped to a concrete HTTP request shape.
#[derive(Debug, Clone)]
pub struct Operation {
    /// Display name of the resource, e.g. "Book".
    pub resource: String,
    pub verb: Verb,
    pub method: Method,
    /// Path template, may contain an `{id}` or relation placeholder.
    pub path_template: String,
}

/// A catalog entry: the exposed tool plus its operation.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub name: String,
    pub description: String,
    pub operation: Operation,
    pub input_schema: Arc<JsonObject>,
    schema_idx: usize,
}

/// Static enumeration of all (resource x verb) tools.
#[derive(Debug)]
pub struct ToolCatalog {
    schemas: Vec<ResourceSchema>,
    entries: Vec<CatalogEntry>,
    by_name: HashMap<String, usize>,
}

impl ToolCatalog {
    /// Build the catalog from a schema set.
    ///
    /// # Errors
    ///
    /// Returns a configuration error on duplicate resource or field names, an
    /// `id_field` missing from the field list, or a relation template that
    /// does not contain its own parameter placeholder.
    pub fn new(schemas: Vec<ResourceSchema>) -> Result<Self> {
        let mut entries = Vec::new();
        let mut by_name: HashMap<String, usize> = HashMap::new();
        let mut resource_names: HashSet<&str> = HashSet::new();

        for (idx, schema) in schemas.iter().enumerate() {
            validate_schema(schema)?;
            if !resource_names.insert(&schema.singular) {
                return Err(RestToolsError::Config(format!(
                    "Duplicate resource name '{}' in catalog",
                    schema.singular
                )));
            }

            let mut verbs: Vec<Verb> = Verb::FIXED.to_vec();
            if schema.relation.is_some() {
                verbs.push(Verb::ListByRelation);
            }

            for verb in verbs {
                let entry = build_entry(schema, verb, idx);
                if by_name.contains_key(&entry.name) {
                    return Err(RestToolsError::Config(format!(
                        "Duplicate tool name '{}' in catalog",
                        entry.name
                    )));
                }
                by_name.insert(entry.name.clone(), entries.len());
                entries.push(entry);
            }
        }

        Ok(Self {
            schemas,
            entries,
            by_name,
        })
    }

    /// Catalog entries in generation order (stable for discovery).
    #[must_use]
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<&CatalogEntry> {
        self.by_name.get(name).map(|&i| &self.entries[i])
    }

    #[must_use]
    pub fn schema_for(&self, entry: &CatalogEntry) -> &ResourceSchema {
        &self.schemas[entry.schema_idx]
    }

    #[must_use]
    pub fn schemas(&self) -> &[ResourceSchema] {
        &self.schemas
    }

    /// The MCP `Tool` descriptors for every catalog entry, in stable order.
    #[must_use]
    pub fn describe(&self) -> Vec<Tool> {
        self.entries
            .iter()
            .map(|e| {
                let mut tool = Tool::new(
                    e.name.clone(),
                    e.description.clone(),
                    Arc::clone(&e.input_schema),
                );
                tool.annotations = Some(crate::semantics::annotations_for_verb(e.operation.verb));
                tool
            })
            .collect()
    }
}

fn validate_schema(schema: &ResourceSchema) -> Result<()> {
    let mut names: HashSet<&str> = HashSet::new();
    for f in &schema.fields {
        if !names.insert(&f.name) {
            return Err(RestToolsError::Config(format!(
                "Duplicate field '{}' in resource '{}'",
                f.name, schema.display_name
            )));
        }
    }
    if schema.field(&schema.id_field).is_none() {
        return Err(RestToolsError::Config(format!(
            "Resource '{}' declares id field '{}' which is not in its field list",
            schema.display_name, schema.id_field
        )));
    }
    if let Some(rel) = &schema.relation {
        let placeholder = format!("{{{}}}", rel.parameter);
        if !rel.path_template.contains(&placeholder) {
            return Err(RestToolsError::Config(format!(
                "Relation template '{}' on resource '{}' is missing placeholder '{placeholder}'",
                rel.path_template, schema.display_name
            )));
        }
    }
    Ok(())
}

fn build_entry(schema: &ResourceSchema, verb: Verb, schema_idx: usize) -> CatalogEntry {
    let (name, description, path_template, input_schema) = match verb {
        Verb::List => (
            format!("list_{}", schema.plural),
            format!("List all {} from the active API", schema.plural),
            schema.collection_path.clone(),
            empty_input_schema(),
        ),
        Verb::Create => (
            format!("create_{}", schema.singular),
            format!("Create a new {}", schema.singular),
            schema.collection_path.clone(),
            fields_input_schema(schema, RequiredFields::Declared),
        ),
        Verb::GetById => (
            format!("get_{}_by_id", schema.singular),
            format!("Fetch a single {} by its id", schema.singular),
            by_id_path(schema),
            id_input_schema(schema),
        ),
        Verb::UpdateById => (
            format!("update_{}_by_id", schema.singular),
            format!(
                "Update an existing {} by id; only supplied fields are sent",
                schema.singular
            ),
            by_id_path(schema),
            fields_input_schema(schema, RequiredFields::IdOnly),
        ),
        Verb::DeleteById => (
            format!("delete_{}_by_id", schema.singular),
            format!("Delete a {} by id", schema.singular),
            by_id_path(schema),
            id_input_schema(schema),
        ),
        Verb::ListByRelation => {
            let rel = schema
                .relation
                .as_ref()
                .expect("relation verbs are only generated for schemas with a relation");
            (
                format!("list_{}_by_{}", schema.plural, rel.via),
                rel.description.clone(),
                rel.path_template.clone(),
                relation_input_schema(rel),
            )
        }
    };

    CatalogEntry {
        name,
        description,
        operation: Operation {
            resource: schema.display_name.clone(),
            verb,
            method: verb.http_method(),
            path_template,
        },
        input_schema: Arc::new(to_json_object(input_schema)),
        schema_idx,
    }
}

fn by_id_path(schema: &ResourceSchema) -> String {
    format!("{}/{{{}}}", schema.collection_path, schema.id_field)
}

enum RequiredFields {
    /// Required fields as declared by the schema (create).
    Declared,
    /// Only the identifier (update).
    IdOnly,
}

fn empty_input_schema() -> Value {
    json!({ "type": "object", "properties": {} })
}

fn fields_input_schema(schema: &ResourceSchema, mode: RequiredFields) -> Value {
    let mut properties = serde_json::Map::new();
    let mut required: Vec<String> = Vec::new();

    for f in &schema.fields {
        properties.insert(f.name.clone(), json!({ "type": f.field_type.name() }));
        let is_required = match mode {
            RequiredFields::Declared => f.required,
            RequiredFields::IdOnly => f.name == schema.id_field,
        };
        if is_required {
            required.push(f.name.clone());
        }
    }

    let mut out = json!({ "type": "object", "properties": properties });
    if !required.is_empty() {
        out["required"] = json!(required);
    }
    out
}

fn id_input_schema(schema: &ResourceSchema) -> Value {
    let id_type = schema
        .field(&schema.id_field)
        .map_or(FieldType::Number, |f| f.field_type);
    json!({
        "type": "object",
        "properties": { schema.id_field.as_str(): { "type": id_type.name() } },
        "required": [schema.id_field.as_str()],
    })
}

fn relation_input_schema(rel: &crate::schema::RelationSpec) -> Value {
    json!({
        "type": "object",
        "properties": { rel.parameter.as_str(): { "type": "number" } },
        "required": [rel.parameter.as_str()],
    })
}

fn to_json_object(value: Value) -> JsonObject {
    value.as_object().cloned().unwrap_or_else(JsonObject::new)
}
