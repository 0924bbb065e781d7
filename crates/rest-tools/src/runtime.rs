//! Runtime for dispatching resource operations over HTTP.
//!
//! One generic dispatcher, parameterized by [`Operation`] records and
//! [`ResourceSchema`]s, replaces the per-resource request code a hand-written
//! adapter would repeat: resolve the path template, apply the active
//! profile's auth treatment, issue exactly one bounded HTTP call, and
//! classify the outcome.

use crate::auth;
use crate::catalog::{CatalogEntry, Operation, ToolCatalog, Verb};
use crate::error::{RestToolsError, Result, ValidationReport};
use crate::profile::ResolvedProfile;
use crate::schema::{FieldType, ResourceSchema, json_type_name};
use reqwest::{Client, StatusCode, header};
use rmcp::model::{JsonObject, Tool};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Outcome of a successfully dispatched operation.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Parsed body of a 2xx response.
    Payload(Value),
    /// 404 on a by-id read: the entity does not exist. A domain-legitimate
    /// answer, distinguished from [`RestToolsError::Http`] so callers can
    /// render "not found" without treating it as a failure.
    NotFound,
    /// 2xx with an empty body (typically delete).
    NoContent,
}

/// Issues HTTP requests for resource operations.
#[derive(Debug)]
pub struct Dispatcher {
    client: Client,
    timeout: Duration,
}

impl Dispatcher {
    /// Build a dispatcher with a mandatory request timeout.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `timeout` is zero: an unbounded
    /// request is a contract violation, not "wait forever".
    pub fn new(timeout: Duration) -> Result<Self> {
        if timeout.is_zero() {
            return Err(RestToolsError::Config(
                "request timeout must be non-zero".to_string(),
            ));
        }
        Ok(Self {
            client: Client::new(),
            timeout,
        })
    }

    /// Execute one operation against the resolved profile.
    ///
    /// At-most-once: no retries are attempted. A timeout abandons the
    /// in-flight call and surfaces as a transport error.
    ///
    /// # Errors
    ///
    /// - `InvalidPath` if a template placeholder has no value in `path_params`
    /// - `Transport` when no HTTP response was obtained
    /// - `Http` for any non-2xx response other than 404 on a by-id read
    pub async fn execute(
        &self,
        op: &Operation,
        profile: &ResolvedProfile,
        path_params: &JsonObject,
        payload: Option<&Value>,
    ) -> Result<Outcome> {
        let path = resolve_path(&op.path_template, path_params)?;
        let url = build_url(&profile.base_url, &path)?;

        debug!(
            resource = %op.resource,
            verb = ?op.verb,
            method = %op.method,
            url = %redact_url(&url),
            "dispatching operation"
        );

        let mut request = self
            .client
            .request(op.method.clone(), url)
            .header(header::ACCEPT, "application/json")
            .timeout(self.timeout);

        if let Some(credential) = &profile.credential
            && let Some((name, value)) = auth::format_header(profile.auth_kind, credential)
        {
            request = request.header(name, value);
        }
        // No credential configured on an authenticated profile: send the
        // request bare and let the backend reject it.

        if let Some(body) = payload {
            request = request.json(body);
        }

        let response = request.send().await?;
        classify(op.verb, response).await
    }
}

async fn classify(verb: Verb, response: reqwest::Response) -> Result<Outcome> {
    let status = response.status();

    if status.is_success() {
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(Outcome::NoContent);
        }
        let value = serde_json::from_str(&text).unwrap_or(Value::String(text));
        return Ok(Outcome::Payload(value));
    }

    if status == StatusCode::NOT_FOUND && verb == Verb::GetById {
        // Absence of a single entity is an expected answer, not a fault.
        // List/relation endpoints keep 404 as an error: a missing collection
        // route means misconfiguration.
        return Ok(Outcome::NotFound);
    }

    let body = response
        .text()
        .await
        .ok()
        .filter(|t| !t.trim().is_empty())
        .map(|t| serde_json::from_str(&t).unwrap_or(Value::String(t)));

    Err(RestToolsError::Http {
        status: status.as_u16(),
        body,
    })
}

fn resolve_path(template: &str, params: &JsonObject) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let Some(end) = after.find('}') else {
            return Err(RestToolsError::InvalidPath(format!(
                "unterminated placeholder in template '{template}'"
            )));
        };
        let key = &after[..end];
        let Some(value) = params.get(key) else {
            return Err(RestToolsError::InvalidPath(format!(
                "missing value for '{{{key}}}' in template '{template}'"
            )));
        };
        out.push_str(&value_to_string(value));
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    Ok(out)
}

fn build_url(base_url: &str, path: &str) -> Result<Url> {
    let path = if path.starts_with('/') {
        path.to_string()
    } else {
        format!("/{path}")
    };
    let joined = format!("{}{path}", base_url.trim_end_matches('/'));
    Url::parse(&joined).map_err(|e| RestToolsError::Transport(format!("Invalid URL: {e}")))
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        _ => value.to_string(),
    }
}

#[must_use]
pub fn redact_url(url: &Url) -> String {
    let mut u = url.clone();
    // Best-effort: drop credentials + query + fragment.
    let _ = u.set_username("");
    let _ = u.set_password(None);
    u.set_query(None);
    u.set_fragment(None);
    u.to_string()
}

#[must_use]
pub fn sanitize_reqwest_error(e: &reqwest::Error) -> String {
    let mut msg = e.to_string();
    if let Some(u) = e.url() {
        msg = msg.replace(u.as_str(), &redact_url(u));
    }
    msg
}

impl From<reqwest::Error> for RestToolsError {
    fn from(value: reqwest::Error) -> Self {
        Self::Transport(sanitize_reqwest_error(&value))
    }
}

/// Facade combining the catalog and dispatcher.
///
/// Immutable after construction and safe to share across tasks; the active
/// profile is threaded into each call rather than stored, so concurrent
/// sessions can target different backends through the same source.
#[derive(Clone)]
pub struct RestToolSource {
    inner: Arc<RestToolSourceInner>,
}

struct RestToolSourceInner {
    catalog: ToolCatalog,
    dispatcher: Dispatcher,
}

impl RestToolSource {
    /// Build a source from a schema set.
    ///
    /// # Errors
    ///
    /// Returns an error if the schema set is invalid (see [`ToolCatalog::new`])
    /// or the timeout is zero.
    pub fn new(schemas: Vec<ResourceSchema>, timeout: Duration) -> Result<Self> {
        let catalog = ToolCatalog::new(schemas)?;
        let dispatcher = Dispatcher::new(timeout)?;
        Ok(Self {
            inner: Arc::new(RestToolSourceInner {
                catalog,
                dispatcher,
            }),
        })
    }

    /// List the MCP `Tool`s exposed by this source.
    #[must_use]
    pub fn list_tools(&self) -> Vec<Tool> {
        self.inner.catalog.describe()
    }

    #[must_use]
    pub fn catalog(&self) -> &ToolCatalog {
        &self.inner.catalog
    }

    /// Execute a named tool call against the given profile.
    ///
    /// Input validation happens before any request is composed: a
    /// `Validation` error means no HTTP call was issued.
    ///
    /// # Errors
    ///
    /// - `UnknownTool` if `name` is not in the catalog
    /// - `Validation` for missing/mistyped caller input
    /// - anything [`Dispatcher::execute`] can return
    pub async fn call_tool(
        &self,
        name: &str,
        arguments: &JsonObject,
        profile: &ResolvedProfile,
    ) -> Result<Outcome> {
        let entry = self
            .inner
            .catalog
            .resolve(name)
            .ok_or_else(|| RestToolsError::UnknownTool(name.to_string()))?;
        let schema = self.inner.catalog.schema_for(entry);

        let (path_params, payload) = prepare_call(entry, schema, arguments)?;
        self.inner
            .dispatcher
            .execute(&entry.operation, profile, &path_params, payload.as_ref())
            .await
    }
}

/// Turn validated caller arguments into path parameters + request body.
fn prepare_call(
    entry: &CatalogEntry,
    schema: &ResourceSchema,
    arguments: &JsonObject,
) -> Result<(JsonObject, Option<Value>)> {
    match entry.operation.verb {
        Verb::List => Ok((JsonObject::new(), None)),
        Verb::Create => {
            let payload = schema.build_create_payload(arguments)?;
            Ok((JsonObject::new(), Some(payload)))
        }
        Verb::GetById | Verb::DeleteById => {
            let id = require_typed(arguments, &schema.id_field, schema)?;
            let mut params = JsonObject::new();
            params.insert(schema.id_field.clone(), id);
            Ok((params, None))
        }
        Verb::UpdateById => {
            // The payload builder insists on the identifier, so the path
            // parameter can be lifted straight out of the built payload.
            let payload = schema.build_update_payload(arguments)?;
            let mut params = JsonObject::new();
            if let Some(id) = payload.get(&schema.id_field) {
                params.insert(schema.id_field.clone(), id.clone());
            }
            Ok((params, Some(payload)))
        }
        Verb::ListByRelation => {
            let Some(rel) = schema.relation.as_ref() else {
                return Err(RestToolsError::Config(format!(
                    "resource '{}' declares no relation listing",
                    schema.display_name
                )));
            };
            let value = match arguments.get(&rel.parameter) {
                Some(Value::Null) | None => {
                    let mut report = ValidationReport::default();
                    report.missing(&rel.parameter);
                    return Err(RestToolsError::Validation(report));
                }
                Some(v) if v.is_number() => v.clone(),
                Some(v) => {
                    let mut report = ValidationReport::default();
                    report.wrong_type(&rel.parameter, "number", json_type_name(v));
                    return Err(RestToolsError::Validation(report));
                }
            };
            let mut params = JsonObject::new();
            params.insert(rel.parameter.clone(), value);
            Ok((params, None))
        }
    }
}

fn require_typed(arguments: &JsonObject, field: &str, schema: &ResourceSchema) -> Result<Value> {
    let expected = schema
        .field(field)
        .map_or(FieldType::Number, |f| f.field_type);
    match arguments.get(field) {
        Some(Value::Null) | None => {
            let mut report = ValidationReport::default();
            report.missing(field);
            Err(RestToolsError::Validation(report))
        }
        Some(v) if expected.matches(v) => Ok(v.clone()),
        Some(v) => {
            let mut report = ValidationReport::default();
            report.wrong_type(field, expected.name(), json_type_name(v));
            Err(RestToolsError::Validation(report))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthKind;
    use crate::schema::{FieldSpec, FieldType};
    use serde_json::json;

    fn book_schema() -> ResourceSchema {
        ResourceSchema {
            display_name: "Book".to_string(),
            singular: "book".to_string(),
            plural: "books".to_string(),
            collection_path: "/api/v1/Books".to_string(),
            id_field: "id".to_string(),
            fields: vec![
                FieldSpec::required("id", FieldType::Number),
                FieldSpec::required("title", FieldType::String),
                FieldSpec::optional("pageCount", FieldType::Number),
            ],
            relation: None,
        }
    }

    fn unreachable_profile() -> ResolvedProfile {
        ResolvedProfile {
            name: "test".to_string(),
            base_url: "http://127.0.0.1:1".to_string(),
            auth_kind: AuthKind::None,
            credential: None,
        }
    }

    fn args(v: Value) -> JsonObject {
        v.as_object().expect("object").clone()
    }

    #[test]
    fn zero_timeout_is_a_config_error() {
        let err = Dispatcher::new(Duration::ZERO).unwrap_err();
        assert!(matches!(err, RestToolsError::Config(_)));
    }

    #[test]
    fn resolve_path_substitutes_placeholders() {
        let params = args(json!({ "id": 42 }));
        let path = resolve_path("/api/v1/Books/{id}", &params).expect("path");
        assert_eq!(path, "/api/v1/Books/42");
    }

    #[test]
    fn resolve_path_fails_on_missing_placeholder_value() {
        let err = resolve_path("/api/v1/Books/{id}", &JsonObject::new()).unwrap_err();
        assert!(matches!(err, RestToolsError::InvalidPath(_)));
        assert!(err.to_string().contains("{id}"));
    }

    #[test]
    fn build_url_tolerates_trailing_slash_either_way() {
        let a = build_url("http://h.example.com", "/api/v1/Books").expect("url");
        let b = build_url("http://h.example.com/", "/api/v1/Books").expect("url");
        assert_eq!(a.as_str(), b.as_str());
        assert_eq!(a.path(), "/api/v1/Books");
    }

    #[tokio::test]
    async fn create_with_missing_required_fields_never_hits_the_network() {
        let source =
            RestToolSource::new(vec![book_schema()], Duration::from_secs(5)).expect("source");

        // base_url points at a closed port; a validation failure must return
        // before any connection attempt.
        let err = source
            .call_tool("create_book", &args(json!({ "pageCount": 10 })), &unreachable_profile())
            .await
            .unwrap_err();

        match err {
            RestToolsError::Validation(report) => {
                let text = report.to_string();
                assert!(text.contains("'id'"));
                assert!(text.contains("'title'"));
            }
            other => panic!("expected validation error, got {other}"),
        }
    }

    #[tokio::test]
    async fn unknown_tool_is_reported_as_such() {
        let source =
            RestToolSource::new(vec![book_schema()], Duration::from_secs(5)).expect("source");
        let err = source
            .call_tool("explode_book", &JsonObject::new(), &unreachable_profile())
            .await
            .unwrap_err();
        assert!(matches!(err, RestToolsError::UnknownTool(_)));
    }

    #[test]
    fn prepare_update_sends_exactly_id_plus_supplied_fields() {
        let schema = book_schema();
        let catalog = ToolCatalog::new(vec![schema.clone()]).expect("catalog");
        let entry = catalog.resolve("update_book_by_id").expect("entry");

        let (params, payload) =
            prepare_call(entry, &schema, &args(json!({ "id": 3, "title": "T2" })))
                .expect("prepared");

        assert_eq!(params.get("id"), Some(&json!(3)));
        assert_eq!(payload, Some(json!({ "id": 3, "title": "T2" })));
    }

    #[test]
    fn prepare_get_by_id_rejects_mistyped_identifier() {
        let schema = book_schema();
        let catalog = ToolCatalog::new(vec![schema.clone()]).expect("catalog");
        let entry = catalog.resolve("get_book_by_id").expect("entry");

        let err = prepare_call(entry, &schema, &args(json!({ "id": "three" }))).unwrap_err();
        assert!(err.to_string().contains("expects number"));
    }
}
