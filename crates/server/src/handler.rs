//! MCP surface: the resource tool catalog plus profile management tools.
//!
//! One handler instance exists per MCP session (the streamable HTTP service
//! factory creates them), so the session profile inside is naturally scoped:
//! `switch_api`/`configure_api` in one session can never leak into another.

use resourceful_rest_tools::auth::AuthKind;
use resourceful_rest_tools::error::{RestToolsError, ValidationReport};
use resourceful_rest_tools::profile::{ProfileOverlay, ProfileRegistry, SessionProfile};
use resourceful_rest_tools::runtime::{Outcome, RestToolSource};
use rmcp::model::{
    CallToolRequestParam, CallToolResult, Content, JsonObject, ListToolsResult,
    PaginatedRequestParam, ServerCapabilities, ServerInfo, Tool, ToolAnnotations,
};
use rmcp::service::RequestContext;
use rmcp::{ErrorData as McpError, RoleServer, ServerHandler};
use serde_json::{Value, json};
use std::sync::Arc;

pub struct ResourcefulHandler {
    source: RestToolSource,
    session: SessionProfile,
}

impl ResourcefulHandler {
    /// Build a handler for one session.
    ///
    /// # Errors
    ///
    /// Returns `UnknownProfile` if `default_profile` is not registered.
    pub fn new(
        source: RestToolSource,
        registry: Arc<ProfileRegistry>,
        default_profile: &str,
    ) -> Result<Self, RestToolsError> {
        Ok(Self {
            source,
            session: SessionProfile::new(registry, default_profile)?,
        })
    }

    /// Route a named call: profile tools are handled locally, everything else
    /// goes through the catalog with this session's resolved profile.
    ///
    /// Every failure becomes a structured `is_error` result; nothing is
    /// surfaced as an MCP protocol fault.
    pub async fn dispatch(&self, name: &str, arguments: &JsonObject) -> CallToolResult {
        match name {
            "list_apis" => self.list_apis(),
            "switch_api" => self.switch_api(arguments),
            "configure_api" => self.configure_api(arguments),
            _ => {
                let profile = self.session.resolved();
                match self.source.call_tool(name, arguments, &profile).await {
                    Ok(outcome) => outcome_result(outcome),
                    Err(err) => error_result(&err),
                }
            }
        }
    }

    fn list_apis(&self) -> CallToolResult {
        let active = self.session.active_name();
        let profiles: Vec<Value> = self
            .session
            .registry()
            .iter()
            .map(|p| {
                json!({
                    "name": p.name,
                    "displayName": p.display_name,
                    "baseUrl": p.base_url,
                    "authKind": p.auth_kind.as_str(),
                    "description": p.description,
                    "active": p.name == active,
                })
            })
            .collect();
        success_result(&Value::Array(profiles))
    }

    fn switch_api(&self, arguments: &JsonObject) -> CallToolResult {
        let Some(name) = arguments.get("api").and_then(Value::as_str) else {
            return error_result(&missing_argument("api"));
        };
        match self.session.activate(name) {
            Ok(profile) => success_result(&json!({
                "active": profile.name,
                "baseUrl": profile.base_url,
                "authKind": profile.auth_kind.as_str(),
            })),
            Err(err) => error_result(&err),
        }
    }

    fn configure_api(&self, arguments: &JsonObject) -> CallToolResult {
        let auth_kind = match arguments.get("authKind").and_then(Value::as_str) {
            Some(raw) => match AuthKind::parse(raw) {
                Some(kind) => Some(kind),
                None => {
                    return error_result(&RestToolsError::Config(format!(
                        "unknown auth kind '{raw}' (expected none, bearer, apikey, or basic)"
                    )));
                }
            },
            None => None,
        };

        let overlay = ProfileOverlay {
            base_url: arguments
                .get("baseUrl")
                .and_then(Value::as_str)
                .map(str::to_string),
            auth_kind,
            credential: arguments
                .get("credential")
                .and_then(Value::as_str)
                .map(str::to_string),
        };

        match self.session.apply_overlay(overlay) {
            Ok(()) => {
                let resolved = self.session.resolved();
                // The credential itself is never echoed back.
                success_result(&json!({
                    "active": resolved.name,
                    "baseUrl": resolved.base_url,
                    "authKind": resolved.auth_kind.as_str(),
                    "credentialSet": resolved.credential.is_some(),
                }))
            }
            Err(err) => error_result(&err),
        }
    }

    fn profile_tools() -> Vec<Tool> {
        let list_schema = json!({ "type": "object", "properties": {} });
        let switch_schema = json!({
            "type": "object",
            "properties": {
                "api": { "type": "string", "description": "Name of the API profile to activate" }
            },
            "required": ["api"],
        });
        let configure_schema = json!({
            "type": "object",
            "properties": {
                "baseUrl": { "type": "string", "description": "Override the active profile's base URL" },
                "authKind": { "type": "string", "enum": ["none", "bearer", "apikey", "basic"] },
                "credential": { "type": "string", "description": "Credential for the auth header" }
            },
        });

        let mut tools = Vec::with_capacity(3);

        let mut t = Tool::new(
            "list_apis",
            "List the API profiles this server can target and which one is active for this session",
            Arc::new(to_object(list_schema)),
        );
        t.annotations = Some(session_annotations(true));
        tools.push(t);

        let mut t = Tool::new(
            "switch_api",
            "Switch this session's active API profile",
            Arc::new(to_object(switch_schema)),
        );
        t.annotations = Some(session_annotations(false));
        tools.push(t);

        let mut t = Tool::new(
            "configure_api",
            "Override base URL, auth kind, or credential for this session's active profile",
            Arc::new(to_object(configure_schema)),
        );
        t.annotations = Some(session_annotations(false));
        tools.push(t);

        tools
    }
}

impl ServerHandler for ResourcefulHandler {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "CRUD tools over a configurable REST resource API. Use list_apis to see \
                 available backends, switch_api to change this session's target, and \
                 configure_api to set a base URL override or credential."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        let mut tools = self.source.list_tools();
        tools.extend(Self::profile_tools());
        Ok(ListToolsResult {
            tools,
            ..Default::default()
        })
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        _context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        let arguments = request.arguments.unwrap_or_default();
        Ok(self.dispatch(&request.name, &arguments).await)
    }
}

/// Annotations for tools that only touch session configuration.
fn session_annotations(read_only: bool) -> ToolAnnotations {
    ToolAnnotations {
        title: None,
        read_only_hint: Some(read_only),
        destructive_hint: Some(false),
        idempotent_hint: Some(true),
        open_world_hint: Some(false),
    }
}

fn missing_argument(name: &str) -> RestToolsError {
    let mut report = ValidationReport::default();
    report.missing(name);
    RestToolsError::Validation(report)
}

fn to_object(value: Value) -> JsonObject {
    value.as_object().cloned().unwrap_or_else(JsonObject::new)
}

fn outcome_result(outcome: Outcome) -> CallToolResult {
    let value = match outcome {
        Outcome::Payload(v) => v,
        Outcome::NotFound => json!({ "found": false }),
        Outcome::NoContent => json!({ "ok": true }),
    };
    success_result(&value)
}

fn success_result(value: &Value) -> CallToolResult {
    let text = match value {
        Value::String(s) => s.clone(),
        other => serde_json::to_string(other).unwrap_or_else(|_| other.to_string()),
    };
    CallToolResult::success(vec![Content::text(text)])
}

fn error_result(err: &RestToolsError) -> CallToolResult {
    let mut detail = json!({ "message": err.to_string() });
    if let RestToolsError::Http { status, body } = err {
        detail["httpStatus"] = json!(status);
        if let Some(body) = body {
            detail["body"] = body.clone();
        }
    }
    let text = serde_json::to_string(&detail).unwrap_or_else(|_| detail.to_string());
    CallToolResult {
        content: vec![Content::text(text)],
        structured_content: None,
        is_error: Some(true),
        meta: None,
    }
}
