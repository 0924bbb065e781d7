//! Auth header templates.
//!
//! One template per auth kind maps a session credential to a concrete HTTP
//! header. `AuthKind::None` deliberately has no template: the dispatcher must
//! skip header injection entirely for unauthenticated profiles.

use serde::{Deserialize, Serialize};

/// Supported authentication treatments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthKind {
    #[default]
    None,
    Bearer,
    Apikey,
    Basic,
}

impl AuthKind {
    /// Short name as used in configuration files and tool arguments.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AuthKind::None => "none",
            AuthKind::Bearer => "bearer",
            AuthKind::Apikey => "apikey",
            AuthKind::Basic => "basic",
        }
    }

    /// Parse a configuration-file spelling of an auth kind.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Some(AuthKind::None),
            "bearer" => Some(AuthKind::Bearer),
            "apikey" | "api-key" | "api_key" => Some(AuthKind::Apikey),
            "basic" => Some(AuthKind::Basic),
            _ => None,
        }
    }
}

/// Formatting rule translating a credential into an HTTP header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthTemplate {
    pub kind: AuthKind,
    pub header_name: &'static str,
    pub value_prefix: &'static str,
}

const TEMPLATES: &[AuthTemplate] = &[
    AuthTemplate {
        kind: AuthKind::Bearer,
        header_name: "Authorization",
        value_prefix: "Bearer ",
    },
    AuthTemplate {
        kind: AuthKind::Apikey,
        header_name: "X-API-Key",
        value_prefix: "",
    },
    AuthTemplate {
        kind: AuthKind::Basic,
        header_name: "Authorization",
        value_prefix: "Basic ",
    },
];

/// Look up the template for an auth kind. `None` for `AuthKind::None`.
#[must_use]
pub fn template(kind: AuthKind) -> Option<&'static AuthTemplate> {
    TEMPLATES.iter().find(|t| t.kind == kind)
}

/// Format the auth header for a kind + credential.
///
/// Returns `None` for `AuthKind::None`; pure formatting otherwise
/// (`value_prefix + credential`).
#[must_use]
pub fn format_header(kind: AuthKind, credential: &str) -> Option<(&'static str, String)> {
    let t = template(kind)?;
    Some((t.header_name, format!("{}{credential}", t.value_prefix)))
}
