//! API profile registry and the session-scoped active profile.
//!
//! The registry is populated once at startup and never mutated afterwards; it
//! is safe to share across concurrent sessions behind an `Arc`. Everything a
//! caller may change at runtime (active profile, base-URL/auth overrides, the
//! credential) lives in a [`SessionProfile`] owned by exactly one session, so
//! reconfiguring one caller's target API never affects another.

use crate::auth::AuthKind;
use crate::error::{RestToolsError, Result};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use url::Url;

/// A named backend target the adapter can be pointed at.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiProfile {
    /// Unique key across the registry.
    pub name: String,
    pub display_name: String,
    /// Absolute base URL; a trailing slash is tolerated either way.
    pub base_url: String,
    #[serde(default)]
    pub auth_kind: AuthKind,
    #[serde(default)]
    pub description: String,
}

/// Read-only registry of API profiles, in insertion order.
#[derive(Debug)]
pub struct ProfileRegistry {
    profiles: Vec<ApiProfile>,
}

impl ProfileRegistry {
    /// Build a registry from static configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error on duplicate profile names or a
    /// `base_url` that is not an absolute http(s) URL.
    pub fn new(profiles: Vec<ApiProfile>) -> Result<Self> {
        let mut seen: Vec<&str> = Vec::with_capacity(profiles.len());
        for p in &profiles {
            if seen.contains(&p.name.as_str()) {
                return Err(RestToolsError::Config(format!(
                    "Duplicate API profile name '{}'",
                    p.name
                )));
            }
            seen.push(&p.name);
            validate_base_url(&p.base_url)
                .map_err(|e| RestToolsError::Config(format!("Profile '{}': {e}", p.name)))?;
        }
        Ok(Self { profiles })
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ApiProfile> {
        self.profiles.iter().find(|p| p.name == name)
    }

    /// Profiles in insertion order (stable for discovery/display).
    pub fn iter(&self) -> impl Iterator<Item = &ApiProfile> {
        self.profiles.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

fn validate_base_url(raw: &str) -> std::result::Result<(), String> {
    let url = Url::parse(raw).map_err(|e| format!("invalid base URL '{raw}': {e}"))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(format!("unsupported base URL scheme '{other}' in '{raw}'")),
    }
}

/// Session-local overrides on top of the active profile.
///
/// Only fields the caller explicitly set are overridden; everything else
/// falls through to the registry entry.
#[derive(Debug, Clone, Default)]
pub struct ProfileOverlay {
    pub base_url: Option<String>,
    pub auth_kind: Option<AuthKind>,
    pub credential: Option<String>,
}

/// The active profile with overlay applied, as consumed by the dispatcher.
#[derive(Debug, Clone)]
pub struct ResolvedProfile {
    pub name: String,
    pub base_url: String,
    pub auth_kind: AuthKind,
    /// Session credential, if one was configured. A `bearer`/`apikey`/`basic`
    /// profile without a credential dispatches without an auth header.
    pub credential: Option<String>,
}

struct SessionState {
    active: String,
    overlay: ProfileOverlay,
}

/// One session's view of the registry: the active profile name plus overlay.
///
/// Cloning shares the same session; independent sessions get independent
/// `SessionProfile` values and cannot observe each other's changes.
#[derive(Clone)]
pub struct SessionProfile {
    registry: Arc<ProfileRegistry>,
    state: Arc<RwLock<SessionState>>,
}

impl SessionProfile {
    /// Create a session pointing at `default_profile`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownProfile` if `default_profile` is not registered.
    pub fn new(registry: Arc<ProfileRegistry>, default_profile: &str) -> Result<Self> {
        if registry.get(default_profile).is_none() {
            return Err(RestToolsError::UnknownProfile(default_profile.to_string()));
        }
        Ok(Self {
            registry,
            state: Arc::new(RwLock::new(SessionState {
                active: default_profile.to_string(),
                overlay: ProfileOverlay::default(),
            })),
        })
    }

    #[must_use]
    pub fn registry(&self) -> &ProfileRegistry {
        &self.registry
    }

    #[must_use]
    pub fn active_name(&self) -> String {
        self.state.read().active.clone()
    }

    /// Switch the session's active profile.
    ///
    /// Any prior overlay is cleared: an overlay applies to the profile that
    /// was active when it was set, and must not leak onto the next one.
    ///
    /// # Errors
    ///
    /// Returns `UnknownProfile` if `name` is not registered; the session is
    /// left unchanged in that case.
    pub fn activate(&self, name: &str) -> Result<ApiProfile> {
        let profile = self
            .registry
            .get(name)
            .cloned()
            .ok_or_else(|| RestToolsError::UnknownProfile(name.to_string()))?;
        let mut state = self.state.write();
        state.active = profile.name.clone();
        state.overlay = ProfileOverlay::default();
        Ok(profile)
    }

    /// Overlay base URL / auth kind / credential onto the active profile.
    ///
    /// Mutates only this session; the backing registry is untouched.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if an overlay `base_url` is not an
    /// absolute http(s) URL. Nothing is applied on error.
    pub fn apply_overlay(&self, overlay: ProfileOverlay) -> Result<()> {
        if let Some(base_url) = &overlay.base_url {
            validate_base_url(base_url).map_err(RestToolsError::Config)?;
        }
        let mut state = self.state.write();
        if let Some(base_url) = overlay.base_url {
            state.overlay.base_url = Some(base_url);
        }
        if let Some(kind) = overlay.auth_kind {
            state.overlay.auth_kind = Some(kind);
        }
        if let Some(credential) = overlay.credential {
            state.overlay.credential = Some(credential);
        }
        Ok(())
    }

    /// The effective profile for dispatching: registry entry + overlay.
    #[must_use]
    pub fn resolved(&self) -> ResolvedProfile {
        let state = self.state.read();
        // The active name always points at a registry entry: `new` and
        // `activate` reject unknown names and the registry is immutable.
        let base = self
            .registry
            .get(&state.active)
            .expect("active profile exists in immutable registry");
        ResolvedProfile {
            name: base.name.clone(),
            base_url: state
                .overlay
                .base_url
                .clone()
                .unwrap_or_else(|| base.base_url.clone()),
            auth_kind: state.overlay.auth_kind.unwrap_or(base.auth_kind),
            credential: state.overlay.credential.clone(),
        }
    }
}
