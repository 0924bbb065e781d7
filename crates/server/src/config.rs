//! Server configuration file (YAML).

use anyhow::Context as _;
use resourceful_rest_tools::profile::ApiProfile;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerConfig {
    /// API profiles to register. Empty means the built-in set.
    #[serde(default)]
    pub profiles: Vec<ApiProfile>,

    /// Name of the profile new sessions start on. Defaults to the first
    /// registered profile.
    #[serde(default)]
    pub default_profile: Option<String>,

    /// Per-request timeout in seconds. The dispatcher refuses zero.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
}

impl ServerConfig {
    /// Load the config from `path`, or defaults when no path is given.
    ///
    /// # Errors
    ///
    /// Returns an error if an explicitly given file cannot be read or parsed.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let bytes =
            std::fs::read(path).with_context(|| format!("read config {}", path.display()))?;
        let cfg: Self = serde_yaml::from_slice(&bytes)
            .with_context(|| format!("parse {}", path.display()))?;
        Ok(cfg)
    }

    #[must_use]
    pub fn effective_profiles(&self) -> Vec<ApiProfile> {
        if self.profiles.is_empty() {
            crate::resources::builtin_profiles()
        } else {
            self.profiles.clone()
        }
    }

    /// The profile new sessions start on.
    #[must_use]
    pub fn effective_default(&self) -> Option<String> {
        self.default_profile.clone().or_else(|| {
            self.effective_profiles()
                .first()
                .map(|p| p.name.clone())
        })
    }

    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS))
    }
}
