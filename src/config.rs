//! Configuration types for authorization resolution.

use serde::{Deserialize, Serialize};

/// Environment variables consulted, in order, for the default region.
///
/// `AWS_DEFAULT_REGION` is the variable alerting deployments set to enable
/// signing. `AWS_REGION` is also accepted because it is the variable the
/// Rust AWS SDK itself reads, so a region the SDK would pick up also
/// enables signing here.
pub const DEFAULT_REGION_ENV_VARS: [&str; 2] = ["AWS_DEFAULT_REGION", "AWS_REGION"];

/// Service identifier used when signing requests to the search backend.
pub const DEFAULT_SERVICE: &str = "es";

/// Reads the ambient default region from the environment.
///
/// Empty values are ignored.
pub fn default_region_from_env() -> Option<String> {
    DEFAULT_REGION_ENV_VARS
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|value| !value.is_empty())
}

/// How [`AuthProvider`](crate::AuthProvider) derives the caller identity
/// used in session cache keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityScope {
    /// One session per OS thread per (region, profile).
    #[default]
    Thread,
    /// One session per (region, profile) shared by all callers.
    Shared,
}

impl std::fmt::Display for IdentityScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Thread => write!(f, "thread"),
            Self::Shared => write!(f, "shared"),
        }
    }
}

/// Connection authorization settings for a search backend.
///
/// Field names follow the keys used in alerting rule and global
/// configuration files, so this can be deserialized straight from them.
///
/// ```
/// use searchauth::AuthConfig;
///
/// let config = AuthConfig::new("search.example.com")
///     .with_region("eu-west-1")
///     .with_profile("alerting");
///
/// assert_eq!(config.aws_region.as_deref(), Some("eu-west-1"));
/// assert!(config.es_username.is_none());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Search backend host
    pub es_host: String,

    /// Basic-auth username
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub es_username: Option<String>,

    /// Basic-auth password
    #[serde(default, skip_serializing)]
    pub es_password: Option<String>,

    /// Region for request signing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aws_region: Option<String>,

    /// Shared-config profile for request signing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
}

impl AuthConfig {
    /// Creates a configuration for `host` with no credentials.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            es_host: host.into(),
            ..Default::default()
        }
    }

    /// Sets static basic-auth credentials.
    pub fn with_basic_auth(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.es_username = Some(username.into());
        self.es_password = Some(password.into());
        self
    }

    /// Sets the signing region.
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.aws_region = Some(region.into());
        self
    }

    /// Sets the shared-config profile.
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        self.profile = Some(profile.into());
        self
    }
}
