//! Authorization mode selection.
//!
//! [`AuthProvider::resolve`] is the single decision point between static
//! basic authentication, no authentication, and refreshable request
//! signing credentials.

use crate::config::{default_region_from_env, AuthConfig, IdentityScope, DEFAULT_SERVICE};
use crate::session::{Identity, SessionCache};
use crate::{RefreshableCredentials, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::sync::Arc;

/// Outcome of resolving authorization for a request target.
#[derive(Debug, Clone)]
pub enum Authorization {
    /// Static `username:password` credential.
    Basic(String),
    /// No authentication is configured or discoverable.
    None,
    /// Request signing credentials that are read fresh at signing time.
    Signing(RefreshableCredentials),
}

impl Authorization {
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Returns the `username:password` string for basic auth.
    pub fn as_basic(&self) -> Option<&str> {
        match self {
            Self::Basic(credential) => Some(credential),
            _ => None,
        }
    }

    pub fn as_signing(&self) -> Option<&RefreshableCredentials> {
        match self {
            Self::Signing(credentials) => Some(credentials),
            _ => None,
        }
    }

    /// Returns the `Authorization` header value for basic auth.
    ///
    /// ```
    /// use searchauth::Authorization;
    ///
    /// let auth = Authorization::Basic("user:pass".to_string());
    /// assert_eq!(auth.basic_header().as_deref(), Some("Basic dXNlcjpwYXNz"));
    /// assert!(Authorization::None.basic_header().is_none());
    /// ```
    pub fn basic_header(&self) -> Option<String> {
        self.as_basic()
            .map(|credential| format!("Basic {}", STANDARD.encode(credential)))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Where the fallback region comes from when a call names none.
#[derive(Debug, Clone, PartialEq, Eq)]
enum DefaultRegion {
    /// Looked up in the environment on every call that needs it.
    Environment,
    /// Fixed by the caller; `None` disables the fallback.
    Fixed(Option<String>),
}

/// Chooses the authorization mode for a search backend request.
///
/// The provider holds a shared [`SessionCache`]; cloning the provider or
/// building several providers over the same cache shares sessions.
///
/// # Example
///
/// ```
/// use searchauth::backends::mock::MockSessionFactory;
/// use searchauth::{AuthProvider, SessionCache};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> searchauth::Result<()> {
///     let cache = Arc::new(SessionCache::new(Arc::new(MockSessionFactory::new())));
///     let provider = AuthProvider::new(cache).with_default_region(None);
///
///     let auth = provider
///         .resolve("search.example.com", Some("elastic"), Some("changeme"), None, None)
///         .await?;
///     assert_eq!(auth.as_basic(), Some("elastic:changeme"));
///
///     let auth = provider
///         .resolve("search.example.com", None, None, Some("us-east-1"), Some("default"))
///         .await?;
///     assert_eq!(auth.as_signing().map(|c| c.region()), Some("us-east-1"));
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthProvider {
    cache: Arc<SessionCache>,
    scope: IdentityScope,
    default_region: DefaultRegion,
    service: String,
}

impl AuthProvider {
    /// Creates a provider over `cache`.
    ///
    /// The ambient default region is looked up in the environment each
    /// time a call names no region (see [`default_region_from_env`]).
    pub fn new(cache: Arc<SessionCache>) -> Self {
        Self {
            cache,
            scope: IdentityScope::default(),
            default_region: DefaultRegion::Environment,
            service: DEFAULT_SERVICE.to_string(),
        }
    }

    /// Replaces the environment lookup with a fixed default region.
    ///
    /// `None` means no default region, whatever the environment says.
    pub fn with_default_region(mut self, region: Option<String>) -> Self {
        self.default_region = DefaultRegion::Fixed(region.filter(|r| !r.is_empty()));
        self
    }

    pub fn with_identity_scope(mut self, scope: IdentityScope) -> Self {
        self.scope = scope;
        self
    }

    /// Sets the signing service identifier (default `es`).
    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = service.into();
        self
    }

    pub fn cache(&self) -> &Arc<SessionCache> {
        &self.cache
    }

    /// Returns the default region as of now.
    pub fn default_region(&self) -> Option<String> {
        match &self.default_region {
            DefaultRegion::Environment => default_region_from_env(),
            DefaultRegion::Fixed(region) => region.clone(),
        }
    }

    fn caller_identity(&self) -> Identity {
        match self.scope {
            IdentityScope::Thread => Identity::current_thread(),
            IdentityScope::Shared => Identity::shared(),
        }
    }

    /// Resolves authorization for `host`.
    ///
    /// 1. Non-empty `username` and `password` win: returns
    ///    [`Authorization::Basic`] without looking at region or profile.
    /// 2. With no region given and no default region configured, returns
    ///    [`Authorization::None`].
    /// 3. Otherwise returns [`Authorization::Signing`] over the cached
    ///    session for the caller's identity.
    ///
    /// Empty strings are treated as absent.
    ///
    /// # Errors
    ///
    /// Only session construction can fail here; the factory's error is
    /// returned unchanged. Region and profile are not checked locally, the
    /// factory decides whether it can build a session for them.
    pub async fn resolve(
        &self,
        host: &str,
        username: Option<&str>,
        password: Option<&str>,
        region: Option<&str>,
        profile: Option<&str>,
    ) -> Result<Authorization> {
        let identity = self.caller_identity();
        self.resolve_as(&identity, host, username, password, region, profile)
            .await
    }

    /// Like [`resolve`](Self::resolve) with an explicit cache identity.
    pub async fn resolve_as(
        &self,
        identity: &Identity,
        host: &str,
        username: Option<&str>,
        password: Option<&str>,
        region: Option<&str>,
        profile: Option<&str>,
    ) -> Result<Authorization> {
        if let (Some(username), Some(password)) = (non_empty(username), non_empty(password)) {
            tracing::trace!(host, "using basic authentication");
            return Ok(Authorization::Basic(format!("{}:{}", username, password)));
        }

        let region = non_empty(region);
        let profile = non_empty(profile);

        let default_region = match region {
            Some(_) => None,
            None => self.default_region(),
        };

        if region.is_none() && default_region.is_none() {
            tracing::debug!(host, "no credentials and no region, not authenticating");
            return Ok(Authorization::None);
        }

        let session = self.cache.get_or_create(identity, region, profile).await?;

        let signing_region = session
            .region()
            .or(region)
            .or(default_region.as_deref())
            .unwrap_or_default()
            .to_string();

        tracing::debug!(host, region = %signing_region, ?profile, service = %self.service, "using request signing");
        Ok(Authorization::Signing(RefreshableCredentials::new(
            session.credentials(),
            host,
            signing_region,
            self.service.clone(),
        )))
    }

    /// Resolves authorization from an [`AuthConfig`].
    pub async fn resolve_config(&self, config: &AuthConfig) -> Result<Authorization> {
        self.resolve(
            &config.es_host,
            config.es_username.as_deref(),
            config.es_password.as_deref(),
            config.aws_region.as_deref(),
            config.profile.as_deref(),
        )
        .await
    }
}
