//! Credential sources and the refreshable signing credential adapter.
//!
//! A [`CredentialSource`] is the live, self-refreshing provider of access
//! key, secret key and session token. [`RefreshableCredentials`] binds a
//! source to a host, region and service without ever copying the secret
//! values, so a request signed long after `resolve` still sees the current
//! credentials.

use crate::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;

/// Snapshot of credential values at one point in time.
///
/// Returned by [`CredentialSource::credentials`]. Signers that need a
/// coherent access key / secret / token triple should read this instead of
/// the three accessors separately.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Access key id
    pub access_key: String,
    /// Secret access key
    pub secret_key: String,
    /// Session token for temporary credentials
    pub session_token: Option<String>,
    /// When these credentials stop being valid
    pub expires_at: Option<DateTime<Utc>>,
}

impl Credentials {
    /// Creates a credential snapshot.
    pub fn new(
        access_key: impl Into<String>,
        secret_key: impl Into<String>,
        session_token: Option<String>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
            session_token,
            expires_at,
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &"** redacted **")
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "** redacted **"),
            )
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// A live source of cloud credentials.
///
/// Each accessor returns the value that is current at the moment of the
/// call and may refresh the underlying credentials first. Implementations
/// handle their own refresh locking.
///
/// # Errors
///
/// Accessors return [`AuthError::CredentialRefresh`](crate::AuthError::CredentialRefresh)
/// when current credentials cannot be produced (revoked role, expired
/// trust, unreachable metadata service).
#[async_trait]
pub trait CredentialSource: Send + Sync {
    /// Returns the current access key id.
    async fn access_key(&self) -> Result<String>;

    /// Returns the current secret access key.
    async fn secret_key(&self) -> Result<String>;

    /// Returns the current session token, if the credentials are temporary.
    async fn session_token(&self) -> Result<Option<String>>;

    /// Returns all current values together.
    ///
    /// The default reads the three accessors in turn. Sources that can
    /// rotate between those reads should override this with a single
    /// coherent read.
    async fn credentials(&self) -> Result<Credentials> {
        Ok(Credentials {
            access_key: self.access_key().await?,
            secret_key: self.secret_key().await?,
            session_token: self.session_token().await?,
            expires_at: None,
        })
    }
}

/// Signing credential that always reflects the source's current values.
///
/// Only the source handle and the fixed `host`, `region` and `service`
/// are stored. Cloning is cheap and clones share the source.
///
/// # Example
///
/// ```
/// use searchauth::backends::mock::MockCredentialSource;
/// use searchauth::RefreshableCredentials;
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> searchauth::Result<()> {
///     let source = Arc::new(MockCredentialSource::new());
///     let creds = RefreshableCredentials::new(
///         source,
///         "search.example.com",
///         "us-east-1",
///         "es",
///     );
///
///     let first = creds.access_key().await?;
///     let second = creds.access_key().await?;
///     assert_ne!(first, second);
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct RefreshableCredentials {
    source: Arc<dyn CredentialSource>,
    host: String,
    region: String,
    service: String,
}

impl RefreshableCredentials {
    /// Binds a credential source to a request target.
    pub fn new(
        source: Arc<dyn CredentialSource>,
        host: impl Into<String>,
        region: impl Into<String>,
        service: impl Into<String>,
    ) -> Self {
        Self {
            source,
            host: host.into(),
            region: region.into(),
            service: service.into(),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    /// Reads the current access key from the source.
    pub async fn access_key(&self) -> Result<String> {
        self.source.access_key().await
    }

    /// Reads the current secret key from the source.
    pub async fn secret_key(&self) -> Result<String> {
        self.source.secret_key().await
    }

    /// Reads the current session token from the source.
    pub async fn session_token(&self) -> Result<Option<String>> {
        self.source.session_token().await
    }

    /// Reads a coherent snapshot of the current credentials.
    pub async fn credentials(&self) -> Result<Credentials> {
        self.source.credentials().await
    }

    /// Returns the shared credential source.
    pub fn source(&self) -> &Arc<dyn CredentialSource> {
        &self.source
    }
}

impl fmt::Debug for RefreshableCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshableCredentials")
            .field("host", &self.host)
            .field("region", &self.region)
            .field("service", &self.service)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AuthError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct RotatingSource {
        reads: AtomicUsize,
    }

    #[async_trait]
    impl CredentialSource for RotatingSource {
        async fn access_key(&self) -> Result<String> {
            let n = self.reads.fetch_add(1, Ordering::SeqCst);
            Ok(format!("AKIA{}", n))
        }

        async fn secret_key(&self) -> Result<String> {
            Ok("secret".to_string())
        }

        async fn session_token(&self) -> Result<Option<String>> {
            Ok(None)
        }
    }

    struct RevokedSource;

    #[async_trait]
    impl CredentialSource for RevokedSource {
        async fn access_key(&self) -> Result<String> {
            Err(AuthError::CredentialRefresh("role revoked".to_string()))
        }

        async fn secret_key(&self) -> Result<String> {
            Err(AuthError::CredentialRefresh("role revoked".to_string()))
        }

        async fn session_token(&self) -> Result<Option<String>> {
            Err(AuthError::CredentialRefresh("role revoked".to_string()))
        }
    }

    #[tokio::test]
    async fn test_reads_are_never_cached() {
        let source = Arc::new(RotatingSource {
            reads: AtomicUsize::new(0),
        });
        let creds = RefreshableCredentials::new(source.clone(), "host", "eu-west-1", "es");

        assert_eq!(creds.access_key().await.unwrap(), "AKIA0");
        assert_eq!(creds.access_key().await.unwrap(), "AKIA1");
        assert_eq!(source.reads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_clones_share_source() {
        let source = Arc::new(RotatingSource {
            reads: AtomicUsize::new(0),
        });
        let creds = RefreshableCredentials::new(source, "host", "eu-west-1", "es");
        let copy = creds.clone();

        creds.access_key().await.unwrap();
        assert_eq!(copy.access_key().await.unwrap(), "AKIA1");
        assert!(Arc::ptr_eq(creds.source(), copy.source()));
    }

    #[tokio::test]
    async fn test_default_snapshot_reads_all_fields() {
        let source = Arc::new(RotatingSource {
            reads: AtomicUsize::new(0),
        });
        let creds = RefreshableCredentials::new(source, "host", "eu-west-1", "es");

        let snapshot = creds.credentials().await.unwrap();
        assert_eq!(snapshot.access_key, "AKIA0");
        assert_eq!(snapshot.secret_key, "secret");
        assert_eq!(snapshot.session_token, None);
    }

    #[tokio::test]
    async fn test_refresh_failure_surfaces_at_read() {
        let creds = RefreshableCredentials::new(Arc::new(RevokedSource), "host", "us-east-1", "es");

        assert_eq!(creds.host(), "host");
        let err = creds.secret_key().await.unwrap_err();
        assert!(err.is_credential_refresh());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let creds = Credentials::new("AKIDEXAMPLE", "super-secret", Some("token".into()), None);
        let debug = format!("{:?}", creds);

        assert!(debug.contains("AKIDEXAMPLE"));
        assert!(!debug.contains("super-secret"));
        assert!(!debug.contains("\"token\""));
    }
}
