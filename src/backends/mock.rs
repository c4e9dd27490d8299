//! Mock session backend for testing.
//!
//! Provides an in-memory [`SessionFactory`] and [`CredentialSource`] with
//! counters and error injection, for testing code that uses searchauth
//! without touching a cloud provider.

use crate::{AuthError, CredentialSource, Credentials, Result, SessionFactory, SigningSession};
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Region reported by mock sessions created without an explicit region.
pub const MOCK_DEFAULT_REGION: &str = "us-east-1";

/// Rebuilds an injected error so it can be returned more than once.
fn replay(err: &AuthError) -> AuthError {
    match err {
        AuthError::SessionConstruction(msg) => AuthError::SessionConstruction(msg.clone()),
        AuthError::CredentialRefresh(msg) => AuthError::CredentialRefresh(msg.clone()),
        AuthError::Other(e) => AuthError::Other(anyhow::anyhow!("{}", e)),
    }
}

/// Credential source whose values rotate on every read.
///
/// Each accessor call increments a shared counter, and the returned values
/// embed it, so two reads never return the same access key. This makes
/// stale snapshots visible in tests.
///
/// # Example
///
/// ```
/// use searchauth::backends::mock::MockCredentialSource;
/// use searchauth::CredentialSource;
///
/// #[tokio::main]
/// async fn main() -> searchauth::Result<()> {
///     let source = MockCredentialSource::new();
///     assert_eq!(source.access_key().await?, "MOCKACCESSKEY1");
///     assert_eq!(source.access_key().await?, "MOCKACCESSKEY2");
///     assert_eq!(source.reads(), 2);
///     Ok(())
/// }
/// ```
#[derive(Default)]
pub struct MockCredentialSource {
    reads: AtomicUsize,

    /// Error to return from every accessor
    pub refresh_error: Option<AuthError>,
}

impl MockCredentialSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of accessor reads so far.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    fn next_generation(&self) -> Result<usize> {
        if let Some(ref err) = self.refresh_error {
            return Err(replay(err));
        }
        Ok(self.reads.fetch_add(1, Ordering::SeqCst) + 1)
    }
}

#[async_trait]
impl CredentialSource for MockCredentialSource {
    async fn access_key(&self) -> Result<String> {
        let generation = self.next_generation()?;
        Ok(format!("MOCKACCESSKEY{}", generation))
    }

    async fn secret_key(&self) -> Result<String> {
        let generation = self.next_generation()?;
        Ok(format!("mock-secret-key-{}", generation))
    }

    async fn session_token(&self) -> Result<Option<String>> {
        let generation = self.next_generation()?;
        Ok(Some(format!("mock-session-token-{}", generation)))
    }

    async fn credentials(&self) -> Result<Credentials> {
        let generation = self.next_generation()?;
        Ok(Credentials::new(
            format!("MOCKACCESSKEY{}", generation),
            format!("mock-secret-key-{}", generation),
            Some(format!("mock-session-token-{}", generation)),
            Some(Utc::now() + ChronoDuration::minutes(60)),
        ))
    }
}

/// Session factory that counts constructions.
///
/// Every session gets its own [`MockCredentialSource`]. Sessions created
/// without a region report [`MOCK_DEFAULT_REGION`], mimicking an SDK that
/// resolves the region from ambient configuration.
///
/// # Example
///
/// ```
/// use searchauth::backends::mock::MockSessionFactory;
/// use searchauth::{AuthError, SessionFactory};
///
/// #[tokio::main]
/// async fn main() {
///     let mut factory = MockSessionFactory::new();
///     factory.create_error = Some(AuthError::SessionConstruction("no credentials".into()));
///
///     let result = factory.create_session(Some("us-east-1"), None).await;
///     assert!(result.is_err());
/// }
/// ```
#[derive(Default)]
pub struct MockSessionFactory {
    created: AtomicUsize,
    delay: Option<Duration>,

    /// Error to return from `create_session()`
    pub create_error: Option<AuthError>,
    /// Error injected into the credential source of every new session
    pub refresh_error: Option<AuthError>,
}

impl MockSessionFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every construction take `delay`, to widen race windows.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of sessions constructed successfully.
    pub fn sessions_created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionFactory for MockSessionFactory {
    async fn create_session(
        &self,
        region: Option<&str>,
        profile: Option<&str>,
    ) -> Result<SigningSession> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(ref err) = self.create_error {
            return Err(replay(err));
        }

        let source = MockCredentialSource {
            reads: AtomicUsize::new(0),
            refresh_error: self.refresh_error.as_ref().map(replay),
        };

        self.created.fetch_add(1, Ordering::SeqCst);

        Ok(SigningSession::new(
            Some(region.unwrap_or(MOCK_DEFAULT_REGION).to_string()),
            profile.map(str::to_string),
            Arc::new(source),
        ))
    }
}
