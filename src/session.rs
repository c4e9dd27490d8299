//! Signing sessions and the session cache.
//!
//! Building a session (loading shared config, resolving a credential
//! provider chain) is expensive, so sessions are memoized per
//! [`CacheKey`] in a [`SessionCache`]. Entries are created on the first
//! miss and kept for the lifetime of the cache; only the credentials
//! behind a session refresh, never the session itself.

use crate::{CredentialSource, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Handle bound to a region/profile pair that exposes live credentials.
///
/// Sessions are produced by a [`SessionFactory`] and never mutated after
/// creation.
#[derive(Clone)]
pub struct SigningSession {
    region: Option<String>,
    profile: Option<String>,
    credentials: Arc<dyn CredentialSource>,
}

impl SigningSession {
    /// Creates a session.
    ///
    /// `region` is the region the factory resolved, which may differ from
    /// the region that was requested.
    pub fn new(
        region: Option<String>,
        profile: Option<String>,
        credentials: Arc<dyn CredentialSource>,
    ) -> Self {
        Self {
            region,
            profile,
            credentials,
        }
    }

    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    pub fn profile(&self) -> Option<&str> {
        self.profile.as_deref()
    }

    /// Returns the auto-refreshing credential source.
    pub fn credentials(&self) -> Arc<dyn CredentialSource> {
        Arc::clone(&self.credentials)
    }
}

impl fmt::Debug for SigningSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningSession")
            .field("region", &self.region)
            .field("profile", &self.profile)
            .finish_non_exhaustive()
    }
}

/// Builds signing sessions.
///
/// # Errors
///
/// Implementations return [`AuthError::SessionConstruction`](crate::AuthError::SessionConstruction)
/// when the profile is unknown or no credentials can be discovered. The
/// cache propagates these errors unchanged.
#[async_trait]
pub trait SessionFactory: Send + Sync {
    /// Creates a session for the given region and profile.
    async fn create_session(
        &self,
        region: Option<&str>,
        profile: Option<&str>,
    ) -> Result<SigningSession>;
}

/// Caller identity component of a [`CacheKey`].
///
/// Two callers with different identities never share a cached session,
/// even for the same region and profile.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Identity(String);

impl Identity {
    /// Creates an identity from an explicit label (e.g. a worker name).
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    /// Identity of the calling OS thread.
    pub fn current_thread() -> Self {
        Self(format!("{:?}", std::thread::current().id()))
    }

    /// A fresh identity that no other caller shares.
    pub fn unique() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// The identity shared by all callers.
    ///
    /// Using it makes the cache key effectively (region, profile).
    pub fn shared() -> Self {
        Self(String::new())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Key of one cache slot.
///
/// An absent region or profile is distinct from an empty one.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub identity: Identity,
    pub region: Option<String>,
    pub profile: Option<String>,
}

impl CacheKey {
    pub fn new(identity: &Identity, region: Option<&str>, profile: Option<&str>) -> Self {
        Self {
            identity: identity.clone(),
            region: region.map(str::to_string),
            profile: profile.map(str::to_string),
        }
    }
}

/// Append-only cache of signing sessions.
///
/// The cache is an ordinary value: create one at the composition root and
/// share it through an `Arc`.
///
/// # Concurrency
///
/// A single mutex guards the lookup and, on a miss, the factory call and
/// the insert. Concurrent callers with the same key therefore construct
/// the session at most once; the others wait and receive the same `Arc`.
/// The lock is released before the session is returned, so reading
/// credentials or signing never happens under it.
///
/// # Example
///
/// ```
/// use searchauth::backends::mock::MockSessionFactory;
/// use searchauth::session::{Identity, SessionCache};
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> searchauth::Result<()> {
///     let factory = Arc::new(MockSessionFactory::new());
///     let cache = SessionCache::new(factory.clone());
///     let worker = Identity::new("worker-1");
///
///     let first = cache.get_or_create(&worker, Some("us-east-1"), None).await?;
///     let again = cache.get_or_create(&worker, Some("us-east-1"), None).await?;
///
///     assert!(Arc::ptr_eq(&first, &again));
///     assert_eq!(factory.sessions_created(), 1);
///     Ok(())
/// }
/// ```
pub struct SessionCache {
    factory: Arc<dyn SessionFactory>,
    sessions: Mutex<HashMap<CacheKey, Arc<SigningSession>>>,
}

impl SessionCache {
    /// Creates an empty cache backed by `factory`.
    pub fn new(factory: Arc<dyn SessionFactory>) -> Self {
        Self {
            factory,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the cached session for the key, creating it on a miss.
    ///
    /// # Errors
    ///
    /// Returns whatever the factory returns when construction fails. A
    /// failed construction leaves no entry behind.
    pub async fn get_or_create(
        &self,
        identity: &Identity,
        region: Option<&str>,
        profile: Option<&str>,
    ) -> Result<Arc<SigningSession>> {
        let key = CacheKey::new(identity, region, profile);

        let mut sessions = self.sessions.lock().await;
        if let Some(session) = sessions.get(&key) {
            tracing::trace!(identity = %key.identity, ?region, ?profile, "signing session cache hit");
            return Ok(Arc::clone(session));
        }

        tracing::debug!(identity = %key.identity, ?region, ?profile, "creating signing session");
        let session = match self.factory.create_session(region, profile).await {
            Ok(session) => Arc::new(session),
            Err(e) => {
                tracing::debug!(?region, ?profile, error = %e, "signing session construction failed");
                return Err(e);
            }
        };

        sessions.insert(key, Arc::clone(&session));
        Ok(session)
    }

    /// Returns true if a session is cached under `key`.
    pub async fn contains(&self, key: &CacheKey) -> bool {
        self.sessions.lock().await.contains_key(key)
    }

    /// Number of cached sessions.
    pub async fn len(&self) -> usize {
        self.sessions.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

impl fmt::Debug for SessionCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionCache").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::mock::MockSessionFactory;
    use crate::AuthError;
    use std::time::Duration;

    fn cache_with_mock() -> (Arc<MockSessionFactory>, SessionCache) {
        let factory = Arc::new(MockSessionFactory::new());
        let cache = SessionCache::new(factory.clone());
        (factory, cache)
    }

    #[tokio::test]
    async fn test_same_key_returns_same_session() {
        let (factory, cache) = cache_with_mock();
        let identity = Identity::new("worker-1");

        let pairs = [
            (None, None),
            (Some("us-east-1"), None),
            (None, Some("default")),
            (Some("eu-west-1"), Some("prod")),
        ];

        for (region, profile) in pairs {
            let first = cache.get_or_create(&identity, region, profile).await.unwrap();
            let second = cache.get_or_create(&identity, region, profile).await.unwrap();
            assert!(Arc::ptr_eq(&first, &second));
        }

        assert_eq!(factory.sessions_created(), pairs.len());
        assert_eq!(cache.len().await, pairs.len());
    }

    #[tokio::test]
    async fn test_absent_and_empty_are_distinct_keys() {
        let (factory, cache) = cache_with_mock();
        let identity = Identity::shared();

        let absent = cache.get_or_create(&identity, None, None).await.unwrap();
        let empty = cache.get_or_create(&identity, Some(""), Some("")).await.unwrap();

        assert!(!Arc::ptr_eq(&absent, &empty));
        assert_eq!(factory.sessions_created(), 2);
        assert!(cache.contains(&CacheKey::new(&identity, Some(""), Some(""))).await);
    }

    #[tokio::test]
    async fn test_distinct_identities_get_distinct_sessions() {
        let (factory, cache) = cache_with_mock();

        let a = cache
            .get_or_create(&Identity::new("a"), Some("us-east-1"), Some("default"))
            .await
            .unwrap();
        let b = cache
            .get_or_create(&Identity::new("b"), Some("us-east-1"), Some("default"))
            .await
            .unwrap();

        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(factory.sessions_created(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_same_key_constructs_once() {
        let factory = Arc::new(MockSessionFactory::new().with_delay(Duration::from_millis(50)));
        let cache = Arc::new(SessionCache::new(factory.clone()));
        let identity = Identity::new("pool");

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = Arc::clone(&cache);
            let identity = identity.clone();
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_create(&identity, Some("us-west-2"), Some("default"))
                    .await
                    .unwrap()
            }));
        }

        let mut sessions = Vec::new();
        for handle in handles {
            sessions.push(handle.await.unwrap());
        }

        assert_eq!(factory.sessions_created(), 1);
        assert!(sessions.iter().all(|s| Arc::ptr_eq(s, &sessions[0])));
    }

    #[tokio::test]
    async fn test_construction_failure_propagates_and_is_not_cached() {
        let mut factory = MockSessionFactory::new();
        factory.create_error = Some(AuthError::SessionConstruction(
            "profile not found: missing".to_string(),
        ));
        let factory = Arc::new(factory);
        let cache = SessionCache::new(factory.clone());

        let err = cache
            .get_or_create(&Identity::shared(), None, Some("missing"))
            .await
            .unwrap_err();

        assert!(err.is_session_construction());
        assert!(err.to_string().contains("profile not found: missing"));
        assert!(cache.is_empty().await);
        assert_eq!(factory.sessions_created(), 0);
    }

    #[test]
    fn test_identity_constructors() {
        assert_eq!(Identity::shared().as_str(), "");
        assert_ne!(Identity::unique(), Identity::unique());
        assert_eq!(Identity::current_thread(), Identity::current_thread());
        assert_eq!(Identity::new("w1").to_string(), "w1");
    }

    #[test]
    fn test_thread_identities_differ() {
        let here = Identity::current_thread();
        let there = std::thread::spawn(Identity::current_thread).join().unwrap();
        assert_ne!(here, there);
    }
}
