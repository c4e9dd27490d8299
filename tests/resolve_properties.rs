//! End-to-end behaviour of `AuthProvider` over a shared `SessionCache`.

#![cfg(feature = "mock")]

use futures::future::join_all;
use searchauth::backends::mock::MockSessionFactory;
use searchauth::{AuthProvider, Authorization, Identity, IdentityScope, SessionCache};
use std::sync::Arc;
use std::time::Duration;

fn setup(factory: MockSessionFactory) -> (Arc<MockSessionFactory>, Arc<SessionCache>, AuthProvider) {
    let factory = Arc::new(factory);
    let cache = Arc::new(SessionCache::new(factory.clone()));
    let provider = AuthProvider::new(cache.clone()).with_default_region(None);
    (factory, cache, provider)
}

#[tokio::test]
async fn test_basic_auth_string() {
    let (_, _, provider) = setup(MockSessionFactory::new());

    let auth = provider
        .resolve("host", Some("user"), Some("pass"), None, None)
        .await
        .unwrap();

    assert!(matches!(auth, Authorization::Basic(ref s) if s == "user:pass"));
}

#[tokio::test]
async fn test_empty_credentials_without_region() {
    let (_, _, provider) = setup(MockSessionFactory::new());

    let auth = provider.resolve("host", Some(""), Some(""), None, None).await.unwrap();

    assert!(auth.is_none());
}

#[tokio::test]
async fn test_signing_adapter_reads_live_values() {
    let (_, _, provider) = setup(MockSessionFactory::new());

    let auth = provider
        .resolve("host", None, None, Some("us-east-1"), Some("default"))
        .await
        .unwrap();

    let Authorization::Signing(creds) = auth else {
        panic!("expected signing credentials");
    };
    assert_eq!(creds.region(), "us-east-1");
    assert_eq!(creds.service(), "es");

    // Held for a while, as a retried request would
    tokio::time::sleep(Duration::from_millis(10)).await;

    let first = creds.access_key().await.unwrap();
    let second = creds.access_key().await.unwrap();
    assert_ne!(first, second);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_resolve_constructs_once() {
    let (factory, cache, provider) = setup(MockSessionFactory::new().with_delay(Duration::from_millis(25)));
    let worker = Identity::new("worker-0");

    let calls = (0..16).map(|_| {
        provider.resolve_as(&worker, "host", None, None, Some("eu-west-1"), Some("alerts"))
    });
    let results = join_all(calls).await;

    assert!(results.iter().all(|r| r.is_ok()));
    assert_eq!(factory.sessions_created(), 1);
    assert_eq!(cache.len().await, 1);
}

#[tokio::test]
async fn test_identities_partition_cache() {
    let (factory, cache, provider) = setup(MockSessionFactory::new());

    for worker in ["worker-0", "worker-1", "worker-2"] {
        for _ in 0..2 {
            provider
                .resolve_as(&Identity::new(worker), "host", None, None, Some("us-east-1"), None)
                .await
                .unwrap();
        }
    }

    assert_eq!(factory.sessions_created(), 3);
    assert_eq!(cache.len().await, 3);
}

#[tokio::test]
async fn test_providers_share_one_cache() {
    let (factory, cache, first) = setup(MockSessionFactory::new());
    let second = AuthProvider::new(cache)
        .with_default_region(None)
        .with_identity_scope(IdentityScope::Shared);
    let first = first.with_identity_scope(IdentityScope::Shared);

    first.resolve("a", None, None, Some("us-east-1"), None).await.unwrap();
    second.resolve("b", None, None, Some("us-east-1"), None).await.unwrap();

    assert_eq!(factory.sessions_created(), 1);
}

#[tokio::test]
async fn test_refresh_failure_surfaces_at_signing_time() {
    let mut factory = MockSessionFactory::new();
    factory.refresh_error = Some(searchauth::AuthError::CredentialRefresh(
        "role trust revoked".to_string(),
    ));
    let (_, _, provider) = setup(factory);

    let auth = provider
        .resolve("host", None, None, Some("us-east-1"), None)
        .await
        .expect("resolve does not read credentials");

    let err = auth.as_signing().unwrap().credentials().await.unwrap_err();
    assert!(err.is_credential_refresh());
}
