//! Basic usage example.
//!
//! Resolves authorization once, holds on to the result, and reads the
//! signing credentials later, the way a retried request would.
//!
//! Run with: cargo run --example basic

use searchauth::backends::mock::MockSessionFactory;
use searchauth::{AuthConfig, AuthProvider, Authorization, SessionCache};
use std::sync::Arc;
use std::time::Duration;

#[tokio::main]
async fn main() -> searchauth::Result<()> {
    println!("=== searchauth Basic Example ===\n");

    // One cache for the whole process
    let cache = Arc::new(SessionCache::new(Arc::new(MockSessionFactory::new())));
    let provider = AuthProvider::new(cache.clone());

    println!("1. Static credentials...");
    let config = AuthConfig::new("localhost:9200").with_basic_auth("elastic", "changeme");
    let auth = provider.resolve_config(&config).await?;
    if let Some(header) = auth.basic_header() {
        println!("   ✓ Authorization: {}", header);
    }

    println!("\n2. Request signing...");
    let config = AuthConfig::new("search-alerts.us-east-1.es.amazonaws.com")
        .with_region("us-east-1")
        .with_profile("alerting");
    let auth = provider.resolve_config(&config).await?;

    let Authorization::Signing(creds) = auth else {
        println!("   ✗ No signing credentials");
        return Ok(());
    };
    println!("   ✓ {} / {} / {}", creds.host(), creds.region(), creds.service());

    println!("\n3. Signing later...");
    tokio::time::sleep(Duration::from_millis(100)).await;
    for attempt in 1..=2 {
        let current = creds.credentials().await?;
        println!("   attempt {}: access key {}", attempt, current.access_key);
    }

    println!("\n4. Resolving again reuses the cached session...");
    provider.resolve_config(&config).await?;
    println!("   ✓ {} cached session(s)", cache.len().await);

    Ok(())
}
