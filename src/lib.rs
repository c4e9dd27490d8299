//! Searchauth - Authorization for search backend requests.
//!
//! Searchauth decides how outbound requests to an Elasticsearch/OpenSearch
//! cluster are authenticated: static basic auth, no auth, or AWS request
//! signing with credentials that are always current at the moment a
//! request is signed.
//!
//! # Features
//!
//! - **Static credentials win**: username/password always take precedence
//! - **Session caching**: expensive signing sessions are built once per
//!   (identity, region, profile) and reused
//! - **Fresh at read**: signing credentials forward every read to a live,
//!   self-refreshing source instead of holding a snapshot
//! - **Injectable**: the session cache is an ordinary value, and session
//!   construction sits behind a trait
//! - **Feature Flags**: the AWS SDK is only compiled with `aws`
//!
//! # Quick Start
//!
//! ```
//! use searchauth::backends::mock::MockSessionFactory;
//! use searchauth::{AuthProvider, Authorization, SessionCache};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> searchauth::Result<()> {
//!     // One cache per process, shared by every provider
//!     let cache = Arc::new(SessionCache::new(Arc::new(MockSessionFactory::new())));
//!     let provider = AuthProvider::new(cache);
//!
//!     let auth = provider
//!         .resolve("search.example.com", None, None, Some("us-east-1"), None)
//!         .await?;
//!
//!     if let Authorization::Signing(creds) = auth {
//!         // Read at signing time, not before
//!         let current = creds.credentials().await?;
//!         println!("{} {} {}", creds.service(), creds.region(), current.access_key);
//!     }
//!
//!     Ok(())
//! }
//! ```
//!
//! # Session Backends
//!
//! | Backend | Feature Flag | Notes |
//! |---------|-------------|-------|
//! | Mock | `mock` (default) | Counting factory, rotating credentials, error injection |
//! | AWS | `aws` | `aws-config` default credential chain |
//!
//! ```toml
//! [dependencies]
//! searchauth = { version = "0.1", features = ["aws"] }
//! ```

pub mod backends;
pub mod config;
pub mod credentials;
pub mod error;
pub mod provider;
pub mod session;

pub use config::{AuthConfig, IdentityScope};
pub use credentials::{CredentialSource, Credentials, RefreshableCredentials};
pub use error::{AuthError, Result};
pub use provider::{AuthProvider, Authorization};
pub use session::{CacheKey, Identity, SessionCache, SessionFactory, SigningSession};
