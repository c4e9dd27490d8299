//! AWS signing-session backend.
//!
//! Builds signing sessions from the AWS SDK's shared configuration and
//! default credential provider chain.
//!
//! # Requirements
//!
//! - AWS credentials configured via:
//!   - Environment variables (`AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY`)
//!   - Shared credentials file (`~/.aws/credentials`) and named profiles
//!   - IAM instance or task role (for EC2/ECS)
//!   - Web identity / assumed roles configured in a profile
//!
//! # Features
//!
//! - Native SDK integration
//! - Credential refresh ahead of expiry
//! - Region resolution from explicit value, profile or environment
//!
//! # Example
//!
//! ```no_run
//! use searchauth::backends::aws::AwsSessionFactory;
//! use searchauth::{AuthProvider, Authorization, SessionCache};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> searchauth::Result<()> {
//!     let cache = Arc::new(SessionCache::new(Arc::new(AwsSessionFactory::new())));
//!     let provider = AuthProvider::new(cache);
//!
//!     let auth = provider
//!         .resolve("search.example.com", None, None, Some("us-west-2"), Some("default"))
//!         .await?;
//!
//!     if let Authorization::Signing(creds) = auth {
//!         let current = creds.credentials().await?;
//!         println!("signing {} with {}", creds.host(), current.access_key);
//!     }
//!     Ok(())
//! }
//! ```

mod session;
mod source;

pub use session::AwsSessionFactory;
pub use source::{AwsCredentialSource, DEFAULT_REFRESH_WINDOW};
