//! Refreshing credential source over an AWS SDK credentials provider.

use crate::{AuthError, CredentialSource, Credentials, Result};
use async_trait::async_trait;
use aws_credential_types::provider::{ProvideCredentials, SharedCredentialsProvider};
use chrono::{DateTime, Utc};
use std::time::{Duration, SystemTime};
use tokio::sync::RwLock;

/// Credentials expiring within this window are refreshed before use.
pub const DEFAULT_REFRESH_WINDOW: Duration = Duration::from_secs(15 * 60);

/// Credential source backed by an SDK credentials provider.
///
/// The last credentials are kept and reused until they come within the
/// refresh window of their expiry. Credentials without an expiry (static
/// keys) are loaded once. If a refresh fails while the cached credentials
/// have not yet expired, the cached credentials are still served.
///
/// Credentials whose whole lifetime is at or below the refresh window
/// (e.g. 15-minute assumed-role sessions with the default window) are
/// always inside it, so every read goes back to the provider. Use
/// [`with_refresh_window`](Self::with_refresh_window) with a shorter window
/// for such sources.
#[derive(Debug)]
pub struct AwsCredentialSource {
    provider: SharedCredentialsProvider,
    cached: RwLock<Option<aws_credential_types::Credentials>>,
    refresh_window: Duration,
}

impl AwsCredentialSource {
    pub fn new(provider: SharedCredentialsProvider) -> Self {
        Self {
            provider,
            cached: RwLock::new(None),
            refresh_window: DEFAULT_REFRESH_WINDOW,
        }
    }

    pub fn with_refresh_window(mut self, window: Duration) -> Self {
        self.refresh_window = window;
        self
    }

    fn needs_refresh(&self, creds: &aws_credential_types::Credentials, now: SystemTime) -> bool {
        match creds.expiry() {
            None => false,
            Some(expiry) => match expiry.duration_since(now) {
                Ok(remaining) => remaining <= self.refresh_window,
                Err(_) => true,
            },
        }
    }

    /// Returns current SDK credentials, refreshing them if needed.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::CredentialRefresh`] if the provider fails and
    /// no unexpired credentials are cached.
    pub async fn current(&self) -> Result<aws_credential_types::Credentials> {
        {
            let cached = self.cached.read().await;
            if let Some(creds) = cached.as_ref() {
                if !self.needs_refresh(creds, SystemTime::now()) {
                    return Ok(creds.clone());
                }
            }
        }

        let mut cached = self.cached.write().await;
        let now = SystemTime::now();
        if let Some(creds) = cached.as_ref() {
            if !self.needs_refresh(creds, now) {
                return Ok(creds.clone());
            }
        }

        tracing::debug!("refreshing AWS credentials");
        match self.provider.provide_credentials().await {
            Ok(creds) => {
                *cached = Some(creds.clone());
                Ok(creds)
            }
            Err(e) => {
                let still_valid = cached
                    .as_ref()
                    .filter(|c| c.expiry().map_or(true, |expiry| expiry > now));
                match still_valid {
                    Some(creds) => {
                        tracing::warn!(error = %e, "credential refresh failed, using unexpired credentials");
                        Ok(creds.clone())
                    }
                    None => Err(AuthError::CredentialRefresh(e.to_string())),
                }
            }
        }
    }
}

#[async_trait]
impl CredentialSource for AwsCredentialSource {
    async fn access_key(&self) -> Result<String> {
        Ok(self.current().await?.access_key_id().to_string())
    }

    async fn secret_key(&self) -> Result<String> {
        Ok(self.current().await?.secret_access_key().to_string())
    }

    async fn session_token(&self) -> Result<Option<String>> {
        Ok(self.current().await?.session_token().map(str::to_string))
    }

    async fn credentials(&self) -> Result<Credentials> {
        let creds = self.current().await?;
        Ok(Credentials::new(
            creds.access_key_id(),
            creds.secret_access_key(),
            creds.session_token().map(str::to_string),
            creds.expiry().map(DateTime::<Utc>::from),
        ))
    }
}
