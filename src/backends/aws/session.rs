//! AWS signing-session factory.

use crate::backends::aws::AwsCredentialSource;
use crate::{AuthError, Result, SessionFactory, SigningSession};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Builds sessions from `aws_config` shared configuration.
///
/// Each session owns its own [`AwsCredentialSource`]. The source is primed
/// once during construction so that unknown profiles and missing
/// credentials fail here rather than at signing time.
#[derive(Debug, Clone)]
pub struct AwsSessionFactory {
    endpoint: Option<String>,
    refresh_window: Duration,
}

impl AwsSessionFactory {
    pub fn new() -> Self {
        Self {
            endpoint: None,
            refresh_window: super::DEFAULT_REFRESH_WINDOW,
        }
    }

    /// Overrides the endpoint used by credential providers that call AWS
    /// services (for LocalStack testing).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    /// Sets how long before expiry credentials are refreshed.
    pub fn with_refresh_window(mut self, window: Duration) -> Self {
        self.refresh_window = window;
        self
    }
}

impl Default for AwsSessionFactory {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionFactory for AwsSessionFactory {
    async fn create_session(
        &self,
        region: Option<&str>,
        profile: Option<&str>,
    ) -> Result<SigningSession> {
        let mut config_loader = aws_config::defaults(aws_config::BehaviorVersion::latest());

        if let Some(region) = region {
            config_loader = config_loader.region(aws_config::Region::new(region.to_string()));
        }

        if let Some(profile) = profile {
            config_loader = config_loader.profile_name(profile);
        }

        if let Some(ref endpoint) = self.endpoint {
            config_loader = config_loader.endpoint_url(endpoint);
        }

        let config = config_loader.load().await;

        let provider = config.credentials_provider().ok_or_else(|| {
            AuthError::SessionConstruction(format!(
                "no credentials provider for profile {}",
                profile.unwrap_or("default")
            ))
        })?;

        let source = AwsCredentialSource::new(provider).with_refresh_window(self.refresh_window);
        source.current().await.map_err(|e| {
            AuthError::SessionConstruction(format!(
                "unable to load credentials for profile {}: {}",
                profile.unwrap_or("default"),
                e
            ))
        })?;

        let resolved_region = config.region().map(|r| r.as_ref().to_string());
        tracing::debug!(
            requested = ?region,
            resolved = ?resolved_region,
            ?profile,
            "loaded AWS signing session"
        );

        Ok(SigningSession::new(
            resolved_region,
            profile.map(str::to_string),
            Arc::new(source),
        ))
    }
}
