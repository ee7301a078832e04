//! Application state shared across request handlers.

use std::sync::Arc;

use async_trait::async_trait;
use incident_core::{ChatPlatform, IncidentService, PlatformResult};

use crate::config::BotConfig;
use crate::signature::SignatureVerifier;
use crate::slack::SlackClient;

/// A chat platform the server can run on.
#[async_trait]
pub trait BotPlatform: ChatPlatform + 'static {
    /// Check that the platform is reachable and accepts our credentials.
    async fn health_check(&self) -> PlatformResult<()>;
}

#[async_trait]
impl BotPlatform for SlackClient {
    async fn health_check(&self) -> PlatformResult<()> {
        self.auth_test().await.map(|_| ())
    }
}

/// Application state shared across request handlers.
pub struct AppState<P> {
    /// Incident operations.
    pub service: IncidentService<P>,
    /// Verifies inbound Slack signatures.
    pub verifier: Arc<SignatureVerifier>,
}

impl<P> std::fmt::Debug for AppState<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("verifier", &self.verifier)
            .finish_non_exhaustive()
    }
}

impl<P: BotPlatform> AppState<P> {
    pub fn new(platform: P, config: &BotConfig) -> Self {
        Self {
            service: IncidentService::new(platform).with_private_channels(config.private_channels),
            verifier: Arc::new(SignatureVerifier::new(
                config.signing_secret(),
                config.request_max_age,
            )),
        }
    }
}

impl AppState<SlackClient> {
    /// State backed by the Slack Web API.
    pub fn slack(config: &BotConfig) -> PlatformResult<Self> {
        Ok(Self::new(SlackClient::new(config)?, config))
    }
}

#[cfg(test)]
#[async_trait]
impl BotPlatform for incident_core::testing::MemoryPlatform {
    async fn health_check(&self) -> PlatformResult<()> {
        Ok(())
    }
}
