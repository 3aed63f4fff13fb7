//! Authorization service interface and its Arcade implementation

use async_trait::async_trait;
use tracing::debug;

use tollgate_arcade::{ArcadeClient, AuthorizationStatus};

use crate::error::{Error, Result};
use crate::interrupt::AuthChallenge;

/// Outcome of checking a tool's authorization for a user
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthCheck {
    /// The user already granted access
    Authorized,
    /// The user must complete the challenge first
    Required(AuthChallenge),
}

/// Issues per-tool authorization challenges and waits on them
#[async_trait]
pub trait AuthorizationService: Send + Sync {
    /// Check a tool for a user, starting a challenge if access is missing
    async fn authorize(&self, tool_name: &str, user_id: &str) -> Result<AuthCheck>;

    /// Block until the challenge completes. No deadline is applied.
    async fn wait_for_completion(&self, challenge_id: &str) -> Result<()>;
}

/// Arcade-backed authorization
#[derive(Clone)]
pub struct ArcadeAuthorizer {
    client: ArcadeClient,
}

impl ArcadeAuthorizer {
    pub fn new(client: ArcadeClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl AuthorizationService for ArcadeAuthorizer {
    async fn authorize(&self, tool_name: &str, user_id: &str) -> Result<AuthCheck> {
        let response = self.client.authorize(tool_name, user_id).await?;
        debug!(tool_name, status = %response.status, "Authorization status");

        match response.status {
            AuthorizationStatus::Completed => Ok(AuthCheck::Authorized),
            AuthorizationStatus::Failed => Err(Error::Authorization(format!(
                "Authorization for {} failed",
                tool_name
            ))),
            AuthorizationStatus::NotStarted | AuthorizationStatus::Pending => {
                let id = response.id.ok_or_else(|| {
                    Error::Authorization(format!(
                        "Authorization for {} is pending but has no id",
                        tool_name
                    ))
                })?;
                Ok(AuthCheck::Required(AuthChallenge {
                    id,
                    url: response.url.unwrap_or_default(),
                }))
            }
        }
    }

    async fn wait_for_completion(&self, challenge_id: &str) -> Result<()> {
        self.client.wait_for_completion(challenge_id).await?;
        Ok(())
    }
}
