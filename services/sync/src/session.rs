use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::hubspot::client::{HubSpotClient, HubSpotClientError};
use beacon_state::models::Account;

#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("token refresh failed: {0}")]
    Auth(String),

    #[error("aborted after {attempts} failed attempts: {last_error}")]
    Aborted { attempts: u32, last_error: String },
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay_ms: 5000,
        }
    }
}

/// Per-account token state for one sync pass. The session holds the single
/// active access token; only `refresh` may replace it, and the new token is
/// written back to the account so it survives persistence.
pub struct Session {
    access_token: String,
    expires_at: DateTime<Utc>,
    policy: RetryPolicy,
}

impl Session {
    /// A new session starts expired, so the first failed call (or an explicit
    /// `refresh`) obtains a real token.
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            access_token: String::new(),
            expires_at: DateTime::<Utc>::MIN_UTC,
            policy,
        }
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Refresh the access token for `account` and record its validity window.
    pub async fn refresh(
        &mut self,
        client: &HubSpotClient,
        account: &mut Account,
    ) -> Result<(), SyncError> {
        let token = client
            .refresh_token(&account.refresh_token)
            .await
            .map_err(|e| SyncError::Auth(e.to_string()))?;

        self.expires_at = Utc::now() + chrono::Duration::seconds(token.expires_in);
        if token.access_token != account.access_token {
            account.access_token = token.access_token.clone();
        }
        self.access_token = token.access_token;

        tracing::debug!(hub_id = account.hub_id, "access token refreshed");
        Ok(())
    }

    /// Run `op` with the current access token, retrying failures with
    /// exponential backoff (`base * 2^attempt`). A token that has passed its
    /// expiry is refreshed between attempts. After `max_attempts` failures
    /// the error is terminal.
    pub async fn with_retry<T, Op, Fut>(
        &mut self,
        client: &HubSpotClient,
        account: &mut Account,
        mut op: Op,
    ) -> Result<T, SyncError>
    where
        Op: FnMut(String) -> Fut,
        Fut: Future<Output = Result<T, HubSpotClientError>>,
    {
        let mut last_error = String::new();

        for attempt in 1..=self.policy.max_attempts {
            match op(self.access_token.clone()).await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    last_error = e.to_string();
                    tracing::warn!(attempt, error = %last_error, "remote call failed");

                    if Utc::now() > self.expires_at {
                        self.refresh(client, account).await?;
                    }

                    if attempt < self.policy.max_attempts {
                        let delay = self.policy.base_delay_ms * (1u64 << attempt);
                        tokio::time::sleep(Duration::from_millis(delay)).await;
                    }
                }
            }
        }

        Err(SyncError::Aborted {
            attempts: self.policy.max_attempts,
            last_error,
        })
    }
}
