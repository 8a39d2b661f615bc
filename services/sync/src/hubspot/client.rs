use std::time::Duration;

use reqwest::{Client, StatusCode};

use super::models::{AssociationsResponse, SearchRequest, SearchResponse, TokenResponse};

#[derive(Debug, Clone)]
pub struct HubSpotClientConfig {
    pub base_url: String,
    pub client_id: String,
    pub client_secret: String,
    pub timeout_secs: u64,
}

#[derive(Clone)]
pub struct HubSpotClient {
    client: Client,
    config: HubSpotClientConfig,
}

#[derive(Debug, thiserror::Error)]
pub enum HubSpotClientError {
    #[error("HTTP {status}: {body}")]
    HttpError { status: StatusCode, body: String },

    #[error("request failed: {0}")]
    RequestError(#[from] reqwest::Error),
}

impl HubSpotClient {
    pub fn new(config: HubSpotClientConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client, config })
    }

    /// For testing: create a client pointing at a specific base URL (e.g., wiremock).
    #[cfg(test)]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.config.base_url = base_url.to_string();
        self
    }

    /// Run one search request against an object collection. Failures are not
    /// retried here; the session wraps every call with the retry policy.
    pub async fn search(
        &self,
        access_token: &str,
        object: &str,
        request: &SearchRequest,
    ) -> Result<SearchResponse, HubSpotClientError> {
        let url = format!("{}/crm/v3/objects/{}/search", self.config.base_url, object);

        let response = self
            .client
            .post(&url)
            .bearer_auth(access_token)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HubSpotClientError::HttpError { status, body });
        }

        response
            .json::<SearchResponse>()
            .await
            .map_err(HubSpotClientError::RequestError)
    }

    /// Exchange the account's refresh token for a fresh access token.
    pub async fn refresh_token(
        &self,
        refresh_token: &str,
    ) -> Result<TokenResponse, HubSpotClientError> {
        let url = format!("{}/oauth/v1/token", self.config.base_url);

        let response = self
            .client
            .post(&url)
            .form(&[
                ("grant_type", "refresh_token"),
                ("client_id", &self.config.client_id),
                ("client_secret", &self.config.client_secret),
                ("refresh_token", refresh_token),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HubSpotClientError::HttpError { status, body });
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(HubSpotClientError::RequestError)
    }

    /// Resolve the contacts associated with one meeting. Callers treat a
    /// failure here as zero attendees.
    pub async fn fetch_meeting_attendees(
        &self,
        access_token: &str,
        meeting_id: &str,
    ) -> Result<Vec<String>, HubSpotClientError> {
        let url = format!(
            "{}/crm/v3/objects/meetings/{}/associations/contacts",
            self.config.base_url, meeting_id
        );

        let response = self
            .client
            .get(&url)
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HubSpotClientError::HttpError { status, body });
        }

        let associations = response
            .json::<AssociationsResponse>()
            .await
            .map_err(HubSpotClientError::RequestError)?;

        Ok(associations.emails())
    }
}
