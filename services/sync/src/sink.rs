use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};

use crate::transform::ActionEvent;

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("HTTP {status}: {body}")]
    HttpError { status: StatusCode, body: String },

    #[error("request failed: {0}")]
    RequestError(#[from] reqwest::Error),
}

/// Downstream analytics sink. Delivery is at-least-once; a resubmitted batch
/// must be a no-op on the receiving side.
#[async_trait]
pub trait ActionSink: Send + Sync {
    async fn submit_batch(&self, events: Vec<ActionEvent>) -> Result<(), SinkError>;
}

/// HTTP sink posting each batch as one JSON array.
pub struct HttpSink {
    client: Client,
    url: String,
}

impl HttpSink {
    pub fn new(url: &str, timeout_secs: u64) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl ActionSink for HttpSink {
    async fn submit_batch(&self, events: Vec<ActionEvent>) -> Result<(), SinkError> {
        let response = self.client.post(&self.url).json(&events).send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SinkError::HttpError { status, body });
        }

        Ok(())
    }
}
