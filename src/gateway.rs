//! Client side of the completion gateway: one prompt in, one reply out.

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, instrument};

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("gateway request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("gateway returned {status}: {message}")]
    Status { status: StatusCode, message: String },
    #[error("gateway response was malformed: {0}")]
    MalformedPayload(String),
    #[error("gateway did not answer within {0:?}")]
    Timeout(Duration),
}

/// Wire format shared by the gateway client and server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatReply {
    pub reply: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatError {
    pub error: String,
}

#[async_trait]
pub trait CompletionGateway: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, GatewayError>;
}

/// Posts `{ "message": ... }` to a gateway URL and reads back `{ "reply": ... }`.
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    url: String,
}

impl HttpGateway {
    pub fn new(url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), url)
    }

    pub fn with_client(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl CompletionGateway for HttpGateway {
    #[instrument(skip(self, prompt), fields(url = %self.url, prompt_len = prompt.len()))]
    async fn complete(&self, prompt: &str) -> Result<String, GatewayError> {
        let response = self
            .client
            .post(&self.url)
            .json(&ChatRequest {
                message: prompt.to_string(),
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            let message = serde_json::from_str::<ChatError>(&body)
                .map(|e| e.error)
                .unwrap_or(body);
            error!(%status, %message, "Gateway request failed");
            return Err(GatewayError::Status { status, message });
        }

        let body = response.text().await?;
        let reply = serde_json::from_str::<ChatReply>(&body)
            .map_err(|e| GatewayError::MalformedPayload(e.to_string()))?;

        debug!(reply_len = reply.reply.len(), "Received gateway reply");
        Ok(reply.reply)
    }
}
