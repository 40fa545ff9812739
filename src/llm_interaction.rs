use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, instrument};

use crate::constants;

// Structures matching the OpenAI-compatible /chat/completions endpoint
#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<CompletionMessage<'a>>,
}

#[derive(Serialize)]
struct CompletionMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize, Debug)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize, Debug)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize, Debug)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Deserialize, Debug)]
struct UpstreamErrorBody {
    error: UpstreamError,
}

#[derive(Deserialize, Debug)]
struct UpstreamError {
    message: String,
}

/// Where and how the gateway server reaches the hosted model.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub api_base: String,
    pub api_key: String,
    pub model: String,
    pub system_prompt: String,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            api_base: constants::API_BASE.clone(),
            api_key: constants::OPENAI_API_KEY.clone(),
            model: constants::CHAT_MODEL.clone(),
            system_prompt: constants::SYSTEM_PROMPT.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CompletionClient {
    client: Client,
    config: UpstreamConfig,
}

impl CompletionClient {
    pub fn new(config: UpstreamConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Sends the fixed system instruction plus `message` and returns the
    /// first choice's text.
    #[instrument(skip(self, message), fields(model = %self.config.model))]
    pub async fn complete(&self, message: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.config.api_base.trim_end_matches('/'));
        let payload = CompletionRequest {
            model: &self.config.model,
            messages: vec![
                CompletionMessage {
                    role: "system",
                    content: &self.config.system_prompt,
                },
                CompletionMessage {
                    role: "user",
                    content: message,
                },
            ],
        };

        debug!(message_len = message.len(), "Sending completion request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&payload)
            .send()
            .await
            .context(format!("Failed to send request to completion API at {}", url))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());
            let detail = serde_json::from_str::<UpstreamErrorBody>(&error_body)
                .map(|body| body.error.message)
                .unwrap_or(error_body);
            error!(%status, %detail, "Completion API request failed");
            return Err(anyhow!("Completion API request failed with status {}: {}", status, detail));
        }

        let completion = response
            .json::<CompletionResponse>()
            .await
            .context("Failed to parse JSON response from completion API")?;

        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| anyhow!("Completion API returned no message content"))?;

        debug!(reply_len = content.len(), "Received completion");
        Ok(content)
    }
}
