//! Chat-completion client
//!
//! One client type serves both OpenAI and Perplexity, which share the
//! OpenAI chat-completions wire format.

use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument};

use crate::{
    error::{AppError, AppResult},
    routes::metrics::record_upstream_call,
};

/// Chat message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// Chat message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Chat completion request
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [ChatMessage],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatCompletionChoice {
    message: ChatMessage,
}

#[derive(Debug, Clone, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatCompletionChoice>,
}

/// Sampling options for a completion
#[derive(Debug, Clone, Copy, Default)]
pub struct CompletionOptions {
    pub temperature: Option<f64>,
    pub max_tokens: Option<u32>,
}

/// Client for an OpenAI-compatible chat-completions API
pub struct ChatClient {
    client: reqwest::Client,
    provider: &'static str,
    base_url: String,
    api_key: Option<String>,
    model: String,
}

impl ChatClient {
    pub fn new(
        client: reqwest::Client,
        provider: &'static str,
        base_url: &str,
        api_key: Option<String>,
        model: &str,
    ) -> Self {
        Self {
            client,
            provider,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model: model.to_string(),
        }
    }

    /// Check if the client is configured with an API key
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn provider(&self) -> &'static str {
        self.provider
    }

    /// Run a completion and return the first choice's text
    #[instrument(skip_all)]
    pub async fn complete(
        &self,
        messages: &[ChatMessage],
        options: CompletionOptions,
    ) -> AppResult<String> {
        let api_key = self.api_key.as_ref().ok_or_else(|| {
            AppError::ServiceUnavailable(format!("{} API key is not configured", self.provider))
        })?;

        let url = format!("{}/chat/completions", self.base_url);
        let request = ChatCompletionRequest {
            model: &self.model,
            messages,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        };

        info!(
            provider = self.provider,
            model = %self.model,
            messages = messages.len(),
            "Requesting chat completion"
        );

        let response = self
            .client
            .post(&url)
            .header(AUTHORIZATION, format!("Bearer {}", api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                record_upstream_call(self.provider, "error");
                error!(url = %url, error = %e, "Failed to send completion request");
                e
            })?;

        let status = response.status();
        debug!(status = %status, "Chat completion response status");

        if !status.is_success() {
            record_upstream_call(self.provider, "error");
            let text = response.text().await.unwrap_or_default();
            error!(status = %status, body = %text, "Chat completion failed");
            return Err(AppError::UpstreamError(format!(
                "{} API error {}",
                self.provider, status
            )));
        }

        let body: ChatCompletionResponse = response.json().await?;
        record_upstream_call(self.provider, "success");

        body.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| {
                AppError::UpstreamError(format!("{} returned no content", self.provider))
            })
    }
}
