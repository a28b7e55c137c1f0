use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

use super::client::{CompletionParams, LlmClient};
use crate::util::SecretString;

/// Classified provider failure, carried inside the `anyhow::Error` returned by `complete`.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("{provider} request timed out")]
    Timeout { provider: &'static str },

    #[error("{provider} rate limit exceeded: {body}")]
    RateLimited { provider: &'static str, body: String },

    #[error("{provider} authentication failed ({status}): {body}")]
    Auth {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("{provider} server error {status}: {body}")]
    Server {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("{provider} API error {status}: {body}")]
    Api {
        provider: &'static str,
        status: u16,
        body: String,
    },
}

impl ProviderError {
    fn from_status(provider: &'static str, status: StatusCode, body: String) -> Self {
        let code = status.as_u16();
        match code {
            429 => ProviderError::RateLimited { provider, body },
            401 | 403 => ProviderError::Auth {
                provider,
                status: code,
                body,
            },
            500..=599 => ProviderError::Server {
                provider,
                status: code,
                body,
            },
            _ => ProviderError::Api {
                provider,
                status: code,
                body,
            },
        }
    }
}

fn send_error(provider: &'static str, err: reqwest::Error) -> anyhow::Error {
    if err.is_timeout() {
        anyhow::Error::new(ProviderError::Timeout { provider })
    } else {
        anyhow::Error::new(err).context(format!("Failed to send request to {} API", provider))
    }
}

async fn check_status(provider: &'static str, response: Response) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    Err(ProviderError::from_status(provider, status, body).into())
}

fn build_http_client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .context("failed to build HTTP client")
}

// ============================================================================
// OpenAI Client (also serves OpenAI-compatible endpoints such as Ollama)
// ============================================================================

pub struct OpenAIClient {
    api_key: SecretString,
    base_url: String,
    client: Client,
}

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_completion_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAIClient {
    pub fn new(api_key: String, timeout_secs: u64) -> Result<Self> {
        Self::with_base_url(api_key, "https://api.openai.com/v1".to_string(), timeout_secs)
    }

    pub fn with_base_url(api_key: String, base_url: String, timeout_secs: u64) -> Result<Self> {
        Ok(Self {
            api_key: api_key.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
            client: build_http_client(timeout_secs)?,
        })
    }

    fn build_request(prompt: &str, params: &CompletionParams) -> OpenAIRequest {
        // GPT-5+ models use max_completion_tokens instead of max_tokens
        let (max_tokens, max_completion_tokens) = if params.model.starts_with("gpt-5") {
            (None, Some(params.max_tokens))
        } else {
            (Some(params.max_tokens), None)
        };

        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &params.system_prompt {
            messages.push(OpenAIMessage {
                role: "system".to_string(),
                content: system.clone(),
            });
        }
        messages.push(OpenAIMessage {
            role: "user".to_string(),
            content: prompt.to_string(),
        });

        OpenAIRequest {
            model: params.model.clone(),
            messages,
            temperature: params.temperature,
            max_tokens,
            max_completion_tokens,
            response_format: params
                .json_response
                .then_some(ResponseFormat { kind: "json_object" }),
        }
    }
}

#[async_trait]
impl LlmClient for OpenAIClient {
    async fn complete(&self, prompt: &str, params: &CompletionParams) -> Result<String> {
        let request = Self::build_request(prompt, params);

        debug!(
            "Calling OpenAI-compatible API at {} with model: {}",
            self.base_url, params.model
        );

        let url = format!("{}/chat/completions", self.base_url);
        let mut req = self
            .client
            .post(&url)
            .header("content-type", "application/json")
            .json(&request);

        // Only add authorization if API key is not empty
        if !self.api_key.is_empty() && self.api_key.expose().to_lowercase() != "none" {
            req = req.header("authorization", format!("Bearer {}", self.api_key.expose()));
        }

        let response = req.send().await.map_err(|e| send_error("OpenAI", e))?;
        let response = check_status("OpenAI", response).await?;

        let api_response: OpenAIResponse = response
            .json()
            .await
            .context("Failed to parse OpenAI API response")?;

        api_response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .context("No choices in OpenAI response")
    }
}

// ============================================================================
// Anthropic Client
// ============================================================================

pub struct AnthropicClient {
    api_key: SecretString,
    base_url: String,
    client: Client,
}

#[derive(Debug, Serialize)]
struct AnthropicRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<AnthropicMessage>,
}

#[derive(Debug, Serialize, Deserialize)]
struct AnthropicMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
}

#[derive(Debug, Deserialize)]
struct AnthropicContent {
    #[serde(default)]
    text: Option<String>,
}

impl AnthropicClient {
    pub fn new(api_key: String, timeout_secs: u64) -> Result<Self> {
        Self::with_base_url(api_key, "https://api.anthropic.com/v1".to_string(), timeout_secs)
    }

    pub fn with_base_url(api_key: String, base_url: String, timeout_secs: u64) -> Result<Self> {
        Ok(Self {
            api_key: api_key.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
            client: build_http_client(timeout_secs)?,
        })
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    async fn complete(&self, prompt: &str, params: &CompletionParams) -> Result<String> {
        // No JSON mode on this API; the prompt itself demands JSON.
        let request = AnthropicRequest {
            model: params.model.clone(),
            max_tokens: params.max_tokens,
            temperature: params.temperature,
            system: params.system_prompt.clone(),
            messages: vec![AnthropicMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };

        debug!("Calling Anthropic API with model: {}", params.model);

        let response = self
            .client
            .post(format!("{}/messages", self.base_url))
            .header("x-api-key", self.api_key.expose())
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(|e| send_error("Anthropic", e))?;
        let response = check_status("Anthropic", response).await?;

        let api_response: AnthropicResponse = response
            .json()
            .await
            .context("Failed to parse Anthropic API response")?;

        api_response
            .content
            .into_iter()
            .find_map(|c| c.text)
            .context("No content in Anthropic response")
    }
}

// ============================================================================
// Tests
// ============================================================================
