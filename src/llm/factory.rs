use anyhow::{bail, Result};
use std::sync::Arc;

use super::client::LlmClient;
use super::client::MockLlmClient;
use super::client_impl::{AnthropicClient, OpenAIClient};
use crate::config::Config;

const DEFAULT_COMPATIBLE_BASE_URL: &str = "http://localhost:11434/v1";

/// Create an LLM client based on configuration
pub fn create_client(config: &Config, dry_run: bool) -> Result<Arc<dyn LlmClient>> {
    if dry_run {
        return Ok(Arc::new(MockLlmClient::new()));
    }

    let api_key = config.get_api_key()?;
    let timeout = config.llm.timeout_secs;
    let base_url = config
        .llm
        .base_url
        .clone()
        .filter(|url| !url.trim().is_empty());

    match config.llm.provider.as_str() {
        "anthropic" => Ok(Arc::new(match base_url {
            Some(url) => AnthropicClient::with_base_url(api_key, url, timeout)?,
            None => AnthropicClient::new(api_key, timeout)?,
        })),

        "openai" => Ok(Arc::new(match base_url {
            Some(url) => OpenAIClient::with_base_url(api_key, url, timeout)?,
            None => OpenAIClient::new(api_key, timeout)?,
        })),

        "openai-compatible" => {
            let base_url = base_url.unwrap_or_else(|| DEFAULT_COMPATIBLE_BASE_URL.to_string());
            Ok(Arc::new(OpenAIClient::with_base_url(
                api_key, base_url, timeout,
            )?))
        }

        unknown => bail!("Unknown LLM provider: {}", unknown),
    }
}
