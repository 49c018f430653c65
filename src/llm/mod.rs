//! Text-generation backends used for answer synthesis
//!
//! Each backend issues exactly one HTTP call per completion and reports any
//! non-success status as [`KbRagError::Provider`] with the response body.
//! There is no retry at this layer.

pub mod anthropic;
pub mod openai;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

pub use anthropic::AnthropicProvider;
pub use openai::OpenAiProvider;

use crate::config::AppConfig;
use crate::config::LlmProviderKind;
use crate::errors::KbRagError;
use crate::errors::Result;

/// A chat-completion backend
#[async_trait]
pub trait AnswerProvider: Send + Sync {
    /// Short backend name used in logs and errors
    fn name(&self) -> &str;

    /// Run one completion and return the raw response text
    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String>;
}

/// Sampling settings shared by all backends
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Build the backend named in `[llm]`. Selection happens once, here.
pub fn create_provider(config: &AppConfig) -> Result<Arc<dyn AnswerProvider>> {
    let llm = &config.llm;
    let params = GenerationParams {
        model: llm.model.clone(),
        temperature: llm.temperature,
        max_tokens: llm.max_tokens,
    };
    let timeout = Duration::from_secs(config.timeouts.provider_secs);

    let provider: Arc<dyn AnswerProvider> = match llm.provider {
        LlmProviderKind::OpenAI => Arc::new(OpenAiProvider::new(
            llm.endpoint.clone(),
            llm.api_key.clone(),
            params,
            timeout,
        )?),
        LlmProviderKind::Anthropic => Arc::new(AnthropicProvider::new(
            llm.endpoint.clone(),
            llm.api_key.clone(),
            params,
            timeout,
        )?),
    };

    tracing::info!("Answer provider: {} ({})", provider.name(), llm.model);
    Ok(provider)
}

/// Like [`create_provider`], but `None` when `llm.api_key` is unset.
///
/// Search never reaches a provider, so a deployment without generation
/// credentials can still serve it.
pub fn create_optional_provider(config: &AppConfig) -> Result<Option<Arc<dyn AnswerProvider>>> {
    if config.llm.api_key.trim().is_empty() {
        tracing::warn!("llm.api_key is not set; answer synthesis is disabled");
        return Ok(None);
    }
    create_provider(config).map(Some)
}

pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}

/// Turn a non-success response into a provider error carrying its body
pub(crate) async fn error_for_status(
    provider: &str,
    response: reqwest::Response,
) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "<unreadable body>".to_string());
    Err(KbRagError::Provider {
        provider: provider.to_string(),
        status: status.as_u16(),
        body,
    })
}
