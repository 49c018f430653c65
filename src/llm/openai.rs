//! OpenAI-compatible chat completions backend

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;
use tracing::warn;

use crate::errors::KbRagError;
use crate::errors::Result;
use crate::llm::error_for_status;
use crate::llm::http_client;
use crate::llm::AnswerProvider;
use crate::llm::GenerationParams;

const NAME: &str = "openai";

/// Calls `{endpoint}/chat/completions` with bearer authentication.
///
/// `endpoint` includes the API version, e.g. `https://api.openai.com/v1`.
pub struct OpenAiProvider {
    endpoint: String,
    api_key: String,
    params: GenerationParams,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    max_tokens: u32,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiProvider {
    pub fn new(
        endpoint: String,
        api_key: String,
        params: GenerationParams,
        timeout: Duration,
    ) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(KbRagError::ConfigError(
                "llm.api_key is required for the openai provider".to_string(),
            ));
        }
        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key,
            params,
            client: http_client(timeout)?,
        })
    }
}

#[async_trait]
impl AnswerProvider for OpenAiProvider {
    fn name(&self) -> &str {
        NAME
    }

    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.endpoint);
        debug!("Calling chat completions: {} ({})", url, self.params.model);

        let request = ChatRequest {
            model: &self.params.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user_prompt,
                },
            ],
            temperature: self.params.temperature,
            max_tokens: self.params.max_tokens,
            response_format: ResponseFormat {
                kind: "json_object",
            },
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;
        let response = error_for_status(NAME, response).await?;

        let body = response.text().await?;
        let parsed: ChatResponse =
            serde_json::from_str(&body).map_err(|e| KbRagError::Provider {
                provider: NAME.to_string(),
                status: 200,
                body: format!("unexpected response shape ({e}): {body}"),
            })?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .unwrap_or_else(|| {
                warn!("Chat completion returned no message content");
                String::new()
            });
        Ok(content)
    }
}
