//! Anthropic Messages API backend

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde::Serialize;
use tracing::debug;

use crate::errors::KbRagError;
use crate::errors::Result;
use crate::llm::error_for_status;
use crate::llm::http_client;
use crate::llm::AnswerProvider;
use crate::llm::GenerationParams;

const NAME: &str = "anthropic";
const API_VERSION: &str = "2023-06-01";

/// Calls `{endpoint}/v1/messages` with an `x-api-key` header
pub struct AnthropicProvider {
    endpoint: String,
    api_key: String,
    params: GenerationParams,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    system: &'a str,
    messages: [UserMessage<'a>; 1],
    max_tokens: u32,
    temperature: f32,
}

#[derive(Serialize)]
struct UserMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl AnthropicProvider {
    pub fn new(
        endpoint: String,
        api_key: String,
        params: GenerationParams,
        timeout: Duration,
    ) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(KbRagError::ConfigError(
                "llm.api_key is required for the anthropic provider".to_string(),
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
impl AnswerProvider for AnthropicProvider {
    fn name(&self) -> &str {
        NAME
    }

    async fn complete(&self, system_prompt: &str, user_prompt: &str) -> Result<String> {
        let url = format!("{}/v1/messages", self.endpoint);
        debug!("Calling messages API: {} ({})", url, self.params.model);

        let request = MessagesRequest {
            model: &self.params.model,
            system: system_prompt,
            messages: [UserMessage {
                role: "user",
                content: user_prompt,
            }],
            max_tokens: self.params.max_tokens,
            temperature: self.params.temperature,
        };

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&request)
            .send()
            .await?;
        let response = error_for_status(NAME, response).await?;

        let body = response.text().await?;
        let parsed: MessagesResponse =
            serde_json::from_str(&body).map_err(|e| KbRagError::Provider {
                provider: NAME.to_string(),
                status: 200,
                body: format!("unexpected response shape ({e}): {body}"),
            })?;

        Ok(parsed
            .content
            .into_iter()
            .filter(|block| block.kind == "text")
            .filter_map(|block| block.text)
            .collect::<Vec<_>>()
            .join(""))
    }
}
