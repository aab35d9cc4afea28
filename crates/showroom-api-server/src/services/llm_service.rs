use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{LlmConfig, OpenAiConfig};
use crate::models::chat::ChatMessage;
use crate::services::conversation::manager::LlmProvider;
use crate::utils::error::ProviderError;

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: usize,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

/// Chat completions over the OpenAI-compatible `/chat/completions`
/// endpoint. Single-shot: the assistant answers with one completed
/// message, no streaming.
#[derive(Clone)]
pub struct OpenAiChatService {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: usize,
    timeout_seconds: u64,
}

impl OpenAiChatService {
    pub fn new(openai: &OpenAiConfig, config: &LlmConfig) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(config.timeout_seconds))
                .build()
                .expect("failed to create HTTP client"),
            base_url: openai.base_url.clone(),
            api_key: openai.api_key.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            timeout_seconds: config.timeout_seconds,
        }
    }

    pub async fn generate_chat(
        &self,
        messages: &[ChatMessage],
    ) -> Result<String, ProviderError> {
        debug!(messages = messages.len(), "requesting chat completion");

        let request = ChatCompletionRequest {
            model: &self.model,
            messages,
            max_tokens: self.max_tokens,
        };

        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProviderError::from_reqwest(e, self.timeout_seconds))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Api { status, body });
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Malformed(e.to_string()))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| ProviderError::Malformed("no choices returned".to_string()))
    }
}

#[async_trait::async_trait]
impl LlmProvider for OpenAiChatService {
    async fn chat(&self, messages: &[ChatMessage]) -> Result<String, ProviderError> {
        self.generate_chat(messages).await
    }
}
