use crate::llm_provider::{GenerationConfig, LLMProvider, LLMResponse, Message};
use async_trait::async_trait;
use confgraph_core::{CompletionConfig, ConfGraphError, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

#[derive(Debug, Serialize)]
struct ChatCompletionsRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<usize>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionsResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
    #[serde(default)]
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    prompt_tokens: Option<usize>,
    #[serde(default)]
    completion_tokens: Option<usize>,
    #[serde(default)]
    total_tokens: Option<usize>,
}

/// Chat-completion provider speaking the OpenAI-style `/chat/completions`
/// protocol, which the hosted conference models also expose.
pub struct HttpCompletionProvider {
    config: CompletionConfig,
    client: Client,
}

impl HttpCompletionProvider {
    pub fn new(config: CompletionConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent("ConfGraph/0.1")
            .build()
            .map_err(|e| ConfGraphError::Network(e.to_string()))?;

        Ok(Self { config, client })
    }

    async fn try_request(
        &self,
        messages: &[Message],
        config: &GenerationConfig,
    ) -> Result<ChatCompletionsResponse> {
        let request = ChatCompletionsRequest {
            model: &self.config.model,
            messages: messages
                .iter()
                .map(|m| ChatMessage {
                    role: m.role.to_string(),
                    content: m.content.clone(),
                })
                .collect(),
            max_tokens: config.max_tokens.or(Some(self.config.max_tokens)),
            temperature: config.temperature,
            stop: config.stop.clone(),
        };

        let mut request_builder = self
            .client
            .post(format!("{}/chat/completions", self.config.api_base))
            .header("Content-Type", "application/json")
            .json(&request);

        if let Some(api_key) = &self.config.api_key {
            request_builder =
                request_builder.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = timeout(self.config.timeout(), request_builder.send())
            .await
            .map_err(|_| ConfGraphError::Timeout("completion request timed out".to_string()))?
            .map_err(|e| ConfGraphError::Network(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ConfGraphError::External(format!(
                "completion API error: HTTP {} {}",
                status, body
            )));
        }

        response
            .json::<ChatCompletionsResponse>()
            .await
            .map_err(|e| ConfGraphError::External(format!("malformed completion response: {}", e)))
    }
}

#[async_trait]
impl LLMProvider for HttpCompletionProvider {
    async fn generate_chat(
        &self,
        messages: &[Message],
        config: &GenerationConfig,
    ) -> Result<LLMResponse> {
        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                // Exponential backoff: 1s, 2s, 4s
                let delay = Duration::from_secs(2u64.pow(attempt - 1));
                tokio::time::sleep(delay).await;
            }

            match self.try_request(messages, config).await {
                Ok(parsed) => {
                    let choice = parsed.choices.into_iter().next().ok_or_else(|| {
                        ConfGraphError::External("completion returned no choices".to_string())
                    })?;
                    let content = choice.message.content.unwrap_or_default();

                    debug!(
                        "completion finished ({})",
                        choice.finish_reason.as_deref().unwrap_or("unknown")
                    );

                    let usage = parsed.usage;
                    return Ok(LLMResponse {
                        content,
                        total_tokens: usage.as_ref().and_then(|u| u.total_tokens),
                        prompt_tokens: usage.as_ref().and_then(|u| u.prompt_tokens),
                        completion_tokens: usage.as_ref().and_then(|u| u.completion_tokens),
                        finish_reason: choice.finish_reason,
                        model: parsed.model.unwrap_or_else(|| self.config.model.clone()),
                    });
                }
                Err(e) => {
                    last_error = Some(e);
                    if attempt < self.config.max_retries {
                        warn!(
                            "completion call failed (attempt {}/{}), retrying",
                            attempt + 1,
                            self.config.max_retries + 1
                        );
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            ConfGraphError::External("all completion retry attempts failed".to_string())
        }))
    }

    fn provider_name(&self) -> &str {
        "http"
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}
