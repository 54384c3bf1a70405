use async_trait::async_trait;
use confgraph_core::{ConfGraphError, EmbeddingConfig, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Trait for services that turn text spans into fixed-dimension vectors.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate one embedding per input text, in input order.
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Dimensionality of vectors produced by the configured model.
    fn embedding_dimension(&self) -> usize;

    fn provider_name(&self) -> &str;
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest {
    input: Vec<String>,
    model: String,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}

#[derive(Debug, Deserialize)]
struct Usage {
    #[serde(default)]
    total_tokens: usize,
}

/// HTTP embedding provider against an OpenAI-style `/embeddings` endpoint.
pub struct HttpEmbeddingProvider {
    config: EmbeddingConfig,
    client: Client,
}

impl HttpEmbeddingProvider {
    pub fn new(config: EmbeddingConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent("ConfGraph/0.1")
            .build()
            .map_err(|e| ConfGraphError::Network(e.to_string()))?;

        Ok(Self { config, client })
    }

    /// Call the embeddings API with retry; exponential backoff between attempts.
    async fn call_api(&self, texts: Vec<String>) -> Result<EmbeddingResponse> {
        let request = EmbeddingRequest {
            input: texts,
            model: self.config.model.clone(),
        };

        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                let delay = Duration::from_millis(100 * 2_u64.pow(attempt));
                tokio::time::sleep(delay).await;
            }

            let mut request_builder = self
                .client
                .post(format!("{}/embeddings", self.config.api_base))
                .header("Content-Type", "application/json")
                .json(&request);

            if let Some(api_key) = &self.config.api_key {
                request_builder =
                    request_builder.header("Authorization", format!("Bearer {}", api_key));
            }

            let request_result = timeout(self.config.timeout(), request_builder.send()).await;

            match request_result {
                Ok(Ok(response)) => {
                    let status = response.status();
                    if status.is_success() {
                        match response.json::<EmbeddingResponse>().await {
                            Ok(parsed) => {
                                if let Some(usage) = &parsed.usage {
                                    info!(
                                        "embedding call: {} vectors, {} tokens",
                                        parsed.data.len(),
                                        usage.total_tokens
                                    );
                                }
                                return Ok(parsed);
                            }
                            Err(e) => {
                                last_error = Some(ConfGraphError::External(format!(
                                    "failed to parse embedding response: {}",
                                    e
                                )));
                            }
                        }
                    } else {
                        let body = response.text().await.unwrap_or_default();
                        last_error = Some(ConfGraphError::External(format!(
                            "embedding API error: HTTP {} {}",
                            status, body
                        )));
                    }
                }
                Ok(Err(e)) => {
                    last_error = Some(ConfGraphError::Network(format!("request failed: {}", e)));
                }
                Err(_) => {
                    last_error = Some(ConfGraphError::Timeout(
                        "embedding request timed out".to_string(),
                    ));
                }
            }

            if attempt < self.config.max_retries {
                warn!(
                    "embedding call failed (attempt {}/{}), retrying",
                    attempt + 1,
                    self.config.max_retries + 1
                );
            }
        }

        Err(last_error.unwrap_or_else(|| {
            ConfGraphError::External("all embedding retry attempts failed".to_string())
        }))
    }
}

#[async_trait]
impl EmbeddingProvider for HttpEmbeddingProvider {
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        debug!("embedding {} texts with {}", texts.len(), self.config.model);
        let response = self.call_api(texts.to_vec()).await?;

        if response.data.is_empty() {
            return Err(ConfGraphError::External(
                "no embeddings returned".to_string(),
            ));
        }

        // Order by index; the service may not preserve input order.
        let mut data = response.data;
        data.sort_by_key(|item| item.index);

        Ok(data.into_iter().map(|item| item.embedding).collect())
    }

    fn embedding_dimension(&self) -> usize {
        match self.config.model.as_str() {
            "bge-large-en" => 1024,
            "bge-base-en" => 768,
            "text-embedding-3-small" => 1536,
            _ => 1024,
        }
    }

    fn provider_name(&self) -> &str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_input_short_circuits() {
        let provider = HttpEmbeddingProvider::new(EmbeddingConfig::default()).unwrap();
        let vectors = provider.embed(&[]).await.unwrap();
        assert!(vectors.is_empty());
    }

    #[test]
    fn dimension_matches_default_model() {
        let config = EmbeddingConfig {
            model: "bge-large-en".to_string(),
            ..EmbeddingConfig::default()
        };
        let provider = HttpEmbeddingProvider::new(config).unwrap();
        assert_eq!(provider.embedding_dimension(), 1024);
    }
}
