use async_trait::async_trait;
use confgraph_core::{ConfGraphError, Result, VectorSearchConfig};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::time::timeout;
use tracing::debug;

/// One row from the vector index: the passage text plus its similarity score.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredPassage {
    pub text: String,
    pub score: f64,
}

/// Trait for nearest-neighbour lookups against a hosted vector index.
#[async_trait]
pub trait VectorSearchClient: Send + Sync {
    async fn similarity_search(
        &self,
        query_vector: &[f32],
        num_results: usize,
    ) -> Result<Vec<ScoredPassage>>;
}

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    columns: &'a [String],
    query_vector: &'a [f32],
    num_results: usize,
}

/// Response shape of the index query endpoint. Rows come back as positional
/// arrays in requested-column order, with the similarity score appended as
/// the trailing element.
#[derive(Debug, Deserialize)]
struct SearchResponse {
    result: SearchResult,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(default)]
    data_array: Vec<Vec<Value>>,
}

/// HTTP client for the vector index query endpoint.
pub struct HttpVectorSearchClient {
    config: VectorSearchConfig,
    client: Client,
}

impl HttpVectorSearchClient {
    pub fn new(config: VectorSearchConfig) -> Result<Self> {
        if !config.columns.contains(&config.text_column) {
            return Err(ConfGraphError::Configuration(format!(
                "text column '{}' is not in the requested column list",
                config.text_column
            )));
        }

        let client = Client::builder()
            .timeout(config.timeout())
            .user_agent("ConfGraph/0.1")
            .build()
            .map_err(|e| ConfGraphError::Network(e.to_string()))?;

        Ok(Self { config, client })
    }

    fn query_url(&self) -> String {
        format!(
            "{}/api/2.0/vector-search/endpoints/{}/indexes/{}/query",
            self.config.api_base, self.config.endpoint_name, self.config.index_name
        )
    }

    /// Position of the text column within each positional result row.
    fn text_column_index(&self) -> usize {
        self.config
            .columns
            .iter()
            .position(|c| c == &self.config.text_column)
            .unwrap_or(0)
    }
}

#[async_trait]
impl VectorSearchClient for HttpVectorSearchClient {
    async fn similarity_search(
        &self,
        query_vector: &[f32],
        num_results: usize,
    ) -> Result<Vec<ScoredPassage>> {
        if query_vector.is_empty() {
            return Err(ConfGraphError::External(
                "empty query vector".to_string(),
            ));
        }

        let request = SearchRequest {
            columns: &self.config.columns,
            query_vector,
            num_results,
        };

        let mut request_builder = self
            .client
            .post(self.query_url())
            .header("Content-Type", "application/json")
            .json(&request);

        if let Some(api_key) = &self.config.api_key {
            request_builder =
                request_builder.header("Authorization", format!("Bearer {}", api_key));
        }

        let response = timeout(self.config.timeout(), request_builder.send())
            .await
            .map_err(|_| {
                ConfGraphError::Timeout("vector search request timed out".to_string())
            })?
            .map_err(|e| ConfGraphError::Network(format!("request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ConfGraphError::External(format!(
                "vector search error: HTTP {} {}",
                status, body
            )));
        }

        let parsed = response
            .json::<SearchResponse>()
            .await
            .map_err(|e| ConfGraphError::External(format!("malformed search response: {}", e)))?;

        let text_index = self.text_column_index();
        let mut passages = Vec::with_capacity(parsed.result.data_array.len());

        for row in parsed.result.data_array {
            let Some(text) = row.get(text_index).and_then(Value::as_str) else {
                continue;
            };
            // Score is the trailing element the index appends after the
            // requested columns.
            let score = row
                .last()
                .and_then(Value::as_f64)
                .unwrap_or(0.0);
            passages.push(ScoredPassage {
                text: text.to_string(),
                score,
            });
        }

        debug!("vector search returned {} passages", passages.len());
        Ok(passages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_text_column_outside_requested_columns() {
        let config = VectorSearchConfig {
            columns: vec!["Embeddings".to_string()],
            text_column: "Concat".to_string(),
            ..VectorSearchConfig::default()
        };
        assert!(HttpVectorSearchClient::new(config).is_err());
    }

    #[test]
    fn text_column_position_follows_config_order() {
        let client = HttpVectorSearchClient::new(VectorSearchConfig::default()).unwrap();
        // Default columns are ["Embeddings", "Concat"] with "Concat" as text.
        assert_eq!(client.text_column_index(), 1);
    }

    #[test]
    fn query_url_targets_configured_index() {
        let client = HttpVectorSearchClient::new(VectorSearchConfig::default()).unwrap();
        let url = client.query_url();
        assert!(url.contains("/endpoints/vs_endpoint/"));
        assert!(url.ends_with("/indexes/workspace.default.speakers_index/query"));
    }
}
