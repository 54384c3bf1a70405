use crate::{EmbeddingProvider, VectorSearchClient};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Source of retrieval context for a chat turn.
///
/// The signature is infallible on purpose: a failed or empty retrieval must
/// degrade to an empty context list, never abort the turn. Downstream prompt
/// builders omit the context section entirely when the list is empty.
#[async_trait]
pub trait ContextSource: Send + Sync {
    async fn retrieve_context(&self, query_text: &str, top_k: usize) -> Vec<String>;
}

/// Embeds the query and pulls the nearest stored passages from the index.
pub struct ContextRetriever {
    embedder: Arc<dyn EmbeddingProvider>,
    search: Arc<dyn VectorSearchClient>,
}

impl ContextRetriever {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, search: Arc<dyn VectorSearchClient>) -> Self {
        Self { embedder, search }
    }
}

#[async_trait]
impl ContextSource for ContextRetriever {
    #[instrument(skip(self))]
    async fn retrieve_context(&self, query_text: &str, top_k: usize) -> Vec<String> {
        let query = vec![query_text.to_string()];

        let vectors = match self.embedder.embed(&query).await {
            Ok(vectors) => vectors,
            Err(e) => {
                warn!("embedding failed, continuing without context: {}", e);
                return Vec::new();
            }
        };

        let Some(query_vector) = vectors.first() else {
            warn!("embedding returned no vectors, continuing without context");
            return Vec::new();
        };

        let expected = self.embedder.embedding_dimension();
        if query_vector.len() != expected {
            warn!(
                "embedding returned {} dimensions, expected {} for {}, continuing without context",
                query_vector.len(),
                expected,
                self.embedder.provider_name()
            );
            return Vec::new();
        }

        let passages = match self.search.similarity_search(query_vector, top_k).await {
            Ok(passages) => passages,
            Err(e) => {
                warn!("vector search failed, continuing without context: {}", e);
                return Vec::new();
            }
        };

        debug!("retrieved {} passages", passages.len());

        passages
            .into_iter()
            .take(top_k)
            .map(|p| p.text)
            .collect()
    }
}
