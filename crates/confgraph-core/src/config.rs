use serde::{Deserialize, Serialize};
use std::time::Duration;

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}

/// Configuration for the text-embedding service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Base URL for the API (e.g., "http://localhost:8080/v1")
    pub api_base: String,
    pub model: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            api_base: env_or("EMBEDDING_API_BASE", "http://localhost:8080/v1"),
            model: env_or("EMBEDDING_MODEL", "bge-large-en"),
            api_key: env_opt("EMBEDDING_API_KEY"),
            timeout_secs: 30,
            max_retries: 3,
        }
    }
}

impl EmbeddingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Configuration for the vector similarity index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorSearchConfig {
    pub api_base: String,
    pub endpoint_name: String,
    pub index_name: String,
    /// Columns requested from the index; `text_column` must be one of them.
    pub columns: Vec<String>,
    /// Column holding the passage text included in prompts.
    pub text_column: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    /// Results requested per query.
    pub top_k: usize,
}

impl Default for VectorSearchConfig {
    fn default() -> Self {
        Self {
            api_base: env_or("VECTOR_SEARCH_API_BASE", "http://localhost:8080"),
            endpoint_name: env_or("VECTOR_SEARCH_ENDPOINT", "vs_endpoint"),
            index_name: env_or("VECTOR_SEARCH_INDEX", "workspace.default.speakers_index"),
            columns: vec!["Embeddings".to_string(), "Concat".to_string()],
            text_column: "Concat".to_string(),
            api_key: env_opt("VECTOR_SEARCH_API_KEY"),
            timeout_secs: 30,
            top_k: 5,
        }
    }
}

impl VectorSearchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Configuration for the chat-completion endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionConfig {
    pub api_base: String,
    pub model: String,
    pub api_key: Option<String>,
    pub max_tokens: usize,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            api_base: env_or("COMPLETION_API_BASE", "http://localhost:8080/v1"),
            model: env_or("COMPLETION_MODEL", "databricks-meta-llama-3-70b-instruct"),
            api_key: env_opt("COMPLETION_API_KEY"),
            max_tokens: 128,
            timeout_secs: 60,
            max_retries: 3,
        }
    }
}

impl CompletionConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Connection parameters for the session/speaker graph database.
///
/// Recognized environment keys: NEO4J_PROTOCOL, NEO4J_CONNECTION_URL,
/// NEO4J_USER, NEO4J_PASSWORD.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Neo4jConfig {
    pub protocol: String,
    pub connection_url: String,
    pub user: String,
    pub password: String,
    pub database: String,
    pub query_timeout_secs: u64,
}

impl Default for Neo4jConfig {
    fn default() -> Self {
        Self {
            protocol: env_or("NEO4J_PROTOCOL", "neo4j://"),
            connection_url: env_or("NEO4J_CONNECTION_URL", "localhost:7687"),
            user: env_or("NEO4J_USER", "neo4j"),
            password: env_or("NEO4J_PASSWORD", ""),
            database: "neo4j".to_string(),
            query_timeout_secs: 30,
        }
    }
}

impl Neo4jConfig {
    /// Full driver URI, protocol prefix plus host.
    pub fn uri(&self) -> String {
        format!("{}{}", self.protocol, self.connection_url)
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }
}

/// Which pipeline stages run for a chat turn.
///
/// Collapses the observed drafts into one parameterized pipeline: with both
/// flags on, the vector-search answer also feeds the graph-query prompt as a
/// context hint.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PipelineStages {
    pub embed_retrieval: bool,
    pub graph_lookup: bool,
}

impl Default for PipelineStages {
    fn default() -> Self {
        Self {
            embed_retrieval: true,
            graph_lookup: true,
        }
    }
}

/// Top-level settings for one ConfGraph session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    pub embedding: EmbeddingConfig,
    pub vector_search: VectorSearchConfig,
    pub completion: CompletionConfig,
    pub neo4j: Neo4jConfig,
    pub stages: PipelineStages,
}

impl Settings {
    /// Build settings from the process environment, falling back to the
    /// defaults above for anything unset.
    pub fn from_env() -> Self {
        Self::default()
    }
}
