pub mod embedding;
pub mod retriever;
pub mod search;

pub use embedding::{EmbeddingProvider, HttpEmbeddingProvider};
pub use retriever::{ContextRetriever, ContextSource};
pub use search::{HttpVectorSearchClient, ScoredPassage, VectorSearchClient};
