pub mod config;
pub mod error;
pub mod transcript;

pub use config::{
    CompletionConfig, EmbeddingConfig, Neo4jConfig, PipelineStages, Settings, VectorSearchConfig,
};
pub use error::{ConfGraphError, Result};
pub use transcript::{Role, Transcript, Turn};
