pub mod completion;
pub mod engine;
pub mod llm_provider;
pub mod prompts;

pub use completion::HttpCompletionProvider;
pub use engine::{ChatEngine, ChatEngineConfig};
pub use llm_provider::{GenerationConfig, LLMProvider, LLMResponse, Message, MessageRole};
