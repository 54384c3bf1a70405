use crate::llm_provider::{GenerationConfig, LLMProvider, Message};
use crate::prompts;
use confgraph_core::{PipelineStages, Transcript};
use confgraph_graph::{validate, GraphExecutor};
use confgraph_retrieval::ContextSource;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

const SYSTEM_MESSAGE: &str = "You are a helpful assistant.";

/// Configuration for the per-turn engine.
#[derive(Debug, Clone)]
pub struct ChatEngineConfig {
    pub stages: PipelineStages,
    /// Passages requested from the vector index per turn.
    pub top_k: usize,
    pub generation: GenerationConfig,
    pub schema_text: String,
}

impl Default for ChatEngineConfig {
    fn default() -> Self {
        Self {
            stages: PipelineStages::default(),
            top_k: 5,
            generation: GenerationConfig::default(),
            schema_text: confgraph_graph::SCHEMA_TEXT.to_string(),
        }
    }
}

/// Orchestrates one chat turn: retrieval, completion, optional graph lookup,
/// final synthesis.
///
/// All calls within a turn run strictly in sequence since each depends on the
/// previous output. Every failure degrades: retrieval errors shrink to empty
/// context, graph-path errors fall back to the retrieval draft, and a fully
/// failed turn still appends an apologetic assistant reply. The transcript
/// always grows by exactly two turns per submission.
pub struct ChatEngine {
    context_source: Arc<dyn ContextSource>,
    llm: Arc<dyn LLMProvider>,
    graph: Option<Arc<dyn GraphExecutor>>,
    config: ChatEngineConfig,
}

impl ChatEngine {
    pub fn new(
        context_source: Arc<dyn ContextSource>,
        llm: Arc<dyn LLMProvider>,
        graph: Option<Arc<dyn GraphExecutor>>,
        config: ChatEngineConfig,
    ) -> Self {
        Self {
            context_source,
            llm,
            graph,
            config,
        }
    }

    /// Run one full turn for `input`, appending the user turn and exactly one
    /// assistant turn. Returns the assistant's reply text.
    #[instrument(skip(self, transcript, input))]
    pub async fn submit(&self, transcript: &mut Transcript, input: &str) -> String {
        let turn_id = Uuid::new_v4();
        debug!("processing turn {}", turn_id);

        // The user's turn is recorded before anything can fail.
        transcript.push_user(input);

        let contexts = if self.config.stages.embed_retrieval {
            self.context_source
                .retrieve_context(input, self.config.top_k)
                .await
        } else {
            Vec::new()
        };

        let draft = self.draft_answer(input, &contexts).await;

        let answer = if self.config.stages.graph_lookup {
            match self.graph_answer(input, draft.as_deref()).await {
                Some(answer) => Some(answer),
                None => draft,
            }
        } else {
            draft
        };

        let content = answer.unwrap_or_else(|| prompts::FALLBACK_ANSWER.to_string());
        transcript.push_assistant(content.clone());

        info!("turn {} complete", turn_id);
        content
    }

    /// First completion pass: answer from vector-search context.
    async fn draft_answer(&self, question: &str, contexts: &[String]) -> Option<String> {
        let prompt = match prompts::retrieval_answer_prompt(question, contexts) {
            Ok(prompt) => prompt,
            Err(e) => {
                warn!("could not build retrieval-answer prompt: {}", e);
                return None;
            }
        };

        match self.complete(&prompt).await {
            Some(text) if !text.trim().is_empty() => Some(text),
            Some(_) => {
                warn!("retrieval-answer completion was empty");
                None
            }
            None => None,
        }
    }

    /// Graph path: generate a Cypher candidate, gate it, execute it, and
    /// synthesize the final answer from the returned records. `None` on any
    /// failure so the caller can fall back to the draft.
    async fn graph_answer(&self, question: &str, draft: Option<&str>) -> Option<String> {
        let executor = self.graph.as_ref()?;

        let prompt =
            match prompts::graph_query_prompt(question, &self.config.schema_text, draft) {
                Ok(prompt) => prompt,
                Err(e) => {
                    warn!("could not build graph-query prompt: {}", e);
                    return None;
                }
            };

        let candidate = self.complete(&prompt).await?;
        if candidate.trim().is_empty() {
            // No query text generated; never touch the executor.
            debug!("no candidate query generated");
            return None;
        }

        let safe = match validate(&candidate) {
            Ok(safe) => safe,
            Err(reason) => {
                warn!("generated query rejected: {}", reason);
                return None;
            }
        };

        let records = match executor.run(&safe).await {
            Ok(records) => records,
            Err(e) => {
                warn!("graph query execution failed: {}", e);
                return None;
            }
        };

        let rendered = confgraph_graph::render_records(&records);
        let prompt = match prompts::final_answer_prompt(question, &rendered) {
            Ok(prompt) => prompt,
            Err(e) => {
                warn!("could not build final-answer prompt: {}", e);
                return None;
            }
        };

        match self.complete(&prompt).await {
            Some(text) if !text.trim().is_empty() => Some(text),
            _ => None,
        }
    }

    async fn complete(&self, prompt: &str) -> Option<String> {
        let messages = vec![Message::system(SYSTEM_MESSAGE), Message::user(prompt)];
        match self
            .llm
            .generate_chat(&messages, &self.config.generation)
            .await
        {
            Ok(response) => Some(response.content),
            Err(e) => {
                warn!("completion call failed: {}", e);
                None
            }
        }
    }
}
