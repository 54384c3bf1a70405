use anyhow::Result;
use clap::Parser;
use confgraph_ai::engine::{ChatEngine, ChatEngineConfig};
use confgraph_ai::llm_provider::GenerationConfig;
use confgraph_ai::HttpCompletionProvider;
use confgraph_core::{Settings, Transcript};
use confgraph_graph::{GraphExecutor, Neo4jExecutor};
use confgraph_retrieval::{ContextRetriever, HttpEmbeddingProvider, HttpVectorSearchClient};
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Chat with the conference session/speaker knowledge base.
#[derive(Debug, Parser)]
#[command(name = "confgraph", version, about)]
struct Cli {
    /// Passages requested from the vector index per question
    #[arg(long, default_value_t = 5)]
    top_k: usize,

    /// Skip the embedding + vector-search stage
    #[arg(long)]
    no_retrieval: bool,

    /// Skip the graph-query stage
    #[arg(long)]
    no_graph: bool,

    /// Completion model identifier
    #[arg(long, env = "COMPLETION_MODEL")]
    model: Option<String>,

    /// Maximum completion tokens per call
    #[arg(long, default_value_t = 128)]
    max_tokens: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let mut settings = Settings::from_env();
    settings.stages.embed_retrieval = !cli.no_retrieval;
    settings.stages.graph_lookup = !cli.no_graph;
    settings.vector_search.top_k = cli.top_k;
    settings.completion.max_tokens = cli.max_tokens;
    if let Some(model) = cli.model {
        settings.completion.model = model;
    }

    let embedder = Arc::new(HttpEmbeddingProvider::new(settings.embedding.clone())?);
    let search = Arc::new(HttpVectorSearchClient::new(settings.vector_search.clone())?);
    let retriever = Arc::new(ContextRetriever::new(embedder, search));
    let llm = Arc::new(HttpCompletionProvider::new(settings.completion.clone())?);

    // A graph that refuses the connection degrades the session to the
    // retrieval-only path instead of aborting it.
    let graph: Option<Arc<dyn GraphExecutor>> = if settings.stages.graph_lookup {
        match Neo4jExecutor::connect(&settings.neo4j).await {
            Ok(executor) => Some(Arc::new(executor)),
            Err(e) => {
                warn!("neo4j unavailable, continuing without graph lookup: {}", e);
                None
            }
        }
    } else {
        None
    };

    let engine = ChatEngine::new(
        retriever,
        llm,
        graph,
        ChatEngineConfig {
            stages: settings.stages,
            top_k: settings.vector_search.top_k,
            generation: GenerationConfig {
                max_tokens: Some(settings.completion.max_tokens),
                ..GenerationConfig::default()
            },
            ..ChatEngineConfig::default()
        },
    );

    info!(
        "chat ready (retrieval: {}, graph: {})",
        settings.stages.embed_retrieval, settings.stages.graph_lookup
    );
    println!("ConfGraph conference assistant. Ask about sessions and speakers; 'exit' to quit.");

    let stdin = io::stdin();
    let mut transcript = Transcript::new();

    loop {
        print!("you> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        if input.eq_ignore_ascii_case("exit") || input.eq_ignore_ascii_case("quit") {
            break;
        }

        let answer = engine.submit(&mut transcript, input).await;
        println!("assistant> {}\n", answer);
    }

    Ok(())
}
