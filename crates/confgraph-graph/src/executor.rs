use crate::guard::SafeQuery;
use async_trait::async_trait;
use confgraph_core::{ConfGraphError, Neo4jConfig, Result};
use neo4rs::{query, ConfigBuilder, Graph};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

/// One graph row, flattened to (column, value) pairs.
pub type GraphRecord = Vec<(String, Value)>;

/// Trait for executing validated read queries against the graph.
#[async_trait]
pub trait GraphExecutor: Send + Sync {
    async fn run(&self, query: &SafeQuery) -> Result<Vec<GraphRecord>>;
}

/// Neo4j-backed executor. Only accepts [`SafeQuery`], so everything that
/// reaches the driver has already passed the read-only gate.
pub struct Neo4jExecutor {
    graph: Graph,
    query_timeout: Duration,
}

impl Neo4jExecutor {
    /// Connect using the configured protocol/host/credential parameters.
    pub async fn connect(config: &Neo4jConfig) -> Result<Self> {
        let driver_config = ConfigBuilder::default()
            .uri(config.uri())
            .user(&config.user)
            .password(&config.password)
            .db(config.database.as_str())
            .build()
            .map_err(|e| ConfGraphError::Configuration(format!("neo4j config: {}", e)))?;

        let graph = Graph::connect(driver_config)
            .await
            .map_err(|e| ConfGraphError::Database(format!("neo4j connect: {}", e)))?;

        debug!("connected to neo4j at {}", config.uri());

        Ok(Self {
            graph,
            query_timeout: config.query_timeout(),
        })
    }

    async fn collect_records(&self, safe: &SafeQuery) -> Result<Vec<GraphRecord>> {
        let mut stream = self
            .graph
            .execute(query(safe.as_str()))
            .await
            .map_err(|e| ConfGraphError::Database(format!("query failed: {}", e)))?;

        let mut records = Vec::new();
        while let Some(row) = stream
            .next()
            .await
            .map_err(|e| ConfGraphError::Database(format!("row fetch failed: {}", e)))?
        {
            match row.to::<BTreeMap<String, Value>>() {
                Ok(map) => records.push(map.into_iter().collect()),
                Err(e) => warn!("skipping row with undeserializable fields: {}", e),
            }
        }
        Ok(records)
    }
}

#[async_trait]
impl GraphExecutor for Neo4jExecutor {
    async fn run(&self, safe: &SafeQuery) -> Result<Vec<GraphRecord>> {
        let records = timeout(self.query_timeout, self.collect_records(safe))
            .await
            .map_err(|_| ConfGraphError::Timeout("graph query timed out".to_string()))??;

        debug!("graph query returned {} records", records.len());
        Ok(records)
    }
}
