use graph::{build_from_records, extract_subgraph, GraphData};
use ingest::{content_version, load_payloads, RecordSource, Skipped};
use query::{RetrievalConfig, RetrievalResult, Retriever};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::cache::{CacheStats, CachedGraph, GraphCache};
use crate::catalog::{GraphCatalog, GraphMeta};
use crate::config::AppConfig;
use crate::error::ApiError;
use crate::metrics::{Metrics, TimedOperation};
use crate::retry::RetryPolicy;

/// Full graph as returned by the knowledge-graph endpoint.
#[derive(Debug, Serialize)]
pub struct KnowledgeGraphView {
    pub name: String,
    pub graph: GraphData,
    pub skipped: Vec<Skipped>,
}

/// Loads graphs through the record source and answers queries against them.
pub struct GraphService {
    source: Arc<dyn RecordSource>,
    catalog: Arc<dyn GraphCatalog>,
    cache: Option<GraphCache>,
    retry: RetryPolicy,
    metrics: Arc<Metrics>,
    defaults: RetrievalConfig,
}

impl GraphService {
    pub fn new(
        source: Arc<dyn RecordSource>,
        catalog: Arc<dyn GraphCatalog>,
        config: &AppConfig,
    ) -> Self {
        let cache = config
            .cache
            .enabled
            .then(|| GraphCache::new(config.cache.max_entries));

        Self {
            source,
            catalog,
            cache,
            retry: RetryPolicy::from(&config.retry),
            metrics: Metrics::new(),
            defaults: config.retrieval,
        }
    }

    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    pub fn defaults(&self) -> RetrievalConfig {
        self.defaults
    }

    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(GraphCache::stats)
    }

    pub async fn list_graphs(&self) -> Result<Vec<GraphMeta>, ApiError> {
        Ok(self.catalog.list().await?)
    }

    pub async fn meta(&self, graph_id: &str) -> Result<GraphMeta, ApiError> {
        self.catalog
            .get(graph_id)
            .await?
            .ok_or_else(|| ApiError::GraphNotFound(graph_id.to_string()))
    }

    /// Fetch payloads and return the built graph, rebuilding only when the
    /// payload content changed since the cached build.
    pub async fn load_graph(
        &self,
        graph_id: &str,
    ) -> Result<(GraphMeta, Arc<CachedGraph>), ApiError> {
        let meta = self.meta(graph_id).await?;

        let payloads = self
            .retry
            .retry("fetch_payloads", || self.source.get_payloads(graph_id))
            .await?;
        let version = content_version(&payloads);

        if let Some(cached) = self.cache.as_ref().and_then(|c| c.get(graph_id, &version)) {
            debug!(graph_id, version = %version, "Graph cache hit");
            self.metrics.record_cache_hit();
            return Ok((meta, cached));
        }

        let timer = TimedOperation::start();
        let records = load_payloads(&payloads);
        let report = build_from_records(&records);
        for issue in &report.issues {
            warn!(graph_id, issue = ?issue, "Graph build issue");
        }

        let dropped_relations = report.dropped_relations();
        let built = Arc::new(CachedGraph {
            graph: report.graph,
            skipped: records.skipped,
            dropped_relations,
        });
        let elapsed = timer.elapsed();
        self.metrics.record_build(elapsed);

        info!(
            graph_id,
            elapsed_ms = elapsed.as_millis() as u64,
            payloads = payloads.len(),
            nodes = built.graph.node_count(),
            edges = built.graph.edge_count(),
            skipped = built.skipped.len(),
            dropped_relations,
            "Built knowledge graph"
        );

        if let Some(cache) = &self.cache {
            cache.insert(graph_id, &version, Arc::clone(&built));
        }
        Ok((meta, built))
    }

    pub async fn knowledge_graph(&self, graph_id: &str) -> Result<KnowledgeGraphView, ApiError> {
        let (meta, built) = self.load_graph(graph_id).await?;
        Ok(KnowledgeGraphView {
            name: meta.name,
            graph: built.graph.to_data(),
            skipped: built.skipped.clone(),
        })
    }

    pub async fn subgraph(
        &self,
        graph_id: &str,
        entity_name: &str,
        depth: usize,
    ) -> Result<GraphData, ApiError> {
        let (_, built) = self.load_graph(graph_id).await?;

        let timer = TimedOperation::start();
        let subgraph = extract_subgraph(&built.graph, entity_name, depth);
        self.metrics.record_subgraph(timer.elapsed());

        debug!(
            graph_id,
            entity_name,
            depth,
            nodes = subgraph.nodes.len(),
            edges = subgraph.edges.len(),
            "Extracted subgraph"
        );
        Ok(subgraph)
    }

    pub async fn retrieve(
        &self,
        graph_id: &str,
        question: &str,
        config: RetrievalConfig,
    ) -> Result<RetrievalResult, ApiError> {
        let (_, built) = self.load_graph(graph_id).await?;

        let timer = TimedOperation::start();
        let result = Retriever::new(config).retrieve(&built.graph, question);
        self.metrics.record_retrieval(timer.elapsed());

        Ok(result)
    }
}
