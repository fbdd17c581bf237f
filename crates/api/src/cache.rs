use dashmap::DashMap;
use graph::KnowledgeGraph;
use ingest::Skipped;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A built graph plus what was left out while building it.
#[derive(Debug)]
pub struct CachedGraph {
    pub graph: KnowledgeGraph,
    pub skipped: Vec<Skipped>,
    pub dropped_relations: usize,
}

/// Built graphs keyed by graph id and payload content version.
///
/// A changed payload set hashes to a new key, so stale graphs are never
/// served; they age out through eviction.
pub struct GraphCache {
    graphs: DashMap<String, Arc<CachedGraph>>,
    max_entries: usize,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl GraphCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            graphs: DashMap::new(),
            max_entries,
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
        }
    }

    pub fn get(&self, graph_id: &str, version: &str) -> Option<Arc<CachedGraph>> {
        let key = Self::cache_key(graph_id, version);
        match self.graphs.get(&key) {
            Some(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(Arc::clone(entry.value()))
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    pub fn insert(&self, graph_id: &str, version: &str, graph: Arc<CachedGraph>) {
        if self.graphs.len() >= self.max_entries {
            // Simple eviction: clear 25% when full
            let to_remove: Vec<_> = self
                .graphs
                .iter()
                .take((self.max_entries / 4).max(1))
                .map(|r| r.key().clone())
                .collect();
            for key in to_remove {
                self.graphs.remove(&key);
            }
        }
        self.graphs.insert(Self::cache_key(graph_id, version), graph);
    }

    fn cache_key(graph_id: &str, version: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(graph_id.as_bytes());
        hasher.update([0u8]);
        hasher.update(version.as_bytes());
        hex::encode(hasher.finalize())
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            graphs_cached: self.graphs.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CacheStats {
    pub graphs_cached: usize,
    pub hits: usize,
    pub misses: usize,
}
