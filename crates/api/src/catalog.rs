use anyhow::{Context, Result};
use async_trait::async_trait;
use dashmap::DashMap;
use ingest::META_FILE;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::fs;
use tracing::warn;

/// Recorded metadata for a graph. Counts are whatever was last recorded and
/// may not match a fresh rebuild.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphMeta {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub node_num: usize,
    #[serde(default)]
    pub edge_num: usize,
}

impl GraphMeta {
    pub fn named(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            node_num: 0,
            edge_num: 0,
        }
    }
}

#[async_trait]
pub trait GraphCatalog: Send + Sync {
    async fn get(&self, graph_id: &str) -> Result<Option<GraphMeta>>;
    async fn list(&self) -> Result<Vec<GraphMeta>>;
}

/// Optional fields of `meta.json`.
#[derive(Debug, Default, Deserialize)]
struct MetaFile {
    name: Option<String>,
    #[serde(default)]
    description: String,
    #[serde(default)]
    node_num: usize,
    #[serde(default)]
    edge_num: usize,
}

/// Every sub-directory of `root` is a graph.
pub struct FsCatalog {
    root: PathBuf,
}

impl FsCatalog {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    async fn read_meta(&self, graph_id: &str) -> GraphMeta {
        let path = self.root.join(graph_id).join(META_FILE);
        let meta = match fs::read_to_string(&path).await {
            Ok(raw) => serde_json::from_str::<MetaFile>(&raw).unwrap_or_else(|e| {
                warn!(graph_id, error = %e, "Ignoring malformed meta.json");
                MetaFile::default()
            }),
            Err(_) => MetaFile::default(),
        };

        GraphMeta {
            id: graph_id.to_string(),
            name: meta.name.unwrap_or_else(|| graph_id.to_string()),
            description: meta.description,
            node_num: meta.node_num,
            edge_num: meta.edge_num,
        }
    }
}

fn is_valid_id(graph_id: &str) -> bool {
    !graph_id.is_empty() && !graph_id.starts_with('.') && !graph_id.contains(['/', '\\'])
}

#[async_trait]
impl GraphCatalog for FsCatalog {
    async fn get(&self, graph_id: &str) -> Result<Option<GraphMeta>> {
        if !is_valid_id(graph_id) {
            return Ok(None);
        }
        let dir = self.root.join(graph_id);
        match fs::metadata(&dir).await {
            Ok(meta) if meta.is_dir() => Ok(Some(self.read_meta(graph_id).await)),
            Ok(_) => Ok(None),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to stat graph directory {:?}", dir)),
        }
    }

    async fn list(&self) -> Result<Vec<GraphMeta>> {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to list data dir {:?}", self.root));
            }
        };

        let mut ids = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_dir() {
                let id = entry.file_name().to_string_lossy().to_string();
                if is_valid_id(&id) {
                    ids.push(id);
                }
            }
        }
        ids.sort();

        let mut graphs = Vec::with_capacity(ids.len());
        for id in ids {
            graphs.push(self.read_meta(&id).await);
        }
        Ok(graphs)
    }
}

#[derive(Default)]
pub struct MemoryCatalog {
    graphs: DashMap<String, GraphMeta>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, meta: GraphMeta) {
        self.graphs.insert(meta.id.clone(), meta);
    }
}

#[async_trait]
impl GraphCatalog for MemoryCatalog {
    async fn get(&self, graph_id: &str) -> Result<Option<GraphMeta>> {
        Ok(self.graphs.get(graph_id).map(|r| r.value().clone()))
    }

    async fn list(&self) -> Result<Vec<GraphMeta>> {
        let mut graphs: Vec<_> = self.graphs.iter().map(|r| r.value().clone()).collect();
        graphs.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(graphs)
    }
}
