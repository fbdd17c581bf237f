use anyhow::{Context, Result};
use async_trait::async_trait;
use dashmap::DashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::payload::Payload;

/// File name reserved for graph metadata inside a graph directory.
pub const META_FILE: &str = "meta.json";

/// Supplies the raw uploaded files for a graph.
///
/// Zero payloads means the graph has no content yet. An `Err` means the
/// source itself could not be reached.
#[async_trait]
pub trait RecordSource: Send + Sync {
    async fn get_payloads(&self, graph_id: &str) -> Result<Vec<Payload>>;
}

/// Reads `<root>/<graph_id>/**/*.json`, sorted by path.
pub struct FsRecordSource {
    root: PathBuf,
}

impl FsRecordSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn list_payload_files(dir: &Path) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();

        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = entry.with_context(|| format!("Failed to list {:?}", dir))?;
            let path = entry.path();

            if !entry.file_type().is_file() {
                continue;
            }
            if path.file_name().and_then(|n| n.to_str()) == Some(META_FILE) {
                continue;
            }
            if path.extension().and_then(|e| e.to_str()) == Some("json") {
                files.push(path.to_path_buf());
            }
        }

        Ok(files)
    }
}

#[async_trait]
impl RecordSource for FsRecordSource {
    async fn get_payloads(&self, graph_id: &str) -> Result<Vec<Payload>> {
        if graph_id.is_empty() || graph_id.contains(['/', '\\']) || graph_id.starts_with('.') {
            anyhow::bail!("Invalid graph id: {:?}", graph_id);
        }

        let dir = self.root.join(graph_id);
        let exists = fs::try_exists(&dir)
            .await
            .with_context(|| format!("Failed to stat graph directory {:?}", dir))?;
        if !exists {
            debug!(graph_id, "No content directory for graph");
            return Ok(Vec::new());
        }

        let listing_dir = dir.clone();
        let files = tokio::task::spawn_blocking(move || Self::list_payload_files(&listing_dir))
            .await
            .context("File listing task panicked")??;

        let mut payloads = Vec::with_capacity(files.len());
        for path in files {
            let label = path
                .strip_prefix(&dir)
                .unwrap_or(&path)
                .to_string_lossy()
                .to_string();

            match fs::read_to_string(&path).await {
                Ok(content) => payloads.push(Payload { label, content }),
                Err(e) => {
                    warn!(graph_id, file = %label, error = %e, "Unreadable payload file, skipping");
                }
            }
        }

        debug!(graph_id, count = payloads.len(), "Read payload files");
        Ok(payloads)
    }
}

/// In-memory payload store.
#[derive(Default)]
pub struct MemorySource {
    payloads: DashMap<String, Vec<Payload>>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, graph_id: impl Into<String>, payloads: Vec<Payload>) {
        self.payloads.insert(graph_id.into(), payloads);
    }

    pub fn push(&self, graph_id: &str, payload: Payload) {
        self.payloads
            .entry(graph_id.to_string())
            .or_default()
            .push(payload);
    }
}

#[async_trait]
impl RecordSource for MemorySource {
    async fn get_payloads(&self, graph_id: &str) -> Result<Vec<Payload>> {
        Ok(self
            .payloads
            .get(graph_id)
            .map(|r| r.value().clone())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_fs_source_reads_sorted_json_files() {
        let temp = TempDir::new().unwrap();
        let graph_dir = temp.path().join("g1");
        std::fs::create_dir_all(graph_dir.join("nested")).unwrap();
        std::fs::write(graph_dir.join("b_relations.json"), "[]").unwrap();
        std::fs::write(graph_dir.join("a_entities.json"), "[1]").unwrap();
        std::fs::write(graph_dir.join("nested").join("c.json"), "[2]").unwrap();
        std::fs::write(graph_dir.join("notes.txt"), "ignored").unwrap();
        std::fs::write(graph_dir.join(META_FILE), r#"{"name": "G"}"#).unwrap();

        let source = FsRecordSource::new(temp.path());
        let payloads = source.get_payloads("g1").await.unwrap();

        let labels: Vec<_> = payloads.iter().map(|p| p.label.replace('\\', "/")).collect();
        assert_eq!(labels, vec!["a_entities.json", "b_relations.json", "nested/c.json"]);
        assert_eq!(payloads[0].content, "[1]");
    }

    #[tokio::test]
    async fn test_fs_source_missing_graph_is_empty() {
        let temp = TempDir::new().unwrap();
        let source = FsRecordSource::new(temp.path());
        assert!(source.get_payloads("absent").await.unwrap().is_empty());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_fs_source_stat_failure_is_an_error() {
        let temp = TempDir::new().unwrap();
        let not_a_dir = temp.path().join("data.json");
        std::fs::write(&not_a_dir, "[]").unwrap();

        // Stat of `data.json/g1` fails with ENOTDIR, which is not "absent".
        let source = FsRecordSource::new(&not_a_dir);
        let err = source.get_payloads("g1").await.unwrap_err();
        assert!(err.to_string().contains("Failed to stat graph directory"));
    }

    #[tokio::test]
    async fn test_fs_source_rejects_path_escape() {
        let temp = TempDir::new().unwrap();
        let source = FsRecordSource::new(temp.path());
        assert!(source.get_payloads("../etc").await.is_err());
        assert!(source.get_payloads("").await.is_err());
    }

    #[tokio::test]
    async fn test_memory_source() {
        let source = MemorySource::new();
        source.push("g", Payload::new("a", "[]"));
        source.push("g", Payload::new("b", "[]"));

        assert_eq!(source.get_payloads("g").await.unwrap().len(), 2);
        assert!(source.get_payloads("other").await.unwrap().is_empty());
    }
}
