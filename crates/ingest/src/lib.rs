pub mod loader;
pub mod payload;
pub mod record;
pub mod source;

pub use loader::{classify, load_payloads, LoadedRecords, PayloadKind, SkipReason, Skipped};
pub use payload::{content_version, Payload};
pub use record::{EntityRecord, RelationRecord};
pub use source::{FsRecordSource, MemorySource, RecordSource, META_FILE};

use anyhow::Result;

/// Fetch a graph's payloads and parse them into records.
pub async fn ingest_graph<S>(source: &S, graph_id: &str) -> Result<LoadedRecords>
where
    S: RecordSource + ?Sized,
{
    let payloads = source.get_payloads(graph_id).await?;
    Ok(load_payloads(&payloads))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ingest_graph_from_memory() {
        let source = MemorySource::new();
        source.insert(
            "g",
            vec![
                Payload::new("e.json", r#"[{"id": 1, "entity_kwd": "A"}, {"id": 2, "entity_kwd": "B"}]"#),
                Payload::new("r.json", r#"[{"head_entity_id": 1, "tail_entity_id": 2, "relation": "r"}]"#),
            ],
        );

        let loaded = ingest_graph(&source, "g").await.unwrap();
        assert_eq!(loaded.entities.len(), 2);
        assert_eq!(loaded.relations[0].head_id, "1");
    }
}
