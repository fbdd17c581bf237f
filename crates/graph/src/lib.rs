pub mod builder;
pub mod model;
pub mod traversal;

pub use builder::{BuildIssue, BuildReport, GraphBuilder, KnowledgeGraph};
pub use model::{GraphData, GraphEdge, GraphNode, DEFAULT_EDGE_WEIGHT, DEFAULT_ENTITY_TYPE};
pub use traversal::extract_subgraph;

use ingest::LoadedRecords;

/// Build a graph straight from loaded records.
pub fn build_from_records(records: &LoadedRecords) -> BuildReport {
    GraphBuilder::build(&records.entities, &records.relations)
}
