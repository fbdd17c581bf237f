use ingest::{EntityRecord, RelationRecord};
use serde::{Deserialize, Serialize};

pub const DEFAULT_ENTITY_TYPE: &str = "ENTITY";
pub const DEFAULT_PAGERANK: f64 = 1.0;
pub const DEFAULT_EDGE_WEIGHT: f64 = 2.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    pub entity_name: String,
    pub description: String,
    pub entity_type: String,
    pub source: Vec<String>,
    /// Not computed; always [`DEFAULT_PAGERANK`].
    pub pagerank: f64,
    /// Not computed; always empty.
    pub communities: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    #[serde(rename = "source")]
    pub source_id: String,
    #[serde(rename = "target")]
    pub target_id: String,
    pub relation: String,
    pub weight: f64,
    pub description: String,
}

impl From<&EntityRecord> for GraphNode {
    fn from(entity: &EntityRecord) -> Self {
        Self {
            id: entity.id.clone(),
            entity_name: entity.name.clone(),
            description: entity.description.clone(),
            entity_type: DEFAULT_ENTITY_TYPE.to_string(),
            source: entity.source.clone(),
            pagerank: DEFAULT_PAGERANK,
            communities: Vec::new(),
        }
    }
}

impl From<&RelationRecord> for GraphEdge {
    fn from(relation: &RelationRecord) -> Self {
        Self {
            source_id: relation.head_id.clone(),
            target_id: relation.tail_id.clone(),
            relation: relation.relation.clone(),
            weight: relation.weight.unwrap_or(DEFAULT_EDGE_WEIGHT),
            description: relation.relation.clone(),
        }
    }
}

/// Serializable node and edge lists, used for whole graphs and subgraphs alike.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphData {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
}

impl GraphData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.edges.is_empty()
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.iter().any(|n| n.id == id)
    }
}
