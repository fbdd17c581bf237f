use ingest::{EntityRecord, RelationRecord};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, warn};

use crate::model::{GraphData, GraphEdge, GraphNode};

/// In-memory knowledge graph for one query.
///
/// Edges are only ever added between nodes present in `index`.
#[derive(Debug, Clone, Default)]
pub struct KnowledgeGraph {
    graph: DiGraph<GraphNode, GraphEdge>,
    index: HashMap<String, NodeIndex>,
}

impl KnowledgeGraph {
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Nodes in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.graph.node_indices().map(move |idx| &self.graph[idx])
    }

    /// Edges in insertion order.
    pub fn edges(&self) -> impl Iterator<Item = &GraphEdge> {
        self.graph.raw_edges().iter().map(|e| &e.weight)
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.index.get(id).map(|&idx| &self.graph[idx])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Display name for a node id, falling back to the id itself.
    pub fn name_of<'a>(&'a self, id: &'a str) -> &'a str {
        self.node(id).map(|n| n.entity_name.as_str()).unwrap_or(id)
    }

    /// First node (in insertion order) whose name equals `name` exactly.
    pub fn find_by_name(&self, name: &str) -> Option<NodeIndex> {
        self.graph
            .node_indices()
            .find(|&idx| self.graph[idx].entity_name == name)
    }

    pub fn to_data(&self) -> GraphData {
        GraphData {
            nodes: self.nodes().cloned().collect(),
            edges: self.edges().cloned().collect(),
        }
    }

    pub(crate) fn inner(&self) -> &DiGraph<GraphNode, GraphEdge> {
        &self.graph
    }

    /// Every node sharing an edge with `idx`, in either direction.
    pub(crate) fn incident_neighbors(&self, idx: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph
            .edges_directed(idx, petgraph::Direction::Outgoing)
            .map(|e| e.target())
            .chain(
                self.graph
                    .edges_directed(idx, petgraph::Direction::Incoming)
                    .map(|e| e.source()),
            )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BuildIssue {
    /// A relation referenced an id with no node; the relation was dropped.
    DanglingRelation {
        head_id: String,
        tail_id: String,
        relation: String,
    },
    /// A later entity reused an id; its content replaced the earlier node.
    DuplicateEntity { id: String },
}

#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    pub graph: KnowledgeGraph,
    pub issues: Vec<BuildIssue>,
}

impl BuildReport {
    pub fn dropped_relations(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| matches!(i, BuildIssue::DanglingRelation { .. }))
            .count()
    }
}

pub struct GraphBuilder;

impl GraphBuilder {
    /// Build a graph in O(|entities| + |relations|).
    ///
    /// Relations whose head or tail does not resolve are dropped. Parallel
    /// edges and self-loops are kept as-is.
    pub fn build(entities: &[EntityRecord], relations: &[RelationRecord]) -> BuildReport {
        let mut graph = DiGraph::with_capacity(entities.len(), relations.len());
        let mut index: HashMap<String, NodeIndex> = HashMap::with_capacity(entities.len());
        let mut issues = Vec::new();

        for entity in entities {
            let node = GraphNode::from(entity);
            match index.get(&entity.id) {
                Some(&idx) => {
                    warn!(id = %entity.id, "Duplicate entity id, later record wins");
                    graph[idx] = node;
                    issues.push(BuildIssue::DuplicateEntity {
                        id: entity.id.clone(),
                    });
                }
                None => {
                    let idx = graph.add_node(node);
                    index.insert(entity.id.clone(), idx);
                }
            }
        }

        for relation in relations {
            match (index.get(&relation.head_id), index.get(&relation.tail_id)) {
                (Some(&head), Some(&tail)) => {
                    graph.add_edge(head, tail, GraphEdge::from(relation));
                }
                _ => {
                    debug!(
                        head = %relation.head_id,
                        tail = %relation.tail_id,
                        "Dropping relation with unknown endpoint"
                    );
                    issues.push(BuildIssue::DanglingRelation {
                        head_id: relation.head_id.clone(),
                        tail_id: relation.tail_id.clone(),
                        relation: relation.relation.clone(),
                    });
                }
            }
        }

        let report = BuildReport {
            graph: KnowledgeGraph { graph, index },
            issues,
        };

        if report.dropped_relations() > 0 {
            warn!(
                dropped = report.dropped_relations(),
                "Relations referenced missing entities"
            );
        }

        report
    }
}
