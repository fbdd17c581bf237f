use graph::{extract_subgraph, KnowledgeGraph};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt::Write;
use tracing::info;

use crate::matcher::{EntityMatcher, MatchedEntity, DEFAULT_SIMILARITY_THRESHOLD};

pub const DEFAULT_SUBGRAPH_DEPTH: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub similarity_threshold: f64,
    pub subgraph_depth: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            similarity_threshold: DEFAULT_SIMILARITY_THRESHOLD,
            subgraph_depth: DEFAULT_SUBGRAPH_DEPTH,
        }
    }
}

/// An edge with both endpoint names resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipEvidence {
    pub source_id: String,
    pub target_id: String,
    pub source_name: String,
    pub target_name: String,
    pub relation: String,
    pub description: String,
    pub weight: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub entities: Vec<MatchedEntity>,
    pub relationships: Vec<RelationshipEvidence>,
    pub summary: String,
}

impl RetrievalResult {
    /// The defined result for a question that matched no entity.
    pub fn no_match() -> Self {
        Self::default()
    }

    pub fn is_no_match(&self) -> bool {
        self.entities.is_empty()
    }
}

pub struct Retriever {
    config: RetrievalConfig,
    matcher: EntityMatcher,
}

impl Default for Retriever {
    fn default() -> Self {
        Self::new(RetrievalConfig::default())
    }
}

impl Retriever {
    pub fn new(config: RetrievalConfig) -> Self {
        Self {
            config,
            matcher: EntityMatcher::new(config.similarity_threshold),
        }
    }

    /// Match entities, expand each one's subgraph, and merge the edges.
    ///
    /// Relationships are unique per `(source_id, target_id)`, in the order
    /// they were first reached; the first parallel edge seen for a pair wins.
    pub fn retrieve(&self, graph: &KnowledgeGraph, question: &str) -> RetrievalResult {
        let entities = self.matcher.match_entities(graph, question);
        if entities.is_empty() {
            info!(question, "No entity matched question");
            return RetrievalResult::no_match();
        }

        let mut seen: HashSet<(String, String)> = HashSet::new();
        let mut relationships = Vec::new();

        for entity in &entities {
            let subgraph = extract_subgraph(graph, &entity.entity_name, self.config.subgraph_depth);

            for edge in subgraph.edges {
                let key = (edge.source_id.clone(), edge.target_id.clone());
                if !seen.insert(key) {
                    continue;
                }
                relationships.push(RelationshipEvidence {
                    source_name: graph.name_of(&edge.source_id).to_string(),
                    target_name: graph.name_of(&edge.target_id).to_string(),
                    source_id: edge.source_id,
                    target_id: edge.target_id,
                    relation: edge.relation,
                    description: edge.description,
                    weight: edge.weight,
                });
            }
        }

        info!(
            entities = entities.len(),
            relationships = relationships.len(),
            "Retrieved graph evidence"
        );

        let summary = build_summary(&entities, &relationships);
        RetrievalResult {
            entities,
            relationships,
            summary,
        }
    }
}

/// One line per entity, then one line per relationship.
pub fn build_summary(entities: &[MatchedEntity], relationships: &[RelationshipEvidence]) -> String {
    let mut summary = String::new();

    for entity in entities {
        let _ = writeln!(
            summary,
            "- {} [{}] similarity={:.3}: {}",
            entity.entity_name, entity.entity_type, entity.similarity, entity.description
        );
    }

    for relation in relationships {
        let _ = writeln!(
            summary,
            "- {} -> {}: {}",
            relation.source_name, relation.target_name, relation.relation
        );
    }

    summary
}

/// Retrieve with one-off parameters.
pub fn retrieve(
    graph: &KnowledgeGraph,
    question: &str,
    similarity_threshold: f64,
    subgraph_depth: usize,
) -> RetrievalResult {
    Retriever::new(RetrievalConfig {
        similarity_threshold,
        subgraph_depth,
    })
    .retrieve(graph, question)
}
