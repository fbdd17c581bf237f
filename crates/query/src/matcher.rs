use graph::{GraphNode, KnowledgeGraph};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::distance::normalized_similarity;
use crate::tokenizer::tokenize;

pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchedEntity {
    pub id: String,
    pub entity_name: String,
    pub entity_type: String,
    pub similarity: f64,
    pub description: String,
}

pub struct EntityMatcher {
    threshold: f64,
}

impl Default for EntityMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_SIMILARITY_THRESHOLD)
    }
}

impl EntityMatcher {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// Score every node against `question`; keep those at or above the
    /// threshold, best first. Equal scores keep graph order.
    pub fn match_entities(&self, graph: &KnowledgeGraph, question: &str) -> Vec<MatchedEntity> {
        let question_key = question.trim().to_lowercase();
        let tokens = tokenize(question);
        debug!(?tokens, "Question tokens");

        let mut matched: Vec<MatchedEntity> = graph
            .nodes()
            .filter_map(|node| {
                let similarity = score_node(node, &question_key, &tokens);
                (similarity >= self.threshold).then(|| MatchedEntity {
                    id: node.id.clone(),
                    entity_name: node.entity_name.clone(),
                    entity_type: node.entity_type.clone(),
                    similarity,
                    description: node.description.clone(),
                })
            })
            .collect();

        // Stable: ties stay in encounter order.
        matched.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));
        matched
    }
}

/// Similarity of one node to a question, in [0, 1].
///
/// `question_key` is the trimmed, lowercased question; `tokens` its
/// tokenization.
pub fn score_node(node: &GraphNode, question_key: &str, tokens: &[String]) -> f64 {
    let name = node.entity_name.to_lowercase();
    if question_key == name.trim() {
        return 1.0;
    }

    let description = node.description.to_lowercase();
    tokens
        .iter()
        .map(|token| token_similarity(token, &name, &description))
        .fold(0.0, f64::max)
}

fn token_similarity(token: &str, name: &str, description: &str) -> f64 {
    let token_len = token.chars().count() as f64;

    if name.contains(token) {
        ratio(token_len, name)
    } else if description.contains(token) {
        ratio(token_len, description)
    } else if name.is_empty() {
        0.0
    } else {
        normalized_similarity(token, name)
    }
}

fn ratio(token_len: f64, haystack: &str) -> f64 {
    let len = haystack.chars().count();
    if len == 0 { 0.0 } else { token_len / len as f64 }
}

/// Match with a one-off threshold.
pub fn match_entities(graph: &KnowledgeGraph, question: &str, threshold: f64) -> Vec<MatchedEntity> {
    EntityMatcher::new(threshold).match_entities(graph, question)
}
