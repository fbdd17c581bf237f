//! Bounded breadth-first subgraph extraction.

use petgraph::graph::NodeIndex;
use petgraph::visit::EdgeRef;
use std::collections::{HashSet, VecDeque};

use crate::builder::KnowledgeGraph;
use crate::model::GraphData;

/// Extract the neighborhood of the first node named `entity_name`.
///
/// Edges count as undirected for reachability. Nodes found at exactly
/// `depth` hops are included but not expanded. The result carries every edge
/// whose two endpoints were both visited, whether or not it lies on a BFS
/// tree path. An unknown name yields an empty result.
pub fn extract_subgraph(graph: &KnowledgeGraph, entity_name: &str, depth: usize) -> GraphData {
    let Some(start) = graph.find_by_name(entity_name) else {
        return GraphData::new();
    };

    let visited = bfs_visit(graph, start, depth);
    let inner = graph.inner();

    let nodes = inner
        .node_indices()
        .filter(|idx| visited.contains(idx))
        .map(|idx| inner[idx].clone())
        .collect();

    let edges = inner
        .edge_references()
        .filter(|e| visited.contains(&e.source()) && visited.contains(&e.target()))
        .map(|e| e.weight().clone())
        .collect();

    GraphData { nodes, edges }
}

fn bfs_visit(graph: &KnowledgeGraph, start: NodeIndex, depth: usize) -> HashSet<NodeIndex> {
    let mut visited = HashSet::new();
    let mut queue = VecDeque::new();
    queue.push_back((start, 0usize));

    while let Some((current, current_depth)) = queue.pop_front() {
        // Marked on dequeue; a node queued twice is expanded once, at its
        // shallowest depth.
        if !visited.insert(current) {
            continue;
        }
        if current_depth >= depth {
            continue;
        }

        for neighbor in graph.incident_neighbors(current) {
            if !visited.contains(&neighbor) {
                queue.push_back((neighbor, current_depth + 1));
            }
        }
    }

    visited
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::GraphBuilder;
    use ingest::{EntityRecord, RelationRecord};

    fn build(names: &[&str], edges: &[(&str, &str)]) -> KnowledgeGraph {
        let entities: Vec<_> = names.iter().map(|n| EntityRecord::new(*n, *n)).collect();
        let relations: Vec<_> = edges
            .iter()
            .map(|(h, t)| RelationRecord::new(*h, *t, format!("{}-{}", h, t)))
            .collect();
        GraphBuilder::build(&entities, &relations).graph
    }

    fn node_ids(data: &GraphData) -> Vec<&str> {
        data.nodes.iter().map(|n| n.id.as_str()).collect()
    }

    fn edge_labels(data: &GraphData) -> Vec<&str> {
        data.edges.iter().map(|e| e.relation.as_str()).collect()
    }

    #[test]
    fn test_depth_one_chain() {
        let graph = build(&["A", "B", "C"], &[("A", "B"), ("B", "C")]);
        let sub = extract_subgraph(&graph, "A", 1);

        assert_eq!(node_ids(&sub), vec!["A", "B"]);
        assert_eq!(edge_labels(&sub), vec!["A-B"]);
    }

    #[test]
    fn test_depth_two_chain() {
        let graph = build(&["A", "B", "C"], &[("A", "B"), ("B", "C")]);
        let sub = extract_subgraph(&graph, "A", 2);

        assert_eq!(node_ids(&sub), vec!["A", "B", "C"]);
        assert_eq!(edge_labels(&sub), vec!["A-B", "B-C"]);
    }

    #[test]
    fn test_depth_zero_is_start_only() {
        let graph = build(&["A", "B"], &[("A", "B")]);
        let sub = extract_subgraph(&graph, "A", 0);

        assert_eq!(node_ids(&sub), vec!["A"]);
        assert!(sub.edges.is_empty());
    }

    #[test]
    fn test_depth_zero_keeps_self_loop() {
        let graph = build(&["A", "B"], &[("A", "A"), ("A", "B")]);
        let sub = extract_subgraph(&graph, "A", 0);

        assert_eq!(node_ids(&sub), vec!["A"]);
        assert_eq!(edge_labels(&sub), vec!["A-A"]);
    }

    #[test]
    fn test_edges_are_undirected_for_reachability() {
        let graph = build(&["A", "B", "C"], &[("B", "A"), ("C", "B")]);
        let sub = extract_subgraph(&graph, "A", 2);

        assert_eq!(node_ids(&sub), vec!["A", "B", "C"]);
        assert_eq!(sub.edges.len(), 2);
    }

    #[test]
    fn test_leaf_to_leaf_edge_included() {
        // B and C are both one hop from A; B-C is not a tree edge but both
        // endpoints are visited.
        let graph = build(&["A", "B", "C"], &[("A", "B"), ("A", "C"), ("B", "C")]);
        let sub = extract_subgraph(&graph, "A", 1);

        assert_eq!(node_ids(&sub), vec!["A", "B", "C"]);
        assert_eq!(edge_labels(&sub), vec!["A-B", "A-C", "B-C"]);
    }

    #[test]
    fn test_unknown_start_is_empty() {
        let graph = build(&["A"], &[]);
        assert!(extract_subgraph(&graph, "Z", 3).is_empty());
        assert!(extract_subgraph(&graph, "a", 3).is_empty());
    }

    #[test]
    fn test_cycle_terminates() {
        let graph = build(
            &["A", "B", "C", "D"],
            &[("A", "B"), ("B", "C"), ("C", "A"), ("C", "D")],
        );
        let sub = extract_subgraph(&graph, "A", 10);

        assert_eq!(sub.nodes.len(), 4);
        assert_eq!(sub.edges.len(), 4);
    }

    #[test]
    fn test_monotonic_in_depth() {
        let graph = build(
            &["A", "B", "C", "D", "E", "F"],
            &[("A", "B"), ("B", "C"), ("C", "D"), ("B", "E"), ("E", "F"), ("F", "A")],
        );

        for depth in 0..6 {
            let smaller = extract_subgraph(&graph, "A", depth);
            let larger = extract_subgraph(&graph, "A", depth + 1);
            for node in &smaller.nodes {
                assert!(larger.contains_node(&node.id), "depth {} lost {}", depth, node.id);
            }
        }
    }

    #[test]
    fn test_induced_edges_only() {
        let graph = build(&["A", "B", "C", "D"], &[("A", "B"), ("B", "C"), ("C", "D")]);
        let sub = extract_subgraph(&graph, "B", 1);

        for edge in &sub.edges {
            assert!(sub.contains_node(&edge.source_id));
            assert!(sub.contains_node(&edge.target_id));
        }
        assert_eq!(node_ids(&sub), vec!["A", "B", "C"]);
    }
}
