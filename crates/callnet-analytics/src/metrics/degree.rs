//! Normalized in-degree and out-degree centrality.
//!
//! Degree centrality is the fraction of other participants a node is
//! directly connected to: `degree / (n - 1)`. Out-degree measures how many
//! distinct people a participant called; in-degree how many distinct people
//! called them. A self-loop counts once toward each.
//!
//! Graphs with fewer than two nodes have no "other participants", so every
//! node scores 0.

use std::collections::HashMap;

use petgraph::Direction;

use crate::graph::CallGraph;

/// Fraction of other participants that called each node.
#[must_use]
pub fn in_degree_centrality(cg: &CallGraph) -> HashMap<String, f64> {
    degree_centrality(cg, Direction::Incoming)
}

/// Fraction of other participants each node called.
#[must_use]
pub fn out_degree_centrality(cg: &CallGraph) -> HashMap<String, f64> {
    degree_centrality(cg, Direction::Outgoing)
}

/// Raw (unnormalized) degree per participant in one direction.
#[must_use]
pub fn degree_counts(cg: &CallGraph, direction: Direction) -> HashMap<String, usize> {
    cg.graph
        .node_indices()
        .map(|idx| {
            (
                cg.graph[idx].id.clone(),
                cg.graph.edges_directed(idx, direction).count(),
            )
        })
        .collect()
}

#[allow(clippy::cast_precision_loss)]
fn degree_centrality(cg: &CallGraph, direction: Direction) -> HashMap<String, f64> {
    let n = cg.node_count();
    let scale = if n > 1 { 1.0 / (n - 1) as f64 } else { 0.0 };

    degree_counts(cg, direction)
        .into_iter()
        .map(|(id, d)| (id, d as f64 * scale))
        .collect()
}
