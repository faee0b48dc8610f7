//! Basic statistics for the communication graph.
//!
//! # Statistics Provided
//!
//! - **node_count**: Distinct participants.
//! - **edge_count**: Distinct caller→receiver pairs.
//! - **call_count**: Calls collapsed into those edges.
//! - **density**: `edge_count / (node_count * (node_count - 1))`. Zero for
//!   graphs with 0 or 1 node.
//! - **weakly_connected_component_count**: Disjoint groups of participants
//!   with no calls between them.
//! - **self_loop_count**: Participants that appear calling themselves.
//! - **isolated_node_count**: Nodes with no edges at all.
//! - **max_in_degree** / **max_out_degree**: Busiest receiver and caller.

use petgraph::{Direction, algo::connected_components, visit::EdgeRef};
use serde::Serialize;

use crate::graph::build::CallGraph;

/// Summary statistics for a [`CallGraph`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphStats {
    pub node_count: usize,
    pub edge_count: usize,
    pub call_count: u64,
    pub density: f64,
    pub weakly_connected_component_count: usize,
    pub self_loop_count: usize,
    pub isolated_node_count: usize,
    pub max_in_degree: usize,
    pub max_out_degree: usize,
}

impl GraphStats {
    #[must_use]
    pub fn from_graph(cg: &CallGraph) -> Self {
        let g = &cg.graph;
        let node_count = g.node_count();
        let edge_count = g.edge_count();

        let call_count = g
            .edge_references()
            .map(|e| u64::from(e.weight().calls))
            .sum();

        let self_loop_count = g
            .edge_references()
            .filter(|e| e.source() == e.target())
            .count();

        let isolated_node_count = g
            .node_indices()
            .filter(|&idx| {
                g.edges_directed(idx, Direction::Incoming).next().is_none()
                    && g.edges_directed(idx, Direction::Outgoing).next().is_none()
            })
            .count();

        let max_in_degree = g
            .node_indices()
            .map(|idx| g.edges_directed(idx, Direction::Incoming).count())
            .max()
            .unwrap_or(0);

        let max_out_degree = g
            .node_indices()
            .map(|idx| g.edges_directed(idx, Direction::Outgoing).count())
            .max()
            .unwrap_or(0);

        Self {
            node_count,
            edge_count,
            call_count,
            density: compute_density(node_count, edge_count),
            weakly_connected_component_count: connected_components(g),
            self_loop_count,
            isolated_node_count,
            max_in_degree,
            max_out_degree,
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn compute_density(node_count: usize, edge_count: usize) -> f64 {
    if node_count < 2 {
        return 0.0_f64;
    }
    let max_edges = (node_count * (node_count - 1)) as f64;
    edge_count as f64 / max_edges
}
