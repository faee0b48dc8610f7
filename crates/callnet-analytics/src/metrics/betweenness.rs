//! Betweenness centrality via Brandes' algorithm.
//!
//! # Overview
//!
//! Betweenness centrality measures how often a participant lies on shortest
//! call paths between two others. High-betweenness participants are relays:
//! removing them would split the network.
//!
//! # Algorithm
//!
//! Brandes (2001) for unweighted directed graphs:
//!
//! 1. For each source node `s`, run BFS along call direction to compute
//!    shortest-path counts and distances.
//! 2. Accumulate dependency scores in reverse BFS order (farthest first).
//! 3. Sum the dependency scores across all source nodes.
//!
//! Complexity: O(V * E). Risk and community graphs use unit weights, so BFS
//! distances equal weighted shortest-path distances.
//!
//! # Normalization
//!
//! With `normalized = true`, scores are divided by `(n-1)*(n-2)`, the number
//! of ordered pairs excluding the node itself. Graphs with two or fewer nodes
//! are left unscaled (every score is 0 there anyway).

use std::collections::{HashMap, VecDeque};

use petgraph::{Direction, graph::NodeIndex};
use tracing::instrument;

use crate::graph::CallGraph;

/// Compute betweenness centrality for every participant.
///
/// # Returns
///
/// A `HashMap<String, f64>` mapping each participant id to its score.
/// Participants on no shortest path receive 0.0.
#[must_use]
#[instrument(skip(cg), fields(nodes = cg.node_count()))]
pub fn betweenness_centrality(cg: &CallGraph, normalized: bool) -> HashMap<String, f64> {
    let g = &cg.graph;
    let n = g.node_count();

    if n == 0 {
        return HashMap::new();
    }

    // Node-indexed betweenness accumulator.
    let mut cb: Vec<f64> = vec![0.0; n];

    for s in g.node_indices() {
        let si = s.index();

        // Nodes in order of discovery (farthest popped first).
        let mut stack: Vec<NodeIndex> = Vec::with_capacity(n);

        // predecessors[w]: nodes immediately preceding w on shortest paths from s.
        let mut predecessors: Vec<Vec<NodeIndex>> = vec![Vec::new(); n];

        // sigma[t]: number of shortest paths from s to t.
        let mut sigma: Vec<f64> = vec![0.0; n];
        sigma[si] = 1.0;

        // dist[t]: distance from s to t (-1 = unvisited).
        let mut dist: Vec<i64> = vec![-1; n];
        dist[si] = 0;

        let mut queue: VecDeque<NodeIndex> = VecDeque::new();
        queue.push_back(s);

        while let Some(v) = queue.pop_front() {
            let vi = v.index();
            stack.push(v);

            for w in g.neighbors_directed(v, Direction::Outgoing) {
                let wi = w.index();

                if dist[wi] < 0 {
                    dist[wi] = dist[vi] + 1;
                    queue.push_back(w);
                }

                if dist[wi] == dist[vi] + 1 {
                    sigma[wi] += sigma[vi];
                    predecessors[wi].push(v);
                }
            }
        }

        let mut delta: Vec<f64> = vec![0.0; n];

        while let Some(w) = stack.pop() {
            let wi = w.index();

            for &v in &predecessors[wi] {
                let vi = v.index();
                if sigma[wi] > 0.0 {
                    delta[vi] += (sigma[vi] / sigma[wi]) * (1.0 + delta[wi]);
                }
            }

            if wi != si {
                cb[wi] += delta[wi];
            }
        }
    }

    let scale = normalization_scale(n, normalized);

    g.node_indices()
        .map(|idx| (g[idx].id.clone(), cb[idx.index()] * scale))
        .collect()
}

#[allow(clippy::cast_precision_loss)]
fn normalization_scale(n: usize, normalized: bool) -> f64 {
    if normalized && n > 2 {
        1.0 / ((n - 1) * (n - 2)) as f64
    } else {
        1.0
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-10
    }

    #[test]
    fn empty_graph_returns_empty() {
        let bc = betweenness_centrality(&CallGraph::from_edges(&[]), true);
        assert!(bc.is_empty());
    }

    #[test]
    fn single_node_zero() {
        let bc = betweenness_centrality(&CallGraph::from_nodes_and_edges(&["A"], &[]), true);
        assert!(approx(bc["A"], 0.0));
    }

    #[test]
    fn chain_middle_is_bridge() {
        // A → B → C: B lies on the single A→C path.
        let g = CallGraph::from_edges(&[("A", "B"), ("B", "C")]);
        let raw = betweenness_centrality(&g, false);
        assert!(approx(raw["A"], 0.0));
        assert!(approx(raw["B"], 1.0));
        assert!(approx(raw["C"], 0.0));

        // n = 3 → scale 1 / (2 * 1).
        let norm = betweenness_centrality(&g, true);
        assert!(approx(norm["B"], 0.5));
    }

    #[test]
    fn diamond_splits_paths() {
        // A → B → D, A → C → D: two shortest A→D paths, half through each.
        let g = CallGraph::from_edges(&[("A", "B"), ("A", "C"), ("B", "D"), ("C", "D")]);
        let raw = betweenness_centrality(&g, false);
        assert!(approx(raw["B"], 0.5));
        assert!(approx(raw["C"], 0.5));
        assert!(approx(raw["A"], 0.0));
        assert!(approx(raw["D"], 0.0));
    }

    #[test]
    fn directed_cycle_is_symmetric() {
        let g = CallGraph::from_edges(&[("A", "B"), ("B", "C"), ("C", "A")]);
        let raw = betweenness_centrality(&g, false);
        assert!(approx(raw["A"], 1.0));
        assert!(approx(raw["B"], 1.0));
        assert!(approx(raw["C"], 1.0));
    }

    #[test]
    fn self_loop_does_not_create_paths() {
        let with_loop = CallGraph::from_edges(&[("A", "B"), ("B", "B"), ("B", "C")]);
        let without = CallGraph::from_edges(&[("A", "B"), ("B", "C")]);
        let a = betweenness_centrality(&with_loop, true);
        let b = betweenness_centrality(&without, true);
        for id in ["A", "B", "C"] {
            assert!(approx(a[id], b[id]), "{id}: {} vs {}", a[id], b[id]);
        }
    }

    #[test]
    fn every_node_has_a_score() {
        let g = CallGraph::from_nodes_and_edges(&["X"], &[("A", "B"), ("C", "D")]);
        let bc = betweenness_centrality(&g, true);
        assert_eq!(bc.len(), 5);
    }
}
