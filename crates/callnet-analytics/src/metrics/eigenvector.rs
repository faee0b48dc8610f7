//! Eigenvector centrality via power iteration.
//!
//! # Overview
//!
//! Eigenvector centrality scores a participant by the scores of the people
//! who call it: being called by well-connected participants counts more
//! than being called by peripheral ones.
//!
//! # Algorithm
//!
//! Power iteration on `A + I`, where `A` is the unweighted adjacency matrix
//! (edge `u → v` passes `u`'s score to `v`):
//!
//! 1. Initialize every score to `1 / n`.
//! 2. `x'(v) = x(v) + Σ x(u)` over all `u → v`.
//! 3. Normalize `x'` to unit L2 norm.
//! 4. Stop once `Σ |x' - x| < n · tolerance`.
//!
//! The identity shift keeps the iteration from oscillating on bipartite
//! structures and lets acyclic graphs converge (to a vector concentrated
//! on their sinks).
//!
//! # Failure
//!
//! Hitting `max_iter` is an error, not a silent partial result. Callers
//! that can live without this column (see [`super::MetricTable`]) absorb it.

use std::collections::HashMap;

use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::MetricError;
use crate::graph::CallGraph;

/// Power-iteration limits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EigenvectorConfig {
    /// Default: 1000.
    pub max_iter: usize,
    /// Per-node convergence tolerance. Default: 1e-6.
    pub tolerance: f64,
}

impl Default for EigenvectorConfig {
    fn default() -> Self {
        Self {
            max_iter: 1000,
            tolerance: 1e-6,
        }
    }
}

/// Result of eigenvector centrality computation.
#[derive(Debug, Clone)]
pub struct EigenvectorResult {
    /// Participant id → score (unit L2 norm across all nodes).
    pub scores: HashMap<String, f64>,
    /// Number of iterations performed.
    pub iterations: usize,
}

/// Compute eigenvector centrality for every participant.
///
/// # Errors
///
/// - [`MetricError::EmptyGraph`] if the graph has no nodes.
/// - [`MetricError::NotConverged`] if `max_iter` iterations pass without
///   meeting the tolerance.
#[instrument(skip(cg), fields(nodes = cg.node_count()))]
#[allow(clippy::cast_precision_loss)]
pub fn eigenvector_centrality(
    cg: &CallGraph,
    config: &EigenvectorConfig,
) -> Result<EigenvectorResult, MetricError> {
    let g = &cg.graph;
    let n = g.node_count();

    if n == 0 {
        return Err(MetricError::EmptyGraph);
    }

    let n_f64 = n as f64;
    let mut x: Vec<f64> = vec![1.0 / n_f64; n];

    for iter in 0..config.max_iter {
        let last = x.clone();

        for edge in g.edge_references() {
            x[edge.target().index()] += last[edge.source().index()];
        }

        let norm = x.iter().map(|v| v * v).sum::<f64>().sqrt();
        let norm = if norm > 0.0 { norm } else { 1.0 };
        for v in &mut x {
            *v /= norm;
        }

        let err: f64 = x.iter().zip(&last).map(|(a, b)| (a - b).abs()).sum();
        if err < n_f64 * config.tolerance {
            let iterations = iter + 1;
            debug!(iterations, "eigenvector centrality converged");
            let scores = g
                .node_indices()
                .map(|idx| (g[idx].id.clone(), x[idx.index()]))
                .collect();
            return Ok(EigenvectorResult { scores, iterations });
        }
    }

    Err(MetricError::NotConverged {
        metric: "eigenvector",
        iterations: config.max_iter,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64, eps: f64) -> bool {
        (a - b).abs() < eps
    }

    #[test]
    fn empty_graph_is_an_error() {
        let err = eigenvector_centrality(&CallGraph::from_edges(&[]), &EigenvectorConfig::default())
            .expect_err("empty");
        assert_eq!(err, MetricError::EmptyGraph);
    }

    #[test]
    fn directed_cycle_is_uniform() {
        let g = CallGraph::from_edges(&[("A", "B"), ("B", "C"), ("C", "A")]);
        let ev = eigenvector_centrality(&g, &EigenvectorConfig::default()).expect("converges");
        let expected = 1.0 / 3.0_f64.sqrt();
        for id in ["A", "B", "C"] {
            assert!(approx(ev.scores[id], expected, 1e-6), "{id}={}", ev.scores[id]);
        }
    }

    #[test]
    fn unit_l2_norm() {
        let g = CallGraph::from_edges(&[("A", "B"), ("B", "C"), ("C", "A"), ("A", "C")]);
        let ev = eigenvector_centrality(&g, &EigenvectorConfig::default()).expect("converges");
        let norm: f64 = ev.scores.values().map(|v| v * v).sum::<f64>().sqrt();
        assert!(approx(norm, 1.0, 1e-9));
    }

    #[test]
    fn hub_receiving_calls_ranks_highest() {
        let g = CallGraph::from_edges(&[
            ("a", "hub"),
            ("b", "hub"),
            ("c", "hub"),
            ("hub", "a"),
        ]);
        let ev = eigenvector_centrality(&g, &EigenvectorConfig::default()).expect("converges");
        assert!(ev.scores["hub"] > ev.scores["a"]);
        assert!(ev.scores["a"] > ev.scores["b"]);
    }

    #[test]
    fn tiny_cap_fails_to_converge() {
        let g = CallGraph::from_edges(&[("A", "B"), ("B", "C")]);
        let config = EigenvectorConfig {
            max_iter: 2,
            tolerance: 1e-6,
        };
        let err = eigenvector_centrality(&g, &config).expect_err("cap too small");
        assert_eq!(
            err,
            MetricError::NotConverged {
                metric: "eigenvector",
                iterations: 2
            }
        );
    }

    #[test]
    fn isolated_nodes_get_scores() {
        let g = CallGraph::from_nodes_and_edges(&["Z"], &[("A", "B"), ("B", "A")]);
        let ev = eigenvector_centrality(&g, &EigenvectorConfig::default()).expect("converges");
        assert_eq!(ev.scores.len(), 3);
        assert!(ev.scores["A"] > ev.scores["Z"]);
    }
}
