//! Weighted PageRank.
//!
//! # Overview
//!
//! PageRank ranks participants by how much "call flow" ends at them: a
//! participant called by many others, or by a few highly ranked ones, ranks
//! high.
//!
//! # Algorithm
//!
//! Iterative power method on the row-stochastic weight matrix:
//!
//! ```text
//! PR(v) = (1 - d) / N + d * Σ PR(u) * w(u, v) / W(u)  +  d * D / N
//! ```
//!
//! where `d` is the damping factor (default 0.85), `W(u)` the total outgoing
//! weight of `u`, and `D` the rank held by dangling nodes (nodes whose
//! outgoing weight is zero), which is spread uniformly over all nodes.
//!
//! Iteration stops once the L1 distance between successive rank vectors
//! drops below `N * tolerance`. Running out of iterations is not an error:
//! the last vector is returned with `converged = false` and a warning.

use std::collections::HashMap;

use petgraph::{Direction, visit::EdgeRef};
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

use crate::graph::CallGraph;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Configuration for PageRank computation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageRankConfig {
    /// Damping factor (probability of following a call vs teleporting).
    /// Default: 0.85.
    pub damping: f64,
    /// Per-node convergence threshold. Default: 1e-6.
    pub tolerance: f64,
    /// Maximum number of iterations. Default: 100.
    pub max_iter: usize,
}

impl Default for PageRankConfig {
    fn default() -> Self {
        Self {
            damping: 0.85,
            tolerance: 1e-6,
            max_iter: 100,
        }
    }
}

// ---------------------------------------------------------------------------
// Result
// ---------------------------------------------------------------------------

/// Result of a PageRank computation.
#[derive(Debug, Clone)]
pub struct PageRankResult {
    /// PageRank scores: participant id → score. Sums to 1.
    pub scores: HashMap<String, f64>,
    /// Number of iterations performed.
    pub iterations: usize,
    /// Whether the algorithm converged within `max_iter`.
    pub converged: bool,
}

// ---------------------------------------------------------------------------
// PageRank
// ---------------------------------------------------------------------------

/// Compute weighted PageRank over the call graph.
///
/// Edge weights come from [`crate::graph::CallEdge::weight`]. An empty graph
/// yields an empty, converged result.
#[must_use]
#[instrument(skip(cg, config), fields(nodes = cg.node_count()))]
#[allow(clippy::cast_precision_loss)]
pub fn pagerank(cg: &CallGraph, config: &PageRankConfig) -> PageRankResult {
    let g = &cg.graph;
    let n = g.node_count();

    if n == 0 {
        return PageRankResult {
            scores: HashMap::new(),
            iterations: 0,
            converged: true,
        };
    }

    let n_f64 = n as f64;
    let teleport = (1.0 - config.damping) / n_f64;

    // Total outgoing weight per node; zero marks a dangling node.
    let out_weight: Vec<f64> = g
        .node_indices()
        .map(|idx| {
            g.edges_directed(idx, Direction::Outgoing)
                .map(|e| e.weight().weight)
                .sum()
        })
        .collect();

    let mut ranks = vec![1.0 / n_f64; n];
    let mut new_ranks = vec![0.0_f64; n];

    let mut iterations = 0;
    let mut converged = false;

    for _ in 0..config.max_iter {
        iterations += 1;

        let dangling: f64 = out_weight
            .iter()
            .zip(&ranks)
            .filter(|(w, _)| **w <= 0.0)
            .map(|(_, r)| r)
            .sum();
        let base = teleport + config.damping * dangling / n_f64;

        for r in &mut new_ranks {
            *r = base;
        }

        for edge in g.edge_references() {
            let src = edge.source().index();
            let total = out_weight[src];
            if total > 0.0 {
                new_ranks[edge.target().index()] +=
                    config.damping * ranks[src] * edge.weight().weight / total;
            }
        }

        // L1 norm of delta.
        let delta: f64 = ranks
            .iter()
            .zip(new_ranks.iter())
            .map(|(old, new)| (old - new).abs())
            .sum();

        std::mem::swap(&mut ranks, &mut new_ranks);

        if delta < n_f64 * config.tolerance {
            converged = true;
            break;
        }
    }

    if !converged {
        warn!(
            iterations,
            max_iter = config.max_iter,
            "pagerank did not converge; returning last iterate"
        );
    }

    let scores = g
        .node_indices()
        .map(|idx| (g[idx].id.clone(), ranks[idx.index()]))
        .collect();

    PageRankResult {
        scores,
        iterations,
        converged,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
