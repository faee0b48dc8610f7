//! Closeness centrality on inward distances.
//!
//! A participant's closeness is high when the people who can reach it
//! (through a chain of calls) reach it in few hops. Distances are measured
//! *to* the node, following edges backwards from it.
//!
//! In a graph that is not strongly connected only `r - 1` other nodes reach
//! a given target. The score uses the Wasserman–Faust correction so that
//! nodes reached by few others do not get inflated values:
//!
//! ```text
//! C(v) = ((r - 1) / Σ d(u, v)) · ((r - 1) / (n - 1))
//! ```

use std::collections::{HashMap, VecDeque};

use petgraph::Direction;
use tracing::instrument;

use crate::graph::CallGraph;

/// Compute inward closeness centrality for every participant.
///
/// Nodes nobody reaches, and every node of a single-node graph, score 0.
#[must_use]
#[instrument(skip(cg), fields(nodes = cg.node_count()))]
#[allow(clippy::cast_precision_loss)]
pub fn closeness_centrality(cg: &CallGraph) -> HashMap<String, f64> {
    let g = &cg.graph;
    let n = g.node_count();
    let mut scores = HashMap::with_capacity(n);

    for target in g.node_indices() {
        // BFS over reversed edges: dist[u] = hops from u to target.
        let mut dist: Vec<Option<usize>> = vec![None; n];
        dist[target.index()] = Some(0);
        let mut queue = VecDeque::from([target]);
        let mut reached = 0_usize;
        let mut total = 0_usize;

        while let Some(v) = queue.pop_front() {
            let dv = dist[v.index()].unwrap_or(0);
            reached += 1;
            total += dv;
            for u in g.neighbors_directed(v, Direction::Incoming) {
                if dist[u.index()].is_none() {
                    dist[u.index()] = Some(dv + 1);
                    queue.push_back(u);
                }
            }
        }

        let score = if total > 0 && n > 1 {
            let others = (reached - 1) as f64;
            (others / total as f64) * (others / (n - 1) as f64)
        } else {
            0.0
        };
        scores.insert(g[target].id.clone(), score);
    }

    scores
}
