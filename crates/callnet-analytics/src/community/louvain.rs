//! Louvain modularity optimization.
//!
//! # Algorithm
//!
//! Blondel et al. (2008), multi-level:
//!
//! 1. **Local moving.** Every node starts in its own community. Nodes are
//!    visited in random order; each is removed from its community and
//!    inserted into the neighbouring community with the largest strictly
//!    positive modularity gain (or returned to its own). Passes repeat until
//!    none moves a node or a pass improves modularity by less than
//!    [`MIN_GAIN`].
//! 2. **Aggregation.** Each community becomes a node of a new graph; edge
//!    weights between communities are summed and internal weight becomes a
//!    self-loop.
//! 3. Repeat on the aggregated graph until a level no longer improves
//!    modularity by [`MIN_GAIN`].
//!
//! # Determinism
//!
//! Visiting order (nodes and candidate communities) comes from a
//! [`StdRng`]. With [`CommunityConfig::seed`] set, the same graph always
//! yields the same partition. With `None` the RNG is seeded from entropy.

use std::collections::{BTreeMap, HashMap};

use petgraph::graph::UnGraph;
use petgraph::visit::EdgeRef;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, trace};

use super::partition::Partition;

/// Smallest modularity improvement that counts as progress.
pub const MIN_GAIN: f64 = 1e-7;

/// Louvain parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommunityConfig {
    /// RNG seed for visiting order. Default: `Some(42)`.
    pub seed: Option<u64>,
    /// Resolution γ; larger values favour smaller communities. Default: 1.0.
    pub resolution: f64,
}

impl Default for CommunityConfig {
    fn default() -> Self {
        Self {
            seed: Some(42),
            resolution: 1.0,
        }
    }
}

impl CommunityConfig {
    fn rng(&self) -> StdRng {
        self.seed
            .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64)
    }
}

// ---------------------------------------------------------------------------
// Level graph
// ---------------------------------------------------------------------------

/// Compact weighted graph for one level of the hierarchy.
#[derive(Debug, Clone)]
struct LevelGraph {
    /// Non-loop neighbours with edge weight, both directions listed.
    adj: Vec<Vec<(usize, f64)>>,
    /// Self-loop weight per node.
    loops: Vec<f64>,
    /// Weighted degree; self-loops count twice.
    degree: Vec<f64>,
    /// Total edge weight, self-loops counted once.
    total_weight: f64,
}

impl LevelGraph {
    fn from_ungraph(graph: &UnGraph<String, f64>) -> Self {
        let n = graph.node_count();
        let mut edges = Vec::with_capacity(graph.edge_count());
        for e in graph.edge_references() {
            edges.push((e.source().index(), e.target().index(), *e.weight()));
        }
        Self::from_edges(n, edges)
    }

    fn from_edges<I>(n: usize, edges: I) -> Self
    where
        I: IntoIterator<Item = (usize, usize, f64)>,
    {
        let mut adj = vec![Vec::new(); n];
        let mut loops = vec![0.0; n];
        let mut degree = vec![0.0; n];
        let mut total_weight = 0.0;

        for (a, b, w) in edges {
            total_weight += w;
            if a == b {
                loops[a] += w;
                degree[a] += 2.0 * w;
            } else {
                adj[a].push((b, w));
                adj[b].push((a, w));
                degree[a] += w;
                degree[b] += w;
            }
        }

        Self {
            adj,
            loops,
            degree,
            total_weight,
        }
    }

    const fn len(&self) -> usize {
        self.loops.len()
    }

    /// Collapse communities into nodes. `labels` must be dense `0..k`.
    fn induce(&self, labels: &[usize], k: usize) -> Self {
        let mut weights: BTreeMap<(usize, usize), f64> = BTreeMap::new();
        for (node, &w) in self.loops.iter().enumerate() {
            if w > 0.0 {
                *weights.entry((labels[node], labels[node])).or_insert(0.0) += w;
            }
        }
        for (a, neighbours) in self.adj.iter().enumerate() {
            for &(b, w) in neighbours {
                // Each undirected edge is listed twice; take it once.
                if a < b {
                    let (ca, cb) = (labels[a], labels[b]);
                    let key = (ca.min(cb), ca.max(cb));
                    *weights.entry(key).or_insert(0.0) += w;
                }
            }
        }
        Self::from_edges(k, weights.into_iter().map(|((a, b), w)| (a, b, w)))
    }
}

// ---------------------------------------------------------------------------
// Local moving
// ---------------------------------------------------------------------------

/// Community bookkeeping for one level.
struct Status {
    node_to_comm: Vec<usize>,
    /// Summed weighted degree per community.
    comm_degree: Vec<f64>,
    /// Internal edge weight per community.
    comm_internal: Vec<f64>,
}

impl Status {
    fn singletons(g: &LevelGraph) -> Self {
        Self {
            node_to_comm: (0..g.len()).collect(),
            comm_degree: g.degree.clone(),
            comm_internal: g.loops.clone(),
        }
    }

    fn remove(&mut self, g: &LevelGraph, node: usize, comm: usize, links_in: f64) {
        self.comm_degree[comm] -= g.degree[node];
        self.comm_internal[comm] -= links_in + g.loops[node];
    }

    fn insert(&mut self, g: &LevelGraph, node: usize, comm: usize, links_in: f64) {
        self.node_to_comm[node] = comm;
        self.comm_degree[comm] += g.degree[node];
        self.comm_internal[comm] += links_in + g.loops[node];
    }

    fn modularity(&self, g: &LevelGraph, resolution: f64) -> f64 {
        let m = g.total_weight;
        if m <= 0.0 {
            return 0.0;
        }
        let mut seen = vec![false; g.len()];
        let mut q = 0.0;
        for &c in &self.node_to_comm {
            if !seen[c] {
                seen[c] = true;
                q += self.comm_internal[c] / m
                    - resolution * (self.comm_degree[c] / (2.0 * m)).powi(2);
            }
        }
        q
    }

    /// Weight from `node` to each neighbouring community, in first-seen order.
    fn neighbour_communities(&self, g: &LevelGraph, node: usize) -> Vec<(usize, f64)> {
        let mut out: Vec<(usize, f64)> = Vec::new();
        let mut pos: HashMap<usize, usize> = HashMap::new();
        for &(nb, w) in &g.adj[node] {
            let c = self.node_to_comm[nb];
            match pos.get(&c) {
                Some(&i) => out[i].1 += w,
                None => {
                    pos.insert(c, out.len());
                    out.push((c, w));
                }
            }
        }
        out
    }

    /// Repeated local-moving passes. Returns `true` if any node moved.
    fn one_level(&mut self, g: &LevelGraph, resolution: f64, rng: &mut StdRng) -> bool {
        let two_m = 2.0 * g.total_weight;
        let mut moved_any = false;
        let mut current = self.modularity(g, resolution);
        let mut order: Vec<usize> = (0..g.len()).collect();

        loop {
            let mut moved = false;
            order.shuffle(rng);

            for &node in &order {
                let own = self.node_to_comm[node];
                let degc_totw = g.degree[node] / two_m;
                let mut neighbours = self.neighbour_communities(g, node);
                let own_links = neighbours
                    .iter()
                    .find(|(c, _)| *c == own)
                    .map_or(0.0, |(_, w)| *w);

                let remove_cost = -own_links
                    + resolution * (self.comm_degree[own] - g.degree[node]) * degc_totw;
                self.remove(g, node, own, own_links);

                let mut best = own;
                let mut best_gain = 0.0;
                neighbours.shuffle(rng);
                for &(comm, links) in &neighbours {
                    let gain =
                        remove_cost + links - resolution * self.comm_degree[comm] * degc_totw;
                    if gain > best_gain {
                        best_gain = gain;
                        best = comm;
                    }
                }

                let best_links = neighbours
                    .iter()
                    .find(|(c, _)| *c == best)
                    .map_or(0.0, |(_, w)| *w);
                self.insert(g, node, best, best_links);
                if best != own {
                    moved = true;
                    moved_any = true;
                }
            }

            let next = self.modularity(g, resolution);
            trace!(modularity = next, moved, "louvain pass");
            if !moved || next - current < MIN_GAIN {
                break;
            }
            current = next;
        }

        moved_any
    }

    /// Dense `0..k` labels in first-appearance order of nodes.
    fn renumber(&self) -> (Vec<usize>, usize) {
        let mut map: HashMap<usize, usize> = HashMap::new();
        let labels = self
            .node_to_comm
            .iter()
            .map(|c| {
                let next = map.len();
                *map.entry(*c).or_insert(next)
            })
            .collect();
        (labels, map.len())
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Partition an undirected weighted graph into communities.
///
/// Node weights are participant ids. A graph without edges yields one
/// community per node.
#[must_use]
#[instrument(skip_all, fields(nodes = graph.node_count(), edges = graph.edge_count()))]
pub fn louvain(graph: &UnGraph<String, f64>, config: &CommunityConfig) -> Partition {
    let ids = || graph.node_indices().map(|idx| graph[idx].clone());

    let mut level = LevelGraph::from_ungraph(graph);
    if level.total_weight <= 0.0 {
        return Partition::from_labels(ids().zip(0..));
    }

    let mut rng = config.rng();
    let resolution = config.resolution;

    // membership[i]: node of the current level that input node i sits in.
    let mut membership: Vec<usize> = (0..level.len()).collect();
    let mut best: Option<f64> = None;
    let mut levels = 0_usize;

    loop {
        let mut status = Status::singletons(&level);
        status.one_level(&level, resolution, &mut rng);
        let q = status.modularity(&level, resolution);

        if let Some(prev) = best {
            if q - prev < MIN_GAIN {
                break;
            }
        }

        let (labels, k) = status.renumber();
        for m in &mut membership {
            *m = labels[*m];
        }
        best = Some(q);
        levels += 1;

        if k == level.len() {
            break;
        }
        level = level.induce(&labels, k);
    }

    debug!(
        levels,
        modularity = best.unwrap_or(0.0),
        "louvain finished"
    );
    Partition::from_labels(ids().zip(membership))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph(nodes: &[&str], edges: &[(usize, usize)]) -> UnGraph<String, f64> {
        let mut g = UnGraph::new_undirected();
        let idx: Vec<_> = nodes.iter().map(|n| g.add_node((*n).to_string())).collect();
        for &(a, b) in edges {
            g.add_edge(idx[a], idx[b], 1.0);
        }
        g
    }

    fn two_cliques() -> UnGraph<String, f64> {
        // Two 4-cliques joined by a single bridge d-e.
        graph(
            &["a", "b", "c", "d", "e", "f", "g", "h"],
            &[
                (0, 1),
                (0, 2),
                (0, 3),
                (1, 2),
                (1, 3),
                (2, 3),
                (4, 5),
                (4, 6),
                (4, 7),
                (5, 6),
                (5, 7),
                (6, 7),
                (3, 4),
            ],
        )
    }

    #[test]
    fn finds_two_cliques() {
        let p = louvain(&two_cliques(), &CommunityConfig::default());
        assert_eq!(p.community_count(), 2);
        assert_eq!(p.members(0), vec!["a", "b", "c", "d"]);
        assert_eq!(p.members(1), vec!["e", "f", "g", "h"]);
    }

    #[test]
    fn same_seed_same_partition() {
        let g = two_cliques();
        let config = CommunityConfig {
            seed: Some(7),
            resolution: 1.0,
        };
        assert_eq!(louvain(&g, &config), louvain(&g, &config));
    }

    #[test]
    fn edgeless_graph_gives_singletons() {
        let g = graph(&["a", "b", "c"], &[]);
        let p = louvain(&g, &CommunityConfig::default());
        assert_eq!(p.community_count(), 3);
        assert_eq!(p.community_of("c"), Some(2));
    }

    #[test]
    fn single_edge_is_one_community() {
        let g = graph(&["a", "b"], &[(0, 1)]);
        let p = louvain(&g, &CommunityConfig::default());
        assert_eq!(p.community_count(), 1);
    }

    #[test]
    fn isolated_node_stays_alone() {
        let g = graph(&["a", "b", "c", "z"], &[(0, 1), (1, 2), (0, 2)]);
        let p = louvain(&g, &CommunityConfig::default());
        assert_eq!(p.community_count(), 2);
        assert_eq!(p.members(1), vec!["z"]);
    }

    #[test]
    fn induced_graph_preserves_total_weight() {
        let level = LevelGraph::from_ungraph(&two_cliques());
        let labels = [0, 0, 0, 0, 1, 1, 1, 1];
        let induced = level.induce(&labels, 2);
        assert!((induced.total_weight - level.total_weight).abs() < 1e-12);
        assert!((induced.loops[0] - 6.0).abs() < 1e-12);
        assert_eq!(induced.adj[0], vec![(1, 1.0)]);
    }
}
