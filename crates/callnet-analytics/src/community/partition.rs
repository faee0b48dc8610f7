//! Node → community assignments and their modularity.

use std::collections::HashMap;

use petgraph::graph::UnGraph;
use petgraph::visit::EdgeRef;
use serde::Serialize;

/// One participant's community.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Assignment {
    pub node: String,
    pub community: u32,
}

/// A community assignment for every node of one stratum.
///
/// Community ids run `0..k` and are numbered in first-appearance order of
/// the nodes, so node order fully determines the labels.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Partition {
    assignments: Vec<Assignment>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl PartialEq for Partition {
    fn eq(&self, other: &Self) -> bool {
        self.assignments == other.assignments
    }
}

impl Partition {
    /// Build a partition from `(node, label)` pairs, renumbering labels to
    /// `0..k` by first appearance.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_labels<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, usize)>,
        S: Into<String>,
    {
        let mut renumber: HashMap<usize, u32> = HashMap::new();
        let mut assignments = Vec::new();
        let mut index = HashMap::new();

        for (node, label) in pairs {
            let next = renumber.len() as u32;
            let community = *renumber.entry(label).or_insert(next);
            let node = node.into();
            index.insert(node.clone(), assignments.len());
            assignments.push(Assignment { node, community });
        }

        Self { assignments, index }
    }

    /// Community of `node`, if it belongs to this partition.
    #[must_use]
    pub fn community_of(&self, node: &str) -> Option<u32> {
        self.index
            .get(node)
            .map(|&i| self.assignments[i].community)
    }

    /// Number of distinct communities.
    #[must_use]
    pub fn community_count(&self) -> usize {
        self.assignments
            .iter()
            .map(|a| a.community)
            .max()
            .map_or(0, |m| m as usize + 1)
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.assignments.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Assignment> {
        self.assignments.iter()
    }

    /// Members of `community`, in node order.
    #[must_use]
    pub fn members(&self, community: u32) -> Vec<&str> {
        self.assignments
            .iter()
            .filter(|a| a.community == community)
            .map(|a| a.node.as_str())
            .collect()
    }

    /// Whether both partitions group the same nodes together, ignoring
    /// community labels.
    #[must_use]
    pub fn same_grouping(&self, other: &Self) -> bool {
        if self.node_count() != other.node_count() {
            return false;
        }
        let mut forward: HashMap<u32, u32> = HashMap::new();
        let mut backward: HashMap<u32, u32> = HashMap::new();
        for a in &self.assignments {
            let Some(theirs) = other.community_of(&a.node) else {
                return false;
            };
            if *forward.entry(a.community).or_insert(theirs) != theirs
                || *backward.entry(theirs).or_insert(a.community) != a.community
            {
                return false;
            }
        }
        true
    }
}

/// Newman modularity of `partition` over a weighted undirected graph.
///
/// `Q = Σ_c [ in_c / m − γ · (tot_c / 2m)² ]`, where `m` is the total edge
/// weight, `in_c` the weight inside community `c` and `tot_c` the summed
/// weighted degree of its members (self-loops count twice). Nodes missing
/// from the partition are treated as singletons. A graph without edge
/// weight has modularity 0.
#[must_use]
pub fn modularity(graph: &UnGraph<String, f64>, partition: &Partition, resolution: f64) -> f64 {
    let total: f64 = graph.edge_references().map(|e| *e.weight()).sum();
    if total <= 0.0 {
        return 0.0;
    }

    // Label per node index; singletons get ids past the partition's range.
    let offset = partition.community_count();
    let label: Vec<usize> = graph
        .node_indices()
        .map(|idx| {
            partition
                .community_of(&graph[idx])
                .map_or(offset + idx.index(), |c| c as usize)
        })
        .collect();

    let mut internal: HashMap<usize, f64> = HashMap::new();
    let mut degree: HashMap<usize, f64> = HashMap::new();
    for edge in graph.edge_references() {
        let (a, b) = (edge.source().index(), edge.target().index());
        let w = *edge.weight();
        *degree.entry(label[a]).or_insert(0.0) += w;
        *degree.entry(label[b]).or_insert(0.0) += w;
        if label[a] == label[b] {
            *internal.entry(label[a]).or_insert(0.0) += w;
        }
    }

    degree
        .iter()
        .map(|(c, tot)| {
            let inside = internal.get(c).copied().unwrap_or(0.0);
            inside / total - resolution * (tot / (2.0 * total)).powi(2)
        })
        .sum()
}
