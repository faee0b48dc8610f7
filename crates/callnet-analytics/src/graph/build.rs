//! Communication graph construction from call records.
//!
//! # Overview
//!
//! Every participant seen as `Caller_ID` or `Receiver_ID` becomes a node;
//! every call becomes a directed edge from the participant who initiated it
//! to the one who was called.
//!
//! ## Edge Direction
//!
//! An edge `A → B` means "A called B". For `Outgoing` rows that is
//! `Caller_ID → Receiver_ID`; for `Incoming` rows the direction is flipped
//! to `Receiver_ID → Caller_ID`.
//!
//! ## Repeated Calls
//!
//! Repeated calls between the same ordered pair share one edge. The
//! [`EdgeMerge`] policy decides what happens to its weight: `LastWrite`
//! keeps the most recent call's values, `Accumulate` sums them. The call
//! counter on the edge increments under both policies. Unit-weight graphs
//! keep every edge weight at 1.0 under either policy; only `duration`
//! accumulates.
//!
//! ## Cache Invalidation
//!
//! [`CallGraph::content_hash`] is a BLAKE3 hash of the sorted node and edge
//! sets.
//! Two tables producing the same edges (in any row order) share a hash.

#![allow(clippy::module_name_repetitions)]

use std::collections::HashMap;

use callnet_core::{CallRecord, CallTable, ErrorCode};
use petgraph::graph::{DiGraph, NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};
use tracing::instrument;

// ---------------------------------------------------------------------------
// Node and edge payloads
// ---------------------------------------------------------------------------

/// A call participant (node payload).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Participant {
    pub id: String,
    /// Location of the most recent record mentioning this participant.
    pub location: String,
}

/// An observed caller→receiver relationship (edge payload).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CallEdge {
    /// Weight used by weighted metrics (PageRank, modularity).
    pub weight: f64,
    /// Call duration under the active merge policy.
    pub duration: f64,
    /// Number of calls collapsed into this edge.
    pub calls: u32,
}

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// What an edge's `weight` is derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeWeighting {
    /// Weight is the call duration.
    #[default]
    Duration,
    /// Every call weighs 1.0 (risk and community analysis).
    Unit,
}

/// How repeated calls on the same ordered pair combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeMerge {
    /// The most recent call overwrites weight and duration.
    #[default]
    LastWrite,
    /// Weights and durations are summed across calls.
    Accumulate,
}

impl EdgeMerge {
    fn apply(self, current: f64, incoming: f64) -> f64 {
        match self {
            Self::LastWrite => incoming,
            Self::Accumulate => current + incoming,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GraphOptions {
    pub weighting: EdgeWeighting,
    pub merge: EdgeMerge,
}

impl GraphOptions {
    /// Unit-weight graph with the given merge policy.
    #[must_use]
    pub const fn unit(merge: EdgeMerge) -> Self {
        Self {
            weighting: EdgeWeighting::Unit,
            merge,
        }
    }
}

/// Errors raised while building a graph from records constructed in code.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GraphError {
    #[error("record at line {line} has an empty caller or receiver id")]
    MissingEndpoint { line: u64 },
}

impl GraphError {
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::MissingEndpoint { .. } => ErrorCode::MissingField,
        }
    }
}

// ---------------------------------------------------------------------------
// CallGraph
// ---------------------------------------------------------------------------

/// A directed communication graph.
///
/// Node indices follow first-appearance order in the source records, so
/// iteration over `graph.node_indices()` is deterministic.
#[derive(Debug, Clone)]
pub struct CallGraph {
    /// Directed graph: nodes = participants, edges = caller→receiver.
    pub graph: DiGraph<Participant, CallEdge>,
    /// Mapping from participant id to petgraph `NodeIndex`.
    pub node_map: HashMap<String, NodeIndex>,
    /// BLAKE3 content hash of the edge set.
    pub content_hash: String,
    options: GraphOptions,
}

impl CallGraph {
    /// Build a graph from validated call records.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::MissingEndpoint`] if a record has an empty
    /// caller or receiver id.
    #[instrument(skip(records))]
    pub fn from_records<'a, I>(records: I, options: &GraphOptions) -> Result<Self, GraphError>
    where
        I: IntoIterator<Item = &'a CallRecord>,
    {
        let mut builder = Self::empty(*options);

        for record in records {
            if record.caller_id.is_empty() || record.receiver_id.is_empty() {
                return Err(GraphError::MissingEndpoint { line: record.line });
            }

            builder.upsert_node(&record.caller_id, &record.location);
            builder.upsert_node(&record.receiver_id, &record.location);

            let weight = match options.weighting {
                EdgeWeighting::Duration => record.duration,
                EdgeWeighting::Unit => 1.0,
            };
            builder.upsert_edge(record.initiator(), record.recipient(), weight, record.duration);
        }

        builder.content_hash = compute_edge_hash(&builder);
        Ok(builder)
    }

    /// Build a graph from a whole call table.
    ///
    /// # Errors
    ///
    /// See [`CallGraph::from_records`].
    pub fn from_table(table: &CallTable, options: &GraphOptions) -> Result<Self, GraphError> {
        Self::from_records(table.iter(), options)
    }

    /// Build a unit-weight graph from an explicit edge list.
    ///
    /// Nodes appear in first-mention order. Locations are left empty.
    #[must_use]
    pub fn from_edges(edges: &[(&str, &str)]) -> Self {
        Self::from_nodes_and_edges(&[], edges)
    }

    /// Like [`CallGraph::from_edges`], but declares `nodes` first so that
    /// isolated participants can be represented.
    #[must_use]
    pub fn from_nodes_and_edges(nodes: &[&str], edges: &[(&str, &str)]) -> Self {
        let mut builder = Self::empty(GraphOptions::unit(EdgeMerge::LastWrite));
        for id in nodes {
            builder.upsert_node(id, "");
        }
        for (from, to) in edges {
            builder.ensure_node(from);
            builder.ensure_node(to);
            builder.upsert_edge(from, to, 1.0, 0.0);
        }
        builder.content_hash = compute_edge_hash(&builder);
        builder
    }

    fn empty(options: GraphOptions) -> Self {
        Self {
            graph: DiGraph::new(),
            node_map: HashMap::new(),
            content_hash: String::new(),
            options,
        }
    }

    fn ensure_node(&mut self, id: &str) -> NodeIndex {
        if let Some(&idx) = self.node_map.get(id) {
            return idx;
        }
        let idx = self.graph.add_node(Participant {
            id: id.to_string(),
            location: String::new(),
        });
        self.node_map.insert(id.to_string(), idx);
        idx
    }

    fn upsert_node(&mut self, id: &str, location: &str) -> NodeIndex {
        let idx = self.ensure_node(id);
        location.clone_into(&mut self.graph[idx].location);
        idx
    }

    fn upsert_edge(&mut self, from: &str, to: &str, weight: f64, duration: f64) {
        let a = self.node_map[from];
        let b = self.node_map[to];
        match self.graph.find_edge(a, b) {
            Some(e) => {
                let merge = self.options.merge;
                let merged = self.merge_weight(self.graph[e].weight, weight);
                let edge = &mut self.graph[e];
                edge.weight = merged;
                edge.duration = merge.apply(edge.duration, duration);
                edge.calls += 1;
            }
            None => {
                self.graph.add_edge(
                    a,
                    b,
                    CallEdge {
                        weight,
                        duration,
                        calls: 1,
                    },
                );
            }
        }
    }

    fn merge_weight(&self, current: f64, incoming: f64) -> f64 {
        match self.options.weighting {
            EdgeWeighting::Unit => 1.0,
            EdgeWeighting::Duration => self.options.merge.apply(current, incoming),
        }
    }

    /// Copy of this graph with nodes in id order and edges in
    /// `(source, target)` order.
    ///
    /// Metric passes sum floats in node and edge order, so scores computed
    /// on the canonical copy are bit-identical for any row order of the
    /// source table.
    #[must_use]
    pub fn canonical(&self) -> Self {
        let mut ids = self.node_ids();
        ids.sort_unstable();

        let mut out = Self::empty(self.options);
        for id in ids {
            let p = &self.graph[self.node_map[id]];
            out.upsert_node(&p.id, &p.location);
        }

        let mut edges: Vec<(NodeIndex, NodeIndex, CallEdge)> = self
            .graph
            .edge_references()
            .map(|e| {
                (
                    out.node_map[self.graph[e.source()].id.as_str()],
                    out.node_map[self.graph[e.target()].id.as_str()],
                    *e.weight(),
                )
            })
            .collect();
        edges.sort_unstable_by_key(|(a, b, _)| (a.index(), b.index()));
        for (a, b, w) in edges {
            out.graph.add_edge(a, b, w);
        }

        out.content_hash.clone_from(&self.content_hash);
        out
    }

    /// Return the number of participants in the graph.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Return the number of distinct caller→receiver edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Look up the `NodeIndex` for a participant id.
    #[must_use]
    pub fn node_index(&self, id: &str) -> Option<NodeIndex> {
        self.node_map.get(id).copied()
    }

    /// Return the participant id for a node.
    #[must_use]
    pub fn node_id(&self, idx: NodeIndex) -> Option<&str> {
        self.graph.node_weight(idx).map(|p| p.id.as_str())
    }

    /// The participant record for an id.
    #[must_use]
    pub fn participant(&self, id: &str) -> Option<&Participant> {
        self.node_index(id).map(|idx| &self.graph[idx])
    }

    /// Participant ids in node-index order.
    #[must_use]
    pub fn node_ids(&self) -> Vec<&str> {
        self.graph
            .node_indices()
            .map(|idx| self.graph[idx].id.as_str())
            .collect()
    }

    /// The merge policy this graph was built with.
    #[must_use]
    pub const fn merge_policy(&self) -> EdgeMerge {
        self.options.merge
    }

    /// Undirected projection used by community detection.
    ///
    /// `A → B` and `B → A` collapse into a single edge whose weight follows
    /// the graph's merge policy, in edge insertion order (always 1.0 on a
    /// unit-weight graph). Self-loops are kept.
    #[must_use]
    pub fn undirected(&self) -> UnGraph<String, f64> {
        let mut out = UnGraph::<String, f64>::with_capacity(self.node_count(), self.edge_count());
        for idx in self.graph.node_indices() {
            out.add_node(self.graph[idx].id.clone());
        }

        for edge in self.graph.edge_references() {
            // Node indices are shared between the two graphs.
            let (a, b) = (edge.source(), edge.target());
            let weight = edge.weight().weight;
            match out.find_edge(a, b) {
                Some(e) => {
                    let merged = self.merge_weight(out[e], weight);
                    out[e] = merged;
                }
                None => {
                    out.add_edge(a, b, weight);
                }
            }
        }

        out
    }
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

/// Compute a BLAKE3 hash of the sorted node and edge lists.
fn compute_edge_hash(g: &CallGraph) -> String {
    let mut edges: Vec<(&str, &str)> = g
        .graph
        .edge_references()
        .map(|e| {
            (
                g.graph[e.source()].id.as_str(),
                g.graph[e.target()].id.as_str(),
            )
        })
        .collect();
    edges.sort_unstable();

    let mut nodes: Vec<&str> = g.node_ids();
    nodes.sort_unstable();

    let mut hasher = blake3::Hasher::new();
    for id in nodes {
        hasher.update(id.as_bytes());
        hasher.update(b"\x00");
    }
    hasher.update(b"\x01");
    for (from, to) in edges {
        hasher.update(from.as_bytes());
        hasher.update(b"\x00");
        hasher.update(to.as_bytes());
        hasher.update(b"\n");
    }
    format!("blake3:{}", hasher.finalize().to_hex())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
