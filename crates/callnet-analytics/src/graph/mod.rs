//! Communication graph module.
//!
//! # Overview
//!
//! This module turns a validated [`callnet_core::CallTable`] into a
//! petgraph-based directed graph of who called whom. The graph feeds every
//! metric, the risk scorer and (through its undirected projection) the
//! community aggregator.
//!
//! ## Pipeline
//!
//! ```text
//! CallTable (validated CSV rows)
//!        ↓  build::CallGraph::from_table()
//! CallGraph (DiGraph<Participant, CallEdge>)
//!   ├─ metrics::*            centrality and PageRank
//!   ├─ CallGraph::undirected()  → community::louvain
//!   └─ stats::GraphStats::from_graph()
//! ```
//!
//! ## Typical Usage
//!
//! ```rust,ignore
//! use callnet_analytics::graph::{CallGraph, GraphOptions, GraphStats};
//!
//! let table = callnet_core::load_calls(path)?;
//! let graph = CallGraph::from_table(&table, &GraphOptions::default())?;
//! let stats = GraphStats::from_graph(&graph);
//!
//! println!("nodes={} edges={} density={:.3}",
//!     stats.node_count, stats.edge_count, stats.density);
//! ```

pub mod build;
pub mod stats;

// Re-export primary types at module level for convenience.
pub use build::{
    CallEdge, CallGraph, EdgeMerge, EdgeWeighting, GraphError, GraphOptions, Participant,
};
pub use stats::GraphStats;
