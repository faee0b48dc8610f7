//! Centrality metrics for the communication graph.
//!
//! # Overview
//!
//! Each metric answers a different question about a participant:
//!
//! - **Degree** (`degree`): how many distinct people did they call, or get
//!   called by?
//! - **Betweenness** (`betweenness`): do they relay between otherwise
//!   distant participants?
//! - **Closeness** (`closeness`): how quickly does call flow reach them?
//! - **Eigenvector** (`eigenvector`): are they called by well-connected
//!   participants?
//! - **PageRank** (`pagerank`): where does weighted call flow accumulate?
//!
//! # Usage
//!
//! Every metric takes a [`CallGraph`] and returns scores keyed by
//! participant id, covering every node. [`MetricTable::compute`] runs them
//! all and assembles one row per participant.
//!
//! ```rust,ignore
//! use callnet_analytics::metrics::{MetricColumn, MetricTable};
//!
//! let table = MetricTable::compute(&graph, &pagerank_cfg, &eigen_cfg);
//! for row in table.top_by(MetricColumn::PageRank, 10) {
//!     println!("{} {:.4}", row.node, row.pagerank);
//! }
//! ```

#![allow(clippy::module_name_repetitions)]

pub mod betweenness;
pub mod closeness;
pub mod degree;
pub mod eigenvector;
pub mod pagerank;

use std::fmt;
use std::str::FromStr;

use callnet_core::ErrorCode;
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

use crate::graph::CallGraph;

pub use betweenness::betweenness_centrality;
pub use closeness::closeness_centrality;
pub use degree::{in_degree_centrality, out_degree_centrality};
pub use eigenvector::{EigenvectorConfig, EigenvectorResult, eigenvector_centrality};
pub use pagerank::{PageRankConfig, PageRankResult, pagerank};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised by iterative metrics.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MetricError {
    #[error("{metric} centrality failed to converge in {iterations} iterations")]
    NotConverged {
        metric: &'static str,
        iterations: usize,
    },

    #[error("graph has no nodes")]
    EmptyGraph,
}

impl MetricError {
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::NotConverged { .. } => ErrorCode::NonConvergence,
            Self::EmptyGraph => ErrorCode::EmptyGraph,
        }
    }
}

// ---------------------------------------------------------------------------
// Metric table
// ---------------------------------------------------------------------------

/// A sortable column of the [`MetricTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricColumn {
    InDegree,
    OutDegree,
    Betweenness,
    Closeness,
    Eigenvector,
    #[serde(rename = "pagerank")]
    PageRank,
}

impl MetricColumn {
    pub const ALL: [Self; 6] = [
        Self::InDegree,
        Self::OutDegree,
        Self::Betweenness,
        Self::Closeness,
        Self::Eigenvector,
        Self::PageRank,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InDegree => "in_degree",
            Self::OutDegree => "out_degree",
            Self::Betweenness => "betweenness",
            Self::Closeness => "closeness",
            Self::Eigenvector => "eigenvector",
            Self::PageRank => "pagerank",
        }
    }
}

impl fmt::Display for MetricColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricColumn {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| format!("unknown metric column `{s}`"))
    }
}

/// All metrics for one participant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricRow {
    pub node: String,
    pub in_degree: f64,
    pub out_degree: f64,
    pub betweenness: f64,
    pub closeness: f64,
    /// `None` when eigenvector centrality failed to converge.
    pub eigenvector: Option<f64>,
    pub pagerank: f64,
}

impl MetricRow {
    /// Value of `column`, or `None` for a missing eigenvector score.
    #[must_use]
    pub const fn value(&self, column: MetricColumn) -> Option<f64> {
        match column {
            MetricColumn::InDegree => Some(self.in_degree),
            MetricColumn::OutDegree => Some(self.out_degree),
            MetricColumn::Betweenness => Some(self.betweenness),
            MetricColumn::Closeness => Some(self.closeness),
            MetricColumn::Eigenvector => self.eigenvector,
            MetricColumn::PageRank => Some(self.pagerank),
        }
    }
}

/// Per-participant metrics in node (first-appearance) order.
#[derive(Debug, Clone, Serialize)]
pub struct MetricTable {
    pub rows: Vec<MetricRow>,
    /// Why the eigenvector column is empty, if it is.
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "display")]
    pub eigenvector_error: Option<MetricError>,
    pub pagerank_converged: bool,
}

#[allow(clippy::ref_option)]
fn display<S: serde::Serializer>(err: &Option<MetricError>, s: S) -> Result<S::Ok, S::Error> {
    match err {
        Some(e) => s.serialize_str(&e.to_string()),
        None => s.serialize_none(),
    }
}

impl MetricTable {
    /// Compute every metric over `cg`.
    ///
    /// Eigenvector failure is absorbed into `eigenvector_error`; all other
    /// columns are always present. Betweenness is normalized.
    #[must_use]
    #[instrument(skip_all, fields(nodes = cg.node_count()))]
    pub fn compute(
        cg: &CallGraph,
        pagerank_config: &PageRankConfig,
        eigen_config: &EigenvectorConfig,
    ) -> Self {
        let in_deg = in_degree_centrality(cg);
        let out_deg = out_degree_centrality(cg);
        let between = betweenness_centrality(cg, true);
        let close = closeness_centrality(cg);
        let pr = pagerank(cg, pagerank_config);

        let (eigen, eigenvector_error) = match eigenvector_centrality(cg, eigen_config) {
            Ok(result) => (Some(result.scores), None),
            Err(MetricError::EmptyGraph) => (None, None),
            Err(err) => {
                warn!(%err, "eigenvector column unavailable");
                (None, Some(err))
            }
        };

        let get = |map: &std::collections::HashMap<String, f64>, id: &str| {
            map.get(id).copied().unwrap_or(0.0)
        };

        let rows = cg
            .node_ids()
            .into_iter()
            .map(|id| MetricRow {
                node: id.to_string(),
                in_degree: get(&in_deg, id),
                out_degree: get(&out_deg, id),
                betweenness: get(&between, id),
                closeness: get(&close, id),
                eigenvector: eigen.as_ref().and_then(|m| m.get(id).copied()),
                pagerank: get(&pr.scores, id),
            })
            .collect();

        Self {
            rows,
            eigenvector_error,
            pagerank_converged: pr.converged,
        }
    }

    /// Top `n` rows by `column`, descending, ties by node id.
    ///
    /// Rows without a value (eigenvector after a convergence failure) sort
    /// last.
    #[must_use]
    pub fn top_by(&self, column: MetricColumn, n: usize) -> Vec<&MetricRow> {
        let mut rows: Vec<&MetricRow> = self.rows.iter().collect();
        rows.sort_by(|a, b| {
            let va = a.value(column).unwrap_or(f64::NEG_INFINITY);
            let vb = b.value(column).unwrap_or(f64::NEG_INFINITY);
            vb.total_cmp(&va).then_with(|| a.node.cmp(&b.node))
        });
        rows.truncate(n);
        rows
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}
