//! Risk Table construction.
//!
//! # Pipeline
//!
//! 1. One row per participant with raw out-degree, betweenness and PageRank.
//! 2. Each of the three columns is min-max normalized over this table.
//! 3. `risk_score` is the weighted sum from [`super::RiskWeights`], rounded
//!    to 12 decimal places so ties in exact arithmetic stay tied.
//! 4. The High-Risk threshold is the configured quantile (0.95 by default)
//!    of the `risk_score` column.
//! 5. A row is High-Risk iff its score is at or above that threshold.
//!
//! The threshold is relative: every non-empty table has at least one
//! High-Risk row.

use std::collections::HashMap;
use std::fmt;

use callnet_core::CallTable;
use serde::Serialize;
use tracing::{debug, instrument};

use super::composite::{RiskConfig, RiskInputs, normalize_metric, quantile, risk_score};
use crate::graph::{CallGraph, EdgeMerge, GraphError, GraphOptions};
use crate::metrics::{PageRankConfig, betweenness_centrality, out_degree_centrality, pagerank};

/// Scores are kept on a `1e-12` grid.
const SCORE_SCALE: f64 = 1e12;

fn round_score(score: f64) -> f64 {
    (score * SCORE_SCALE).round() / SCORE_SCALE
}

/// Binary risk classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RiskLabel {
    #[serde(rename = "High-Risk")]
    HighRisk,
    Normal,
}

impl RiskLabel {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::HighRisk => "High-Risk",
            Self::Normal => "Normal",
        }
    }
}

impl fmt::Display for RiskLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One participant's normalized metrics and composite score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskRow {
    pub node: String,
    pub out_degree: f64,
    pub betweenness: f64,
    pub pagerank: f64,
    pub risk_score: f64,
    pub risk_label: RiskLabel,
}

/// Risk rows sorted by descending score, plus the threshold that labelled
/// them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskTable {
    pub rows: Vec<RiskRow>,
    /// `None` for an empty table.
    pub threshold: Option<f64>,
}

impl RiskTable {
    /// High-Risk rows, highest score first.
    pub fn high_risk(&self) -> impl Iterator<Item = &RiskRow> {
        self.rows
            .iter()
            .filter(|r| r.risk_label == RiskLabel::HighRisk)
    }

    /// The `n` highest-scoring rows.
    #[must_use]
    pub fn top(&self, n: usize) -> &[RiskRow] {
        &self.rows[..n.min(self.rows.len())]
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Look up a participant's row.
    #[must_use]
    pub fn get(&self, node: &str) -> Option<&RiskRow> {
        self.rows.iter().find(|r| r.node == node)
    }
}

/// Assemble the Risk Table from precomputed metric maps.
///
/// Participants missing from a map count as 0 for that metric.
#[must_use]
#[instrument(skip_all, fields(nodes = cg.node_count()))]
pub fn build_risk_table(
    cg: &CallGraph,
    out_degree: &HashMap<String, f64>,
    betweenness: &HashMap<String, f64>,
    pagerank: &HashMap<String, f64>,
    config: &RiskConfig,
) -> RiskTable {
    let nodes = cg.node_ids();
    let column = |map: &HashMap<String, f64>| -> Vec<f64> {
        nodes
            .iter()
            .map(|id| map.get(*id).copied().unwrap_or(0.0))
            .collect()
    };

    let od = normalize_metric(&column(out_degree));
    let bc = normalize_metric(&column(betweenness));
    let pr = normalize_metric(&column(pagerank));

    let scores: Vec<f64> = (0..nodes.len())
        .map(|i| {
            round_score(risk_score(
                &RiskInputs {
                    pagerank: pr[i],
                    betweenness: bc[i],
                    out_degree: od[i],
                },
                &config.weights,
            ))
        })
        .collect();

    let threshold = quantile(&scores, config.high_risk_quantile);

    let mut rows: Vec<RiskRow> = nodes
        .iter()
        .enumerate()
        .map(|(i, id)| RiskRow {
            node: (*id).to_string(),
            out_degree: od[i],
            betweenness: bc[i],
            pagerank: pr[i],
            risk_score: scores[i],
            risk_label: match threshold {
                Some(t) if scores[i] >= t => RiskLabel::HighRisk,
                _ => RiskLabel::Normal,
            },
        })
        .collect();

    rows.sort_by(|a, b| {
        b.risk_score
            .total_cmp(&a.risk_score)
            .then_with(|| a.node.cmp(&b.node))
    });

    debug!(
        rows = rows.len(),
        threshold = threshold.unwrap_or(0.0),
        "risk table built"
    );

    RiskTable { rows, threshold }
}

/// Build the unit-weight call graph for `table` and score every participant.
///
/// Uses out-degree centrality, normalized betweenness and PageRank, computed
/// on the canonical node order so the result does not depend on row order.
///
/// # Errors
///
/// Returns [`GraphError`] if a record has an empty endpoint.
#[instrument(skip_all, fields(rows = table.len()))]
pub fn analyze_risk(
    table: &CallTable,
    merge: EdgeMerge,
    pagerank_config: &PageRankConfig,
    config: &RiskConfig,
) -> Result<RiskTable, GraphError> {
    let cg = CallGraph::from_table(table, &GraphOptions::unit(merge))?.canonical();
    let out_degree = out_degree_centrality(&cg);
    let betweenness = betweenness_centrality(&cg, true);
    let pr = pagerank(&cg, pagerank_config);
    Ok(build_risk_table(
        &cg,
        &out_degree,
        &betweenness,
        &pr.scores,
        config,
    ))
}
