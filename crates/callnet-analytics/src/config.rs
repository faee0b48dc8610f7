//! Analysis parameters, one section per component.
//!
//! Every field has a default, so an empty TOML document (or no file at all)
//! gives the standard analysis:
//!
//! ```toml
//! [graph]
//! merge = "last_write"      # or "accumulate"
//!
//! [pagerank]
//! damping = 0.85
//! tolerance = 1e-6
//! max_iter = 100
//!
//! [eigenvector]
//! max_iter = 1000
//! tolerance = 1e-6
//!
//! [risk]
//! high_risk_quantile = 0.95
//! weights = { pagerank = 0.40, betweenness = 0.35, out_degree = 0.25 }
//!
//! [community]
//! seed = 42
//! resolution = 1.0
//!
//! [sentiment]
//! top_n = 20
//! extra_lexicon = "lexicon.csv"
//! ```

#![allow(clippy::module_name_repetitions)]

use callnet_core::ErrorCode;
use serde::{Deserialize, Serialize};

use crate::community::CommunityConfig;
use crate::graph::EdgeMerge;
use crate::metrics::{EigenvectorConfig, PageRankConfig};
use crate::score::RiskConfig;
use crate::sentiment::SentimentConfig;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphConfig {
    #[serde(default)]
    pub merge: EdgeMerge,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub graph: GraphConfig,
    #[serde(default)]
    pub pagerank: PageRankConfig,
    #[serde(default)]
    pub eigenvector: EigenvectorConfig,
    #[serde(default)]
    pub risk: RiskConfig,
    #[serde(default)]
    pub community: CommunityConfig,
    #[serde(default)]
    pub sentiment: SentimentConfig,
}

/// A parameter outside its valid range.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {field}: {reason}")]
pub struct ConfigError {
    pub field: &'static str,
    pub reason: &'static str,
}

impl ConfigError {
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        ErrorCode::ConfigParseError
    }
}

const fn check(ok: bool, field: &'static str, reason: &'static str) -> Result<(), ConfigError> {
    if ok {
        Ok(())
    } else {
        Err(ConfigError { field, reason })
    }
}

impl AnalysisConfig {
    /// Reject parameters the algorithms cannot work with.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let pr = &self.pagerank;
        check(
            pr.damping > 0.0 && pr.damping < 1.0,
            "pagerank.damping",
            "must be in (0, 1)",
        )?;
        check(pr.tolerance > 0.0, "pagerank.tolerance", "must be positive")?;
        check(pr.max_iter > 0, "pagerank.max_iter", "must be at least 1")?;

        let ev = &self.eigenvector;
        check(ev.tolerance > 0.0, "eigenvector.tolerance", "must be positive")?;
        check(ev.max_iter > 0, "eigenvector.max_iter", "must be at least 1")?;

        let w = &self.risk.weights;
        check(
            [w.pagerank, w.betweenness, w.out_degree]
                .iter()
                .all(|v| v.is_finite() && *v >= 0.0),
            "risk.weights",
            "must be finite and non-negative",
        )?;
        check(
            (0.0..=1.0).contains(&self.risk.high_risk_quantile),
            "risk.high_risk_quantile",
            "must be in [0, 1]",
        )?;

        check(
            self.community.resolution.is_finite() && self.community.resolution > 0.0,
            "community.resolution",
            "must be positive",
        )?;
        Ok(())
    }
}
