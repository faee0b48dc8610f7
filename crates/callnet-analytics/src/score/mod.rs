//! Composite risk scoring.
//!
//! [`composite`] holds the normalization and weighting primitives;
//! [`risk`] turns a call graph into a labelled, sorted Risk Table.

pub mod composite;
pub mod risk;

pub use composite::{RiskConfig, RiskWeights, normalize_metric, quantile};
pub use risk::{RiskLabel, RiskRow, RiskTable, analyze_risk, build_risk_table};
