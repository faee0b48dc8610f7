#![forbid(unsafe_code)]
//! callnet-analytics library.
//!
//! Graph analytics over a [`callnet_core::CallTable`]: the communication
//! graph, centrality metrics, the composite risk score, stratified Louvain
//! communities and the call-text danger ranking. Every entry point is a
//! pure function of `(table, parameters)`.
//!
//! # Conventions
//!
//! - **Errors**: `thiserror` enums exposing `error_code()`.
//! - **Logging**: Use `tracing` macros (`info!`, `warn!`, `error!`, `debug!`, `trace!`).

pub mod community;
pub mod config;
pub mod graph;
pub mod metrics;
pub mod score;
pub mod sentiment;

pub use config::{AnalysisConfig, ConfigError};
