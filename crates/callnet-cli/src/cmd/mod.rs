pub mod centrality;
pub mod communities;
pub mod completions;
pub mod graph;
pub mod risk;
pub mod sentiment;
pub mod summary;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use callnet_analytics::graph::{CallGraph, EdgeMerge, EdgeWeighting, GraphOptions};
use callnet_core::{CallTable, load_calls};
use clap::Args;
use tracing::info;

/// The call-record CSV every analysis subcommand reads.
#[derive(Args, Debug, Clone)]
pub struct InputArgs {
    /// CSV with Caller_ID, Receiver_ID, Call_Type, Duration, Location,
    /// Timestamp and optionally Call_Text.
    #[arg(value_name = "CSV")]
    pub input: PathBuf,
}

/// Load the call table named on the command line.
pub fn load_table(path: &Path) -> Result<CallTable> {
    let table = load_calls(path).with_context(|| format!("loading {}", path.display()))?;
    info!(rows = table.len(), fingerprint = %table.fingerprint, "call table loaded");
    Ok(table)
}

/// Duration-weighted communication graph under the configured merge policy.
pub fn duration_graph(table: &CallTable, merge: EdgeMerge) -> Result<CallGraph> {
    let options = GraphOptions {
        weighting: EdgeWeighting::Duration,
        merge,
    };
    CallGraph::from_table(table, &options).context("building call graph")
}
