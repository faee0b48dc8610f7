use std::io::Write;

use anyhow::Result;
use callnet_analytics::AnalysisConfig;
use callnet_analytics::metrics::{MetricColumn, MetricRow, MetricTable};
use clap::Args;
use serde::Serialize;
use tracing::warn;

use crate::cmd::{InputArgs, duration_graph, load_table};
use crate::output::{OutputMode, fmt_score, pretty_rule, pretty_section, render_mode};

/// Arguments for `callnet centrality`.
#[derive(Args, Debug)]
pub struct CentralityArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Number of rows to show.
    #[arg(long, default_value_t = 10)]
    pub top: usize,

    /// Column to rank by: in_degree, out_degree, betweenness, closeness,
    /// eigenvector or pagerank.
    #[arg(long, default_value = "pagerank")]
    pub sort: MetricColumn,
}

#[derive(Debug, Serialize)]
struct CentralityReport<'a> {
    sort: MetricColumn,
    #[serde(skip_serializing_if = "Option::is_none")]
    fallback_from: Option<MetricColumn>,
    #[serde(skip_serializing_if = "Option::is_none")]
    eigenvector_error: Option<String>,
    pagerank_converged: bool,
    participants: usize,
    rows: Vec<&'a MetricRow>,
}

/// Execute `callnet centrality`.
pub fn run_centrality(
    args: &CentralityArgs,
    config: &AnalysisConfig,
    output: OutputMode,
) -> Result<()> {
    let table = load_table(&args.input.input)?;
    let cg = duration_graph(&table, config.graph.merge)?;
    let metrics = MetricTable::compute(&cg, &config.pagerank, &config.eigenvector);

    let (sort, fallback_from) = match (&metrics.eigenvector_error, args.sort) {
        (Some(err), MetricColumn::Eigenvector) => {
            warn!(%err, "ranking by pagerank instead of eigenvector");
            (MetricColumn::PageRank, Some(MetricColumn::Eigenvector))
        }
        (_, col) => (col, None),
    };

    let report = CentralityReport {
        sort,
        fallback_from,
        eigenvector_error: metrics.eigenvector_error.as_ref().map(ToString::to_string),
        pagerank_converged: metrics.pagerank_converged,
        participants: metrics.len(),
        rows: metrics.top_by(sort, args.top),
    };

    render_mode(output, &report, render_text, render_pretty)
}

fn eigen_cell(row: &MetricRow) -> String {
    row.eigenvector.map_or_else(|| "-".to_string(), fmt_score)
}

fn render_text(r: &CentralityReport<'_>, w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(
        w,
        "node  in_degree  out_degree  betweenness  closeness  eigenvector  pagerank"
    )?;
    for row in &r.rows {
        writeln!(
            w,
            "{}  {}  {}  {}  {}  {}  {}",
            row.node,
            fmt_score(row.in_degree),
            fmt_score(row.out_degree),
            fmt_score(row.betweenness),
            fmt_score(row.closeness),
            eigen_cell(row),
            fmt_score(row.pagerank),
        )?;
    }
    Ok(())
}

fn render_pretty(r: &CentralityReport<'_>, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(
        w,
        &format!(
            "Top {} of {} participants by {}",
            r.rows.len(),
            r.participants,
            r.sort
        ),
    )?;
    writeln!(
        w,
        "{:<20} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8}",
        "NODE", "IN", "OUT", "BETWEEN", "CLOSE", "EIGEN", "PAGERANK"
    )?;
    pretty_rule(w)?;
    for row in &r.rows {
        writeln!(
            w,
            "{:<20} {:>8} {:>8} {:>8} {:>8} {:>8} {:>8}",
            row.node,
            fmt_score(row.in_degree),
            fmt_score(row.out_degree),
            fmt_score(row.betweenness),
            fmt_score(row.closeness),
            eigen_cell(row),
            fmt_score(row.pagerank),
        )?;
    }

    if let Some(from) = r.fallback_from {
        writeln!(w)?;
        writeln!(w, "note: {from} unavailable, ranked by {} instead", r.sort)?;
    }
    if let Some(err) = &r.eigenvector_error {
        writeln!(w, "note: {err}")?;
    }
    if !r.pagerank_converged {
        writeln!(w, "note: pagerank hit its iteration cap; scores are approximate")?;
    }
    Ok(())
}
