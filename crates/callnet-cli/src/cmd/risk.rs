use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use callnet_analytics::AnalysisConfig;
use callnet_analytics::score::{RiskLabel, RiskRow, analyze_risk};
use clap::Args;
use serde::Serialize;
use tracing::info;

use crate::cmd::{InputArgs, load_table};
use crate::output::{OutputMode, fmt_score, pretty_kv, pretty_rule, pretty_section, render_mode};

/// Arguments for `callnet risk`.
#[derive(Args, Debug)]
pub struct RiskArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Number of rows to show (all rows when omitted).
    #[arg(long)]
    pub top: Option<usize>,

    /// Only show participants labelled High-Risk.
    #[arg(long)]
    pub high_risk_only: bool,

    /// Write the shown rows to a CSV file.
    #[arg(long, value_name = "FILE")]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct RiskReport<'a> {
    threshold: Option<f64>,
    participants: usize,
    high_risk: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    exported_to: Option<&'a Path>,
    rows: Vec<&'a RiskRow>,
}

/// Column layout of the exported Risk Table.
#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    #[serde(rename = "Node")]
    node: &'a str,
    #[serde(rename = "Out_Degree")]
    out_degree: f64,
    #[serde(rename = "Betweenness")]
    betweenness: f64,
    #[serde(rename = "PageRank")]
    pagerank: f64,
    #[serde(rename = "Risk_Score")]
    risk_score: f64,
    #[serde(rename = "Risk_Label")]
    risk_label: RiskLabel,
}

impl<'a> From<&'a RiskRow> for ExportRow<'a> {
    fn from(row: &'a RiskRow) -> Self {
        Self {
            node: &row.node,
            out_degree: row.out_degree,
            betweenness: row.betweenness,
            pagerank: row.pagerank,
            risk_score: row.risk_score,
            risk_label: row.risk_label,
        }
    }
}

/// Execute `callnet risk`.
pub fn run_risk(args: &RiskArgs, config: &AnalysisConfig, output: OutputMode) -> Result<()> {
    let table = load_table(&args.input.input)?;
    let risk = analyze_risk(&table, config.graph.merge, &config.pagerank, &config.risk)?;

    let mut rows: Vec<&RiskRow> = if args.high_risk_only {
        risk.high_risk().collect()
    } else {
        risk.rows.iter().collect()
    };
    if let Some(n) = args.top {
        rows.truncate(n);
    }

    if let Some(path) = &args.export {
        export_csv(path, &rows)?;
        info!(path = %path.display(), rows = rows.len(), "risk table exported");
    }

    let report = RiskReport {
        threshold: risk.threshold,
        participants: risk.len(),
        high_risk: risk.high_risk().count(),
        exported_to: args.export.as_deref(),
        rows,
    };
    render_mode(output, &report, render_text, render_pretty)
}

fn export_csv(path: &Path, rows: &[&RiskRow]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    for row in rows {
        writer
            .serialize(ExportRow::from(*row))
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

fn render_text(r: &RiskReport<'_>, w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(w, "node  out_degree  betweenness  pagerank  risk_score  risk_label")?;
    for row in &r.rows {
        writeln!(
            w,
            "{}  {}  {}  {}  {}  {}",
            row.node,
            fmt_score(row.out_degree),
            fmt_score(row.betweenness),
            fmt_score(row.pagerank),
            fmt_score(row.risk_score),
            row.risk_label
        )?;
    }
    Ok(())
}

fn render_pretty(r: &RiskReport<'_>, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(w, "Risk Analysis")?;
    pretty_kv(w, "Participants", r.participants.to_string())?;
    pretty_kv(w, "High-Risk", r.high_risk.to_string())?;
    pretty_kv(
        w,
        "Threshold",
        r.threshold.map_or_else(|| "-".to_string(), fmt_score),
    )?;
    if let Some(path) = r.exported_to {
        pretty_kv(w, "Exported to", path.display().to_string())?;
    }
    writeln!(w)?;

    writeln!(
        w,
        "{:<20} {:>8} {:>8} {:>8} {:>8}  {}",
        "NODE", "OUT", "BETWEEN", "PAGERANK", "SCORE", "LABEL"
    )?;
    pretty_rule(w)?;
    for row in &r.rows {
        writeln!(
            w,
            "{:<20} {:>8} {:>8} {:>8} {:>8}  {}",
            row.node,
            fmt_score(row.out_degree),
            fmt_score(row.betweenness),
            fmt_score(row.pagerank),
            fmt_score(row.risk_score),
            row.risk_label
        )?;
    }
    Ok(())
}
