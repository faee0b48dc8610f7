use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;

use anyhow::Result;
use callnet_analytics::AnalysisConfig;
use callnet_analytics::graph::GraphStats;
use callnet_core::TimeSlot;
use clap::Args;
use serde::Serialize;

use crate::cmd::{InputArgs, duration_graph, load_table};
use crate::output::{OutputMode, pretty_kv, pretty_section, render_mode};

/// Arguments for `callnet summary`.
#[derive(Args, Debug)]
pub struct SummaryArgs {
    #[command(flatten)]
    pub input: InputArgs,
}

#[derive(Debug, Serialize)]
struct Summary {
    rows: usize,
    fingerprint: String,
    graph_hash: String,
    has_call_text: bool,
    locations: usize,
    time_slots: BTreeMap<TimeSlot, usize>,
    graph: GraphStats,
}

/// Execute `callnet summary`.
pub fn run_summary(args: &SummaryArgs, config: &AnalysisConfig, output: OutputMode) -> Result<()> {
    let table = load_table(&args.input.input)?;
    let cg = duration_graph(&table, config.graph.merge)?;

    let mut time_slots = BTreeMap::new();
    let mut locations = BTreeSet::new();
    for record in &table {
        *time_slots.entry(record.time_slot()).or_insert(0) += 1;
        locations.insert(record.location.as_str());
    }

    let summary = Summary {
        rows: table.len(),
        fingerprint: table.fingerprint.clone(),
        graph_hash: cg.content_hash.clone(),
        has_call_text: table.has_call_text,
        locations: locations.len(),
        time_slots,
        graph: GraphStats::from_graph(&cg),
    };

    render_mode(output, &summary, render_text, render_pretty)
}

fn render_text(s: &Summary, w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(w, "rows {}", s.rows)?;
    writeln!(w, "participants {}", s.graph.node_count)?;
    writeln!(w, "edges {}", s.graph.edge_count)?;
    writeln!(w, "calls {}", s.graph.call_count)?;
    writeln!(w, "locations {}", s.locations)?;
    writeln!(w, "fingerprint {}", s.fingerprint)?;
    for (slot, count) in &s.time_slots {
        writeln!(w, "slot {} {count}", slot.as_str().replace(' ', "_"))?;
    }
    Ok(())
}

fn render_pretty(s: &Summary, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(w, "Call Table")?;
    pretty_kv(w, "Rows", s.rows.to_string())?;
    pretty_kv(w, "Locations", s.locations.to_string())?;
    pretty_kv(w, "Call text", if s.has_call_text { "yes" } else { "no" })?;
    pretty_kv(w, "Fingerprint", &s.fingerprint)?;
    writeln!(w)?;

    pretty_section(w, "Communication Graph")?;
    let g = &s.graph;
    pretty_kv(w, "Participants", g.node_count.to_string())?;
    pretty_kv(w, "Edges", g.edge_count.to_string())?;
    pretty_kv(w, "Calls", g.call_count.to_string())?;
    pretty_kv(w, "Density", format!("{:.4}", g.density))?;
    pretty_kv(w, "Components", g.weakly_connected_component_count.to_string())?;
    pretty_kv(w, "Self-loops", g.self_loop_count.to_string())?;
    pretty_kv(w, "Isolated", g.isolated_node_count.to_string())?;
    pretty_kv(w, "Max in", g.max_in_degree.to_string())?;
    pretty_kv(w, "Max out", g.max_out_degree.to_string())?;
    pretty_kv(w, "Graph hash", &s.graph_hash)?;
    writeln!(w)?;

    pretty_section(w, "Time of Day")?;
    for (slot, count) in &s.time_slots {
        pretty_kv(w, slot.as_str(), count.to_string())?;
    }
    Ok(())
}
