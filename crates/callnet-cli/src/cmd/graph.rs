use std::io::Write;

use anyhow::Result;
use callnet_analytics::AnalysisConfig;
use callnet_analytics::graph::{CallGraph, EdgeMerge};
use clap::Args;
use petgraph::dot::Dot;
use petgraph::visit::EdgeRef;
use serde::Serialize;

use crate::cmd::{InputArgs, duration_graph, load_table};
use crate::output::{OutputMode, fmt_score, pretty_kv, pretty_rule, pretty_section, render_mode};

/// Arguments for `callnet graph`.
#[derive(Args, Debug)]
pub struct GraphArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Emit Graphviz DOT instead of an edge list.
    #[arg(long)]
    pub dot: bool,
}

#[derive(Debug, Serialize)]
struct EdgeRow<'a> {
    from: &'a str,
    to: &'a str,
    weight: f64,
    duration: f64,
    calls: u32,
}

#[derive(Debug, Serialize)]
struct EdgeList<'a> {
    nodes: usize,
    merge: EdgeMerge,
    edges: Vec<EdgeRow<'a>>,
}

#[derive(Debug, Serialize)]
struct DotOutput {
    dot: String,
}

/// Execute `callnet graph`.
pub fn run_graph(args: &GraphArgs, config: &AnalysisConfig, output: OutputMode) -> Result<()> {
    let table = load_table(&args.input.input)?;
    let cg = duration_graph(&table, config.graph.merge)?;

    if args.dot {
        let out = DotOutput { dot: to_dot(&cg) };
        return render_mode(output, &out, render_dot, render_dot);
    }

    let list = EdgeList {
        nodes: cg.node_count(),
        merge: cg.merge_policy(),
        edges: edge_rows(&cg),
    };
    render_mode(output, &list, render_text, render_pretty)
}

/// Edges sorted by `(from, to)` so repeated runs print identically.
fn edge_rows(cg: &CallGraph) -> Vec<EdgeRow<'_>> {
    let mut rows: Vec<EdgeRow<'_>> = cg
        .graph
        .edge_references()
        .map(|e| {
            let w = e.weight();
            EdgeRow {
                from: &cg.graph[e.source()].id,
                to: &cg.graph[e.target()].id,
                weight: w.weight,
                duration: w.duration,
                calls: w.calls,
            }
        })
        .collect();
    rows.sort_by(|a, b| a.from.cmp(b.from).then_with(|| a.to.cmp(b.to)));
    rows
}

fn to_dot(cg: &CallGraph) -> String {
    let labelled = cg.graph.map(
        |_, p| p.id.clone(),
        |_, e| format!("{}s x{}", e.duration, e.calls),
    );
    format!("{}", Dot::new(&labelled))
}

fn render_dot(d: &DotOutput, w: &mut dyn Write) -> std::io::Result<()> {
    write!(w, "{}", d.dot)
}

fn render_text(l: &EdgeList<'_>, w: &mut dyn Write) -> std::io::Result<()> {
    for e in &l.edges {
        writeln!(
            w,
            "{} -> {}  {}  {}  {}",
            e.from,
            e.to,
            fmt_score(e.weight),
            e.duration,
            e.calls
        )?;
    }
    Ok(())
}

fn render_pretty(l: &EdgeList<'_>, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(w, "Communication Graph")?;
    pretty_kv(w, "Participants", l.nodes.to_string())?;
    pretty_kv(w, "Edges", l.edges.len().to_string())?;
    pretty_kv(w, "Merge", format!("{:?}", l.merge))?;
    writeln!(w)?;

    writeln!(
        w,
        "{:<20} {:<20} {:>10} {:>6}",
        "FROM", "TO", "DURATION", "CALLS"
    )?;
    pretty_rule(w)?;
    for e in &l.edges {
        writeln!(
            w,
            "{:<20} {:<20} {:>10} {:>6}",
            e.from, e.to, e.duration, e.calls
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        args: GraphArgs,
    }

    #[test]
    fn graph_args_defaults_to_edge_list() {
        let w = Wrapper::parse_from(["test", "calls.csv"]);
        assert_eq!(w.args.input.input.to_str(), Some("calls.csv"));
        assert!(!w.args.dot);
    }

    #[test]
    fn graph_args_dot_flag() {
        let w = Wrapper::parse_from(["test", "calls.csv", "--dot"]);
        assert!(w.args.dot);
    }

    #[test]
    fn edge_rows_are_sorted() {
        let cg = CallGraph::from_edges(&[("B", "A"), ("A", "C"), ("A", "B")]);
        let rows = edge_rows(&cg);
        let pairs: Vec<(&str, &str)> = rows.iter().map(|r| (r.from, r.to)).collect();
        assert_eq!(pairs, vec![("A", "B"), ("A", "C"), ("B", "A")]);
    }

    #[test]
    fn dot_names_every_participant() {
        let cg = CallGraph::from_edges(&[("alice", "bob")]);
        let dot = to_dot(&cg);
        assert!(dot.starts_with("digraph"));
        assert!(dot.contains("\"alice\""));
        assert!(dot.contains("\"bob\""));
        assert!(dot.contains("->"));
    }
}
