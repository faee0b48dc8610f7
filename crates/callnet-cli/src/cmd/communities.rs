use std::io::Write;

use anyhow::Result;
use callnet_analytics::AnalysisConfig;
use callnet_analytics::community::{
    CommunityConfig, Partition, Stratification, StratumKey, StratumSummary, detect_communities,
    extract_community_nodes, find_stratum, summarize,
};
use callnet_core::ErrorCode;
use clap::Args;
use serde::Serialize;
use tracing::warn;

use crate::cmd::{InputArgs, load_table};
use crate::output::{OutputMode, pretty_kv, pretty_rule, pretty_section, render_mode};

/// Arguments for `callnet communities`.
#[derive(Args, Debug)]
pub struct CommunitiesArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Stratify by `location` or `time-location`.
    #[arg(long, default_value = "location")]
    pub by: Stratification,

    /// Seed for the Louvain visiting order (overrides the config file).
    #[arg(long, conflicts_with = "unseeded")]
    pub seed: Option<u64>,

    /// Draw the visiting order from OS entropy; results may differ per run.
    #[arg(long)]
    pub unseeded: bool,

    /// Show one stratum, e.g. `Mumbai` or `Late Night:Mumbai`.
    #[arg(long, value_name = "KEY")]
    pub stratum: Option<String>,

    /// Community ids to extract from `--stratum` (comma separated).
    #[arg(long, value_delimiter = ',', requires = "stratum", value_name = "IDS")]
    pub select: Vec<u32>,
}

impl CommunitiesArgs {
    fn community_config(&self, base: &CommunityConfig) -> CommunityConfig {
        let mut config = *base;
        if self.unseeded {
            config.seed = None;
        } else if let Some(seed) = self.seed {
            config.seed = Some(seed);
        }
        config
    }
}

#[derive(Debug, Serialize)]
struct StrataReport {
    by: Stratification,
    strata: Vec<StratumSummary>,
}

#[derive(Debug, Serialize)]
struct StratumReport<'a> {
    stratum: String,
    selected: &'a [u32],
    community_count: usize,
    modularity: f64,
    members: Vec<Member<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warning: Option<Warning>,
}

#[derive(Debug, Serialize)]
struct Member<'a> {
    node: &'a str,
    community: u32,
}

#[derive(Debug, Serialize)]
struct Warning {
    code: &'static str,
    message: String,
}

impl Warning {
    fn empty_selection(message: String) -> Self {
        warn!(%message, "empty selection");
        Self {
            code: ErrorCode::EmptySelection.code(),
            message,
        }
    }
}

/// Execute `callnet communities`.
pub fn run_communities(
    args: &CommunitiesArgs,
    config: &AnalysisConfig,
    output: OutputMode,
) -> Result<()> {
    let key = match &args.stratum {
        Some(raw) => Some(StratumKey::parse(args.by, raw).ok_or_else(|| {
            anyhow::anyhow!("invalid stratum key `{raw}` (expected `<time slot>:<location>`)")
        })?),
        None => None,
    };

    let table = load_table(&args.input.input)?;
    let community = args.community_config(&config.community);
    let partitions = detect_communities(&table, args.by, config.graph.merge, &community)?;

    let Some(key) = key else {
        let report = StrataReport {
            by: args.by,
            strata: summarize(&partitions),
        };
        return render_mode(output, &report, render_strata_text, render_strata_pretty);
    };

    let empty = Partition::default();
    let (partition, modularity, mut warning) = match find_stratum(&partitions, &key) {
        Some(p) => (&p.partition, p.modularity, None),
        None => (
            &empty,
            0.0,
            Some(Warning::empty_selection(format!(
                "stratum `{key}` has no partition (unknown or a single participant)"
            ))),
        ),
    };

    let members: Vec<Member<'_>> = if args.select.is_empty() {
        partition
            .iter()
            .map(|a| Member {
                node: &a.node,
                community: a.community,
            })
            .collect()
    } else {
        extract_community_nodes(partition, &args.select)
            .into_iter()
            .filter_map(|node| {
                partition
                    .community_of(node)
                    .map(|community| Member { node, community })
            })
            .collect()
    };

    if warning.is_none() && !args.select.is_empty() && members.is_empty() {
        warning = Some(Warning::empty_selection(format!(
            "no community {} in stratum `{key}` ({} communities)",
            join_ids(&args.select),
            partition.community_count()
        )));
    }

    let report = StratumReport {
        stratum: key.to_string(),
        selected: &args.select,
        community_count: partition.community_count(),
        modularity,
        members,
        warning,
    };
    render_mode(output, &report, render_stratum_text, render_stratum_pretty)
}

fn join_ids(ids: &[u32]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

fn render_strata_text(r: &StrataReport, w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(w, "stratum  communities  nodes  modularity")?;
    for s in &r.strata {
        writeln!(
            w,
            "{}  {}  {}  {:.4}",
            s.key, s.community_count, s.node_count, s.modularity
        )?;
    }
    Ok(())
}

fn render_strata_pretty(r: &StrataReport, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(w, &format!("Communities per stratum ({} strata)", r.strata.len()))?;
    writeln!(
        w,
        "{:<32} {:>11} {:>6} {:>10}",
        "STRATUM", "COMMUNITIES", "NODES", "MODULARITY"
    )?;
    pretty_rule(w)?;
    for s in &r.strata {
        writeln!(
            w,
            "{:<32} {:>11} {:>6} {:>10.4}",
            s.key.to_string(),
            s.community_count,
            s.node_count,
            s.modularity
        )?;
    }
    if r.strata.is_empty() {
        writeln!(w, "(no stratum has more than one participant)")?;
    }
    Ok(())
}

fn render_stratum_text(r: &StratumReport<'_>, w: &mut dyn Write) -> std::io::Result<()> {
    if let Some(warning) = &r.warning {
        writeln!(w, "warning {} {}", warning.code, warning.message)?;
    }
    for m in &r.members {
        writeln!(w, "{}  {}", m.node, m.community)?;
    }
    Ok(())
}

fn render_stratum_pretty(r: &StratumReport<'_>, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(w, &format!("Stratum {}", r.stratum))?;
    pretty_kv(w, "Communities", r.community_count.to_string())?;
    pretty_kv(w, "Modularity", format!("{:.4}", r.modularity))?;
    if !r.selected.is_empty() {
        pretty_kv(w, "Selected", join_ids(r.selected))?;
    }
    writeln!(w)?;
    for m in &r.members {
        writeln!(w, "{:<24} community {}", m.node, m.community)?;
    }
    if let Some(warning) = &r.warning {
        writeln!(w, "warning[{}]: {}", warning.code, warning.message)?;
    }
    Ok(())
}
