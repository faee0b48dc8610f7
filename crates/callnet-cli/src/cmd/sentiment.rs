use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use callnet_analytics::AnalysisConfig;
use callnet_analytics::sentiment::{ClassCounts, DangerRecord, LexiconScorer, analyze_sentiment};
use clap::Args;
use serde::Serialize;

use crate::cmd::{InputArgs, load_table};
use crate::output::{OutputMode, fmt_score, pretty_kv, pretty_rule, pretty_section, render_mode};

/// Arguments for `callnet sentiment`.
#[derive(Args, Debug)]
pub struct SentimentArgs {
    #[command(flatten)]
    pub input: InputArgs,

    /// Length of the danger list (overrides the config file).
    #[arg(long)]
    pub top: Option<usize>,

    /// Extra `word,polarity` CSV merged over the built-in lexicon.
    #[arg(long, value_name = "FILE")]
    pub lexicon: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct SentimentOutput {
    calls: usize,
    counts: ClassCounts,
    danger: Vec<DangerRecord>,
}

/// Execute `callnet sentiment`.
pub fn run_sentiment(
    args: &SentimentArgs,
    config: &AnalysisConfig,
    output: OutputMode,
) -> Result<()> {
    let table = load_table(&args.input.input)?;

    let mut scorer = LexiconScorer::new();
    if let Some(path) = args.lexicon.as_ref().or(config.sentiment.extra_lexicon.as_ref()) {
        scorer = scorer
            .with_extra_lexicon(path)
            .with_context(|| format!("loading lexicon {}", path.display()))?;
    }

    let top_n = args.top.unwrap_or(config.sentiment.top_n);
    let report = analyze_sentiment(&table, &scorer, top_n)?;

    let out = SentimentOutput {
        calls: report.calls.len(),
        counts: report.counts(),
        danger: report.danger,
    };
    render_mode(output, &out, render_text, render_pretty)
}

fn render_text(s: &SentimentOutput, w: &mut dyn Write) -> std::io::Result<()> {
    writeln!(
        w,
        "positive {} neutral {} negative {}",
        s.counts.positive, s.counts.neutral, s.counts.negative
    )?;
    for d in &s.danger {
        writeln!(w, "{}  {}  {}", fmt_score(d.polarity), d.caller_id, d.call_text)?;
    }
    Ok(())
}

fn render_pretty(s: &SentimentOutput, w: &mut dyn Write) -> std::io::Result<()> {
    pretty_section(w, "Call Sentiment")?;
    pretty_kv(w, "Calls", s.calls.to_string())?;
    pretty_kv(w, "Positive", s.counts.positive.to_string())?;
    pretty_kv(w, "Neutral", s.counts.neutral.to_string())?;
    pretty_kv(w, "Negative", s.counts.negative.to_string())?;
    writeln!(w)?;

    pretty_section(w, &format!("Most negative call per caller (top {})", s.danger.len()))?;
    writeln!(w, "{:>8}  {:<20} TEXT", "POLARITY", "CALLER")?;
    pretty_rule(w)?;
    for d in &s.danger {
        writeln!(
            w,
            "{:>8}  {:<20} {}",
            fmt_score(d.polarity),
            d.caller_id,
            d.call_text
        )?;
    }
    Ok(())
}
