#![forbid(unsafe_code)]

mod cmd;
mod config;
mod output;

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{CommandFactory, Parser, Subcommand};
use output::{CliError, OutputMode, render_error, resolve_output_mode};
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "callnet: call-record network analytics",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output format: pretty, text or json.
    #[arg(long, value_enum, global = true)]
    format: Option<OutputMode>,

    /// Shorthand for `--format json`.
    #[arg(long, global = true, hide = true)]
    json: bool,

    /// Read analysis settings from this TOML file.
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn output_mode(&self) -> OutputMode {
        resolve_output_mode(self.format, self.json)
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        next_help_heading = "Overview",
        about = "Summarize a call-record file",
        long_about = "Load a call-record CSV and report row counts, time-of-day buckets and graph statistics.",
        after_help = "EXAMPLES:\n    # Summarize a file\n    callnet summary calls.csv\n\n    # Emit machine-readable output\n    callnet summary calls.csv --format json"
    )]
    Summary(cmd::summary::SummaryArgs),

    #[command(
        next_help_heading = "Overview",
        about = "Print the communication graph",
        long_about = "Print the directed caller to receiver graph as an edge list or as Graphviz DOT.",
        after_help = "EXAMPLES:\n    # Edge list\n    callnet graph calls.csv\n\n    # Render with Graphviz\n    callnet graph calls.csv --dot | dot -Tsvg > calls.svg"
    )]
    Graph(cmd::graph::GraphArgs),

    #[command(
        next_help_heading = "Analysis",
        about = "Rank participants by centrality",
        long_about = "Compute degree, betweenness, closeness, eigenvector and PageRank centrality for every participant.",
        after_help = "EXAMPLES:\n    # Top 10 by PageRank\n    callnet centrality calls.csv\n\n    # Top 5 brokers\n    callnet centrality calls.csv --sort betweenness --top 5"
    )]
    Centrality(cmd::centrality::CentralityArgs),

    #[command(
        next_help_heading = "Analysis",
        about = "Score participants for risk",
        long_about = "Combine normalized PageRank, betweenness and out-degree into a risk score and label the top quantile High-Risk.",
        after_help = "EXAMPLES:\n    # Full risk table\n    callnet risk calls.csv\n\n    # High-risk participants only, saved to CSV\n    callnet risk calls.csv --high-risk-only --export high_risk.csv"
    )]
    Risk(cmd::risk::RiskArgs),

    #[command(
        next_help_heading = "Analysis",
        about = "Detect communities per stratum",
        long_about = "Split records by location (or time slot and location) and run Louvain community detection on each part.",
        after_help = "EXAMPLES:\n    # Communities per location\n    callnet communities calls.csv\n\n    # Per time slot and location\n    callnet communities calls.csv --by time-location\n\n    # Members of communities 0 and 2 in Mumbai\n    callnet communities calls.csv --stratum Mumbai --select 0,2"
    )]
    Communities(cmd::communities::CommunitiesArgs),

    #[command(
        next_help_heading = "Analysis",
        about = "Classify call text and rank dangerous callers",
        long_about = "Score each Call_Text with the sentiment lexicon and list each caller's most negative call.",
        after_help = "EXAMPLES:\n    # Danger ranking\n    callnet sentiment calls.csv\n\n    # Extend the lexicon\n    callnet sentiment calls.csv --lexicon slang.csv --top 20"
    )]
    Sentiment(cmd::sentiment::SentimentArgs),

    #[command(
        next_help_heading = "Shell",
        about = "Generate shell completions",
        long_about = "Generate shell completion scripts for callnet.",
        after_help = "EXAMPLES:\n    # Generate zsh completions\n    callnet completions zsh > ~/.zfunc/_callnet"
    )]
    Completions(cmd::completions::CompletionsArgs),
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("CALLNET_LOG").unwrap_or_else(|_| {
        EnvFilter::new(if verbose || env::var("DEBUG").is_ok() {
            "callnet=debug,info"
        } else {
            "callnet=info,warn"
        })
    });

    let format = env::var("CALLNET_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn run(cli: Cli, output: OutputMode) -> anyhow::Result<()> {
    let cwd = env::current_dir()?;

    if let Commands::Completions(args) = &cli.command {
        let mut command = Cli::command();
        return cmd::completions::run_completions(args.shell, &mut command);
    }

    let config = config::load_config(cli.config.as_deref(), &cwd)?;
    debug!(?config, "effective configuration");

    match &cli.command {
        Commands::Summary(args) => cmd::summary::run_summary(args, &config, output),
        Commands::Graph(args) => cmd::graph::run_graph(args, &config, output),
        Commands::Centrality(args) => cmd::centrality::run_centrality(args, &config, output),
        Commands::Risk(args) => cmd::risk::run_risk(args, &config, output),
        Commands::Communities(args) => cmd::communities::run_communities(args, &config, output),
        Commands::Sentiment(args) => cmd::sentiment::run_sentiment(args, &config, output),
        Commands::Completions(_) => Ok(()),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let output = cli.output_mode();
    match run(cli, output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            if render_error(output, &CliError::from_anyhow(&err)).is_err() {
                eprintln!("error: {err:#}");
            }
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use callnet_analytics::community::Stratification;
    use callnet_analytics::metrics::MetricColumn;

    #[test]
    fn format_flag_parses_after_subcommand() {
        let cli = Cli::parse_from(["callnet", "summary", "calls.csv", "--format", "json"]);
        assert_eq!(cli.format, Some(OutputMode::Json));
        assert!(cli.output_mode().is_json());
    }

    #[test]
    fn json_flag_sets_output_mode() {
        let cli = Cli::parse_from(["callnet", "--json", "risk", "calls.csv"]);
        assert!(cli.json);
        assert!(cli.output_mode().is_json());
    }

    #[test]
    fn format_flag_wins_over_json_flag() {
        let cli = Cli::parse_from(["callnet", "--json", "--format", "text", "risk", "calls.csv"]);
        assert_eq!(cli.output_mode(), OutputMode::Text);
    }

    #[test]
    fn config_flag_is_global() {
        let cli = Cli::parse_from(["callnet", "centrality", "calls.csv", "--config", "x.toml"]);
        assert_eq!(cli.config, Some(PathBuf::from("x.toml")));
    }

    #[test]
    fn centrality_defaults() {
        let cli = Cli::parse_from(["callnet", "centrality", "calls.csv"]);
        let Commands::Centrality(args) = cli.command else {
            panic!("expected centrality");
        };
        assert_eq!(args.top, 10);
        assert_eq!(args.sort, MetricColumn::PageRank);
    }

    #[test]
    fn communities_select_requires_stratum() {
        let err = Cli::try_parse_from(["callnet", "communities", "calls.csv", "--select", "1"]);
        assert!(err.is_err());
    }

    #[test]
    fn communities_seed_conflicts_with_unseeded() {
        let err = Cli::try_parse_from([
            "callnet",
            "communities",
            "calls.csv",
            "--seed",
            "7",
            "--unseeded",
        ]);
        assert!(err.is_err());
    }

    #[test]
    fn communities_parses_selection() {
        let cli = Cli::parse_from([
            "callnet",
            "communities",
            "calls.csv",
            "--by",
            "time-location",
            "--stratum",
            "Morning:Mumbai",
            "--select",
            "0,2",
        ]);
        let Commands::Communities(args) = cli.command else {
            panic!("expected communities");
        };
        assert_eq!(args.by, Stratification::TimeLocation);
        assert_eq!(args.stratum.as_deref(), Some("Morning:Mumbai"));
        assert_eq!(args.select, vec![0, 2]);
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }
}
