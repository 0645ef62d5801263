//! Network graph CLI
//!
//! Builds clustered layouts from topology snapshots.
//!
//! # Usage
//!
//! ```bash
//! # Lay out the built-in sample topology
//! netgraph_cli layout --sample
//!
//! # Lay out a snapshot file with custom rules, as JSON
//! netgraph_cli layout --snapshot snapshot.json --config rules.yaml -o json
//!
//! # Show how each host was classified
//! netgraph_cli classify --sample
//!
//! # Print the built-in rule tables
//! netgraph_cli config
//! ```

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::ExitCode;

use netgraph::graph::{
    GraphModelBuilder, JsonFileSource, NetworkGraphConfigs, PartialGraphConfigs,
    SampleTopologySource, Snapshot, SnapshotSource, FALLBACK_CATEGORY_ID,
};

#[derive(Parser)]
#[command(name = "netgraph_cli")]
#[command(version)]
#[command(about = "Clustered 3D layout for network topologies")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, short = 'o', global = true, default_value = "summary", value_enum)]
    format: OutputFormat,

    /// Rule table YAML (omitted sections use the built-in defaults)
    #[arg(long, short, global = true, env = "NETGRAPH_CONFIG")]
    config: Option<PathBuf>,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Summary,
}

#[derive(clap::Args)]
struct InputArgs {
    /// Snapshot JSON file
    #[arg(short, long, conflicts_with = "sample")]
    snapshot: Option<PathBuf>,

    /// Use the built-in sample topology
    #[arg(long)]
    sample: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify and lay out a snapshot
    Layout {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Print the classification of every host
    Classify {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Print the default rule tables as YAML
    Config,
}

// =============================================================================
// MAIN
// =============================================================================

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Layout { input } => cmd_layout(input, &cli).await,
        Commands::Classify { input } => cmd_classify(input, &cli).await,
        Commands::Config => cmd_config(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if cli.format == OutputFormat::Json {
                println!("{}", serde_json::json!({ "error": format!("{e:#}") }));
            } else {
                eprintln!("{}: {:#}", "error".red().bold(), e);
            }
            ExitCode::FAILURE
        }
    }
}

// =============================================================================
// COMMAND IMPLEMENTATIONS
// =============================================================================

async fn cmd_layout(input: &InputArgs, cli: &Cli) -> Result<()> {
    let builder = load_builder(cli)?;
    let snapshot = read_snapshot(input).await?;
    let model = builder.build(&snapshot);

    match cli.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&model).context("JSON serialization failed")?
            );
        }
        OutputFormat::Summary => {
            println!(
                "{} {} nodes, {} edges, {} shells",
                "OK".green(),
                model.nodes.len(),
                model.edges.len(),
                model.shells.len()
            );
            for shell in &model.shells {
                println!(
                    "  {:<48} r={:>7.1}  center=({:>8.1}, {:>8.1}, {:>8.1})",
                    shell.id.cyan(),
                    shell.radius,
                    shell.center[0],
                    shell.center[1],
                    shell.center[2]
                );
            }

            let dropped = snapshot.connections.len() - model.edges.len();
            if dropped > 0 {
                println!(
                    "{} {} connection(s) reference unknown hosts",
                    "WARN".yellow(),
                    dropped
                );
            }
        }
    }

    Ok(())
}

async fn cmd_classify(input: &InputArgs, cli: &Cli) -> Result<()> {
    let builder = load_builder(cli)?;
    let snapshot = read_snapshot(input).await?;
    let hosts = builder.rules().classify_hosts(&snapshot.hosts);

    match cli.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&hosts).context("JSON serialization failed")?
            );
        }
        OutputFormat::Summary => {
            println!(
                "{:<28} {:<26} {:<22} {:<20} {}",
                "HOST".bold(),
                "TYPE".bold(),
                "LAYER".bold(),
                "CATEGORY".bold(),
                "CLUSTER".bold()
            );
            for host in &hosts {
                let category = if host.category_id == FALLBACK_CATEGORY_ID {
                    host.category_id.yellow()
                } else {
                    host.category_id.normal()
                };
                println!(
                    "{:<28} {:<26} {:<22} {:<20} {}",
                    host.hostname, host.host_type, host.layer_id, category, host.cluster_key
                );
            }

            let mut per_category: BTreeMap<&str, usize> = BTreeMap::new();
            for host in &hosts {
                *per_category.entry(host.category_id.as_str()).or_default() += 1;
            }
            println!();
            for (category, count) in per_category {
                println!("  {}: {}", category.cyan(), count);
            }
        }
    }

    Ok(())
}

fn cmd_config() -> Result<()> {
    print!("{}", NetworkGraphConfigs::default().to_yaml()?);
    Ok(())
}

// =============================================================================
// HELPERS
// =============================================================================

fn load_builder(cli: &Cli) -> Result<GraphModelBuilder> {
    let configs = match &cli.config {
        Some(path) => PartialGraphConfigs::load_from_file(path)?,
        None => PartialGraphConfigs::default(),
    };
    Ok(GraphModelBuilder::from_configs(&configs)?)
}

async fn read_snapshot(input: &InputArgs) -> Result<Snapshot> {
    match (&input.snapshot, input.sample) {
        (Some(path), _) => JsonFileSource::new(path).fetch().await,
        (None, true) => SampleTopologySource.fetch().await,
        (None, false) => bail!("either --snapshot <FILE> or --sample is required"),
    }
}
