// This file is dual licensed under the terms of the Apache License, Version
// 2.0, and the BSD License. See the LICENSE file in the root of this repository
// for complete details.

mod fixture;
mod logging;
mod progress;

use std::fs::File;
use std::time::Duration;

use anyhow::{Context, Result};
use camino::Utf8PathBuf;
use clap::Parser;
use clap_verbosity_flag::Verbosity;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use depresolve::{enumerate_all, path_to, AnalyzeResult, Disposition, Graph, NodeId, ResolverConfig};

use crate::progress::SuspendableBars;

/// Demo driver for the resolver: loads a graph fixture, runs the walk, and
/// prints each node's final disposition plus the anomaly report. Not part
/// of the resolver's contract; real callers embed `depresolve` directly
/// against an already-expanded in-memory graph.
#[derive(Parser, Debug)]
#[clap(version)]
struct Cli {
    /// Path to a YAML graph fixture.
    fixture: Utf8PathBuf,

    /// Optional resolver config (patience, central-transitive handling).
    #[clap(long)]
    config: Option<Utf8PathBuf>,

    #[clap(flatten)]
    verbose: Verbosity,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let bars = SuspendableBars::new();
    logging::setup(cli.verbose.log_level_filter(), bars.clone());

    let config = match &cli.config {
        Some(path) => {
            let file =
                File::open(path).with_context(|| format!("could not open config '{}'", path))?;
            ResolverConfig::load(file).with_context(|| format!("invalid config '{}'", path))?
        }
        None => ResolverConfig::default(),
    };

    let (mut graph, root) = load_fixture(&cli.fixture)?;

    let spinner = bars.with_bar(ProgressBar::new_spinner());
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner} {msg}")?);
    spinner.set_message("resolving dependency graph...");
    spinner.enable_steady_tick(Duration::from_millis(80));

    let result = depresolve::analyze(&mut graph, root, &config)
        .context("failed to analyze dependency graph")?;

    spinner.finish_and_clear();

    print_report(&graph, root, &result);

    Ok(())
}

fn load_fixture(path: &Utf8PathBuf) -> Result<(Graph, NodeId)> {
    let file = File::open(path.as_std_path())
        .with_context(|| format!("could not open fixture '{}'", path))?;
    fixture::load(file).with_context(|| format!("could not parse fixture '{}'", path))
}

fn print_report(graph: &Graph, root: NodeId, result: &AnalyzeResult) {
    println!("{}", style("dispositions").bold());
    for id in enumerate_all(graph, root) {
        let node = graph.node(id);
        let label = match &node.item {
            Some(item) => format!("{} {}", node.key.name, item.version),
            None => node.key.name.clone(),
        };
        let marker = match node.disposition {
            Disposition::Accepted => style("accepted").green().to_string(),
            Disposition::Rejected => style("rejected").yellow().to_string(),
            Disposition::Cycle => style("cycle").red().to_string(),
            Disposition::Acceptable | Disposition::PotentiallyDowngraded => {
                style("unresolved").dim().to_string()
            }
        };
        println!("  {:<40} {}", label, marker);
    }

    if !result.cycles.is_empty() {
        println!("\n{}", style("cycles").bold().red());
        for cycle in &result.cycles {
            println!("  {}", cycle.path);
        }
    }

    if !result.version_conflicts.is_empty() {
        println!("\n{}", style("version conflicts").bold().yellow());
        for conflict in &result.version_conflicts {
            println!(
                "  {}: {} vs {}",
                conflict.name,
                path_to(graph, conflict.accepted),
                path_to(graph, conflict.rejected)
            );
        }
    }

    if !result.downgrades.is_empty() {
        println!("\n{}", style("downgrades").bold().cyan());
        for downgrade in &result.downgrades {
            println!(
                "  {}: {} -> {}",
                downgrade.name,
                path_to(graph, downgrade.downgraded_from),
                path_to(graph, downgrade.downgraded_to)
            );
        }
    }
}
