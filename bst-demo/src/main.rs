//! bst-demo - Walkthrough of the persistent binary search tree
//!
//! Builds a tree by inserting a sequence of keys and reports its size,
//! height, sorted keys, extremes, balance diagnostics, a shifted copy, the
//! structural rendering and the root paths to a few probe keys.
//!
//! Usage:
//!   bst-demo [--scenario <yaml>] [--keys 3,2,1] [--shift 1] [--probe 0 ...] [--format text|json]
//!
//! Logging goes to stderr and is controlled by `RUST_LOG`
//! (default `bst_demo=info`).

mod cli;
mod report;
mod scenario;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Cli, OutputFormat};
use report::Report;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bst_demo=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let scenario = cli
        .resolve_scenario()
        .context("could not prepare the scenario")?;
    tracing::info!(
        keys = scenario.keys.len(),
        shift = scenario.shift,
        probes = scenario.probes.len(),
        "running scenario"
    );

    let report = Report::build(&scenario).context("could not run the scenario")?;

    match cli.format {
        OutputFormat::Text => print!("{report}"),
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&report).context("could not encode the report")?
        ),
    }

    Ok(())
}
