//! Command-line arguments

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

use crate::scenario::{Scenario, ScenarioError};

/// Output format for the report
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// One labelled line per diagnostic
    #[default]
    Text,
    /// A single JSON object
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "bst-demo")]
#[command(about = "Builds a persistent binary search tree and reports its diagnostics")]
pub struct Cli {
    /// Scenario YAML file (keys, shift, probes)
    #[arg(long, short = 's')]
    pub scenario: Option<PathBuf>,

    /// Override the keys to insert, comma separated
    #[arg(long, value_delimiter = ',', allow_negative_numbers = true)]
    pub keys: Option<Vec<i64>>,

    /// Override the amount added to every key
    #[arg(long, allow_negative_numbers = true)]
    pub shift: Option<i64>,

    /// Override the keys to trace a path to (repeatable)
    #[arg(long = "probe", allow_negative_numbers = true)]
    pub probes: Vec<i64>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

impl Cli {
    /// Loads the scenario file, if any, and applies command-line overrides.
    pub fn resolve_scenario(&self) -> Result<Scenario, ScenarioError> {
        let mut scenario = match &self.scenario {
            Some(path) => Scenario::load(path)?,
            None => Scenario::default(),
        };

        if let Some(keys) = &self.keys {
            scenario.keys.clone_from(keys);
        }
        if let Some(shift) = self.shift {
            scenario.shift = shift;
        }
        if !self.probes.is_empty() {
            scenario.probes.clone_from(&self.probes);
        }

        Ok(scenario)
    }
}
