//! Scenario configuration
//!
//! A scenario names the keys to insert, the shift to apply and the keys to
//! trace a path to. It is read from YAML and may be overridden from the
//! command line.

use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while preparing or running a scenario.
#[derive(Debug, Error)]
pub enum ScenarioError {
    /// The scenario file could not be read.
    #[error("failed to read scenario file {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The scenario file is not valid scenario YAML.
    #[error("invalid scenario YAML")]
    Parse(#[from] serde_yaml::Error),

    /// Shifting the keys would overflow the key type.
    #[error("shifting every key by {shift} overflows a 64-bit key")]
    ShiftOverflow { shift: i64 },
}

/// Keys, shift and probes for one walkthrough.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Scenario {
    /// Keys inserted into an empty tree, in order
    pub keys: Vec<i64>,
    /// Amount added to every key by the shift transform
    pub shift: i64,
    /// Keys to reconstruct the root path for
    pub probes: Vec<i64>,
}

impl Default for Scenario {
    fn default() -> Self {
        Self {
            keys: vec![3, 2, 1, 0, 4, 5],
            shift: 1,
            probes: vec![0, 8],
        }
    }
}

impl Scenario {
    /// Parses a scenario from YAML text. Missing fields take their defaults.
    pub fn parse(text: &str) -> Result<Self, ScenarioError> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Loads a scenario from a YAML file.
    pub fn load(path: &Path) -> Result<Self, ScenarioError> {
        let text = fs::read_to_string(path).map_err(|source| ScenarioError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn test_parse_full_scenario() {
        let scenario = Scenario::parse("keys: [4, 2, 6]\nshift: -3\nprobes: [2, 9]\n").unwrap();
        assert_eq!(
            scenario,
            Scenario {
                keys: vec![4, 2, 6],
                shift: -3,
                probes: vec![2, 9],
            }
        );
    }

    #[rstest]
    fn test_parse_fills_missing_fields_with_defaults() {
        let scenario = Scenario::parse("keys: [10, 20]\n").unwrap();
        assert_eq!(scenario.keys, vec![10, 20]);
        assert_eq!(scenario.shift, 1);
        assert_eq!(scenario.probes, vec![0, 8]);
    }

    #[rstest]
    #[case("keys: [1, 2]\nunknown: true\n")]
    #[case("keys: one\n")]
    #[case("shift: [1]\n")]
    fn test_parse_rejects_malformed_yaml(#[case] text: &str) {
        assert!(matches!(Scenario::parse(text), Err(ScenarioError::Parse(_))));
    }

    #[rstest]
    fn test_load_missing_file_reports_path() {
        let path = Path::new("definitely/not/a/scenario.yaml");
        let error = Scenario::load(path).unwrap_err();
        assert!(matches!(&error, ScenarioError::Read { path: reported, .. } if reported == path));
        assert!(error.to_string().contains("definitely/not/a/scenario.yaml"));
    }

    #[rstest]
    fn test_bundled_scenarios_parse() {
        let directory = Path::new(env!("CARGO_MANIFEST_DIR")).join("scenarios");
        for name in ["lopsided.yaml", "perfect.yaml"] {
            let scenario = Scenario::load(&directory.join(name)).unwrap();
            assert!(!scenario.keys.is_empty());
        }
    }
}
