//! Walkthrough report
//!
//! Builds the tree described by a scenario and collects every diagnostic
//! the walkthrough prints.

use persistent_bst::persistent::PersistentBst;
use serde::Serialize;
use std::fmt;
use tracing::{debug, info, warn};

use crate::scenario::{Scenario, ScenarioError};

/// Path reconstruction result for one probe key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Probe {
    pub target: i64,
    /// `None` when the target is not in the tree
    pub path: Option<Vec<i64>>,
}

/// Everything the walkthrough reports about one tree.
#[derive(Debug, Serialize)]
pub struct Report {
    pub num_nodes: usize,
    pub height: usize,
    pub inorder: Vec<i64>,
    pub min_item: Option<i64>,
    pub max_item: Option<i64>,
    pub balance_factor: Option<isize>,
    pub balanced_everywhere: bool,
    pub shift: i64,
    /// Shifted tree, serialized as its keys in root-first order
    pub shifted: PersistentBst<i64>,
    pub shifted_rendering: String,
    pub rendering: String,
    pub probes: Vec<Probe>,
}

/// Inserts the scenario keys into an empty tree, one at a time.
pub fn build_tree(keys: &[i64]) -> PersistentBst<i64> {
    keys.iter().fold(PersistentBst::new(), |tree, &key| {
        let inserted = tree.insert(key);
        if inserted.ptr_eq(&tree) {
            debug!(key, "duplicate key ignored");
        } else {
            debug!(key, height = inserted.height(), "inserted key");
        }
        inserted
    })
}

impl Report {
    /// Runs the scenario and collects the report.
    pub fn build(scenario: &Scenario) -> Result<Self, ScenarioError> {
        let tree = build_tree(&scenario.keys);
        info!(
            num_nodes = tree.num_nodes(),
            height = tree.height(),
            "built tree"
        );

        let shifted = tree
            .checked_add_to_all(&scenario.shift)
            .ok_or(ScenarioError::ShiftOverflow {
                shift: scenario.shift,
            })?;

        let probes = scenario
            .probes
            .iter()
            .map(|&target| {
                let path = tree
                    .path_to(&target)
                    .map(|keys| keys.into_iter().copied().collect());
                if path.is_none() {
                    warn!(probe = target, "probe key is not in the tree");
                }
                Probe { target, path }
            })
            .collect();

        let balanced_everywhere = tree.balanced_everywhere();
        info!(
            balance_factor = ?tree.balance_factor(),
            balanced_everywhere,
            "checked balance"
        );

        Ok(Self {
            num_nodes: tree.num_nodes(),
            height: tree.height(),
            inorder: tree.iter().copied().collect(),
            min_item: tree.min_item().copied(),
            max_item: tree.max_item().copied(),
            balance_factor: tree.balance_factor(),
            balanced_everywhere,
            shift: scenario.shift,
            shifted_rendering: shifted.render(),
            shifted,
            rendering: tree.render(),
            probes,
        })
    }
}

/// Writes an optional value, or `None` when absent.
fn optional<T: fmt::Debug>(value: Option<&T>) -> String {
    value.map_or_else(|| "None".to_string(), |inner| format!("{inner:?}"))
}

impl fmt::Display for Report {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(formatter, "The number of nodes is {}", self.num_nodes)?;
        writeln!(formatter, "The height is {}", self.height)?;
        writeln!(formatter, "Items in order is {:?}", self.inorder)?;
        writeln!(formatter, "min item is {}", optional(self.min_item.as_ref()))?;
        writeln!(formatter, "max item is {}", optional(self.max_item.as_ref()))?;
        writeln!(formatter, "BF is {}", optional(self.balance_factor.as_ref()))?;
        writeln!(
            formatter,
            "BST is balanced everywhere: {}",
            self.balanced_everywhere
        )?;
        writeln!(formatter, "add {} to all {}", self.shift, self.shifted_rendering)?;
        writeln!(formatter, "bst:")?;
        writeln!(formatter, "{}", self.rendering)?;
        for probe in &self.probes {
            writeln!(
                formatter,
                "path to {}: {}",
                probe.target,
                optional(probe.path.as_ref())
            )?;
        }
        Ok(())
    }
}
