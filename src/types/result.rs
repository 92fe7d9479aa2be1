//! Mining results.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::compound::CompoundId;
use super::dfs_code::DfsCode;

/// Whether a pattern is over- or under-represented among actives (or
/// among high activity values in regression).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// The pattern is associated with activity.
    Activating,
    /// The pattern is associated with inactivity.
    Deactivating,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Activating => write!(f, "activating"),
            Self::Deactivating => write!(f, "deactivating"),
        }
    }
}

/// Statistical assessment of one pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    /// Test statistic (chi-square, or `1 - p` for Kolmogorov-Smirnov).
    pub statistic: f64,
    /// p-value of the test.
    pub p_value: f64,
    /// Upper bound of the statistic over all descendants.
    pub upper_bound: f64,
    /// Whether `statistic` reaches the critical value.
    pub significant: bool,
    /// Direction of the association.
    pub direction: Direction,
    /// Supporting compounds that carry an activity label.
    pub labelled: usize,
    /// Supporting compounds labelled active. Zero in regression mode.
    pub active: usize,
    /// Supporting compounds labelled inactive. Zero in regression mode.
    pub inactive: usize,
}

/// Position of a pattern relative to its equivalence class of patterns
/// sharing the same supporting compounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PatternRole {
    /// No one-edge extension keeps the supporting set.
    Closed,
    /// Every one-edge removal strictly grows the supporting set.
    Entry,
    /// Neither closed nor entry.
    Interior,
}

/// One reported pattern.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MiningResult {
    /// Index of the root node that produced this pattern.
    pub root: usize,
    /// Canonical code of the pattern.
    pub code: DfsCode,
    /// Number of supporting compounds.
    pub support: usize,
    /// Supporting compound identifiers, ascending.
    pub compounds: Vec<CompoundId>,
    /// Statistical assessment, absent when significance filtering is off.
    pub assessment: Option<Assessment>,
    /// Whether the pattern is closed.
    pub closed: bool,
    /// Role of the pattern in its support class.
    pub role: PatternRole,
    /// Whether the pattern lies on the boundary of its support class
    /// (closed or entry).
    pub boundary: bool,
}

impl MiningResult {
    /// Whether the pattern passed the significance test. Always true when
    /// no assessment was made.
    pub fn is_significant(&self) -> bool {
        self.assessment.as_ref().map_or(true, |a| a.significant)
    }
}
