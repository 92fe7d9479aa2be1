//! Compound identity and stored compound records.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::graph::{IndexedGraph, LabeledGraph, VertexLabel};

/// Caller-assigned compound identifier.
///
/// Implements `Ord` so supporting compound lists come out sorted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CompoundId(pub u32);

impl fmt::Display for CompoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for CompoundId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

/// A validated compound held by the store.
#[derive(Debug, Clone)]
pub struct Compound {
    id: CompoundId,
    graph: IndexedGraph,
    activity: Option<f64>,
    /// Sorted `(label, count)` pairs, used to reject impossible matches early.
    label_counts: Vec<(VertexLabel, u32)>,
}

impl Compound {
    /// Wrap an already validated graph.
    pub fn new(id: CompoundId, graph: IndexedGraph) -> Self {
        let label_counts = label_histogram(&graph);
        Self {
            id,
            graph,
            activity: None,
            label_counts,
        }
    }

    /// Compound identifier.
    pub fn id(&self) -> CompoundId {
        self.id
    }

    /// The compound graph.
    pub fn graph(&self) -> &IndexedGraph {
        &self.graph
    }

    /// Activity label, if one was set.
    pub fn activity(&self) -> Option<f64> {
        self.activity
    }

    pub(crate) fn set_activity(&mut self, value: f64) {
        self.activity = Some(value);
    }

    /// Sorted vertex label histogram.
    pub fn label_counts(&self) -> &[(VertexLabel, u32)] {
        &self.label_counts
    }

    /// Whether this compound has at least as many vertices of every label
    /// as `needed` (a sorted histogram).
    pub fn covers_labels(&self, needed: &[(VertexLabel, u32)]) -> bool {
        needed.iter().all(|(label, count)| {
            match self.label_counts.binary_search_by_key(label, |(l, _)| *l) {
                Ok(pos) => self.label_counts[pos].1 >= *count,
                Err(_) => false,
            }
        })
    }
}

/// Sorted `(label, count)` histogram of a graph's vertex labels.
pub fn label_histogram<G: LabeledGraph>(graph: &G) -> Vec<(VertexLabel, u32)> {
    let mut labels: Vec<VertexLabel> = (0..graph.vertex_count())
        .map(|v| graph.vertex_label(v))
        .collect();
    labels.sort_unstable();
    let mut histogram: Vec<(VertexLabel, u32)> = Vec::new();
    for label in labels {
        match histogram.last_mut() {
            Some((last, count)) if *last == label => *count += 1,
            _ => histogram.push((label, 1)),
        }
    }
    histogram
}
