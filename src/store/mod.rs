//! Compound storage backends.

pub mod memory;

use crate::matcher::support_in;
use crate::types::{Compound, CompoundId, LabeledGraph, SupportSet, VertexLabel};

/// Trait for compound storage backends.
///
/// Mining only reads from the store, so the trait is read-only; backends
/// expose their own population methods. Implementations must guarantee
/// a stable index for every compound once mining starts.
pub trait CompoundStore: Send + Sync {
    /// Number of stored compounds.
    fn count_compounds(&self) -> usize;

    /// Compound at store index `index`.
    fn compound(&self, index: usize) -> Option<&Compound>;

    /// Store index of compound `id`.
    fn index_of(&self, id: CompoundId) -> Option<usize>;

    /// Iterate `(index, compound)` pairs in index order.
    fn iter(&self) -> Box<dyn Iterator<Item = (usize, &Compound)> + '_> {
        Box::new((0..self.count_compounds()).filter_map(move |i| self.compound(i).map(|c| (i, c))))
    }

    /// Distinct vertex labels across all compounds, ascending.
    fn root_labels(&self) -> Vec<VertexLabel> {
        let mut labels: Vec<VertexLabel> = self
            .iter()
            .flat_map(|(_, c)| c.label_counts().iter().map(|(l, _)| *l).collect::<Vec<_>>())
            .collect();
        labels.sort_unstable();
        labels.dedup();
        labels
    }

    /// Supporting set of an arbitrary connected pattern.
    fn support_of<P: LabeledGraph>(&self, pattern: &P) -> SupportSet
    where
        Self: Sized,
    {
        support_in(pattern, self.iter())
    }
}

pub use memory::{InMemoryCompoundStore, StoreError};
