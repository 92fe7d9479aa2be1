//! In-memory compound store.

use std::collections::BTreeMap;

use crate::types::{Compound, CompoundId, GraphError, IndexedGraph, MolGraph};
use super::CompoundStore;

/// Error type for store population.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    /// A compound with this id is already stored.
    #[error("Duplicate compound id: {0}")]
    DuplicateId(CompoundId),
    /// No compound with this id is stored.
    #[error("Unknown compound: {0}")]
    UnknownCompound(CompoundId),
    /// The graph failed validation.
    #[error("Malformed graph for compound {id}: {source}")]
    MalformedGraph {
        /// Compound the graph was submitted for.
        id: CompoundId,
        /// What was wrong with it.
        #[source]
        source: GraphError,
    },
    /// Activity labels are fixed once set.
    #[error("Activity already set for compound {0}")]
    ActivityAlreadySet(CompoundId),
    /// Activity values must be finite.
    #[error("Invalid activity {value} for compound {id}")]
    InvalidActivity {
        /// Compound the value was submitted for.
        id: CompoundId,
        /// The rejected value.
        value: f64,
    },
}

/// In-memory compound store.
///
/// Compounds keep their insertion index for the lifetime of the store.
/// Lookups by id go through a BTreeMap for deterministic iteration.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCompoundStore {
    /// Compounds in insertion order.
    compounds: Vec<Compound>,
    /// Id -> insertion index.
    index: BTreeMap<CompoundId, usize>,
}

impl InMemoryCompoundStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate and add a compound. Returns its store index.
    ///
    /// On error the store is unchanged.
    pub fn add_compound(&mut self, id: CompoundId, graph: &MolGraph) -> Result<usize, StoreError> {
        if self.index.contains_key(&id) {
            return Err(StoreError::DuplicateId(id));
        }
        let indexed = IndexedGraph::from_mol(graph)
            .map_err(|source| StoreError::MalformedGraph { id, source })?;

        let position = self.compounds.len();
        self.compounds.push(Compound::new(id, indexed));
        self.index.insert(id, position);
        Ok(position)
    }

    /// Attach an activity label to a stored compound.
    pub fn add_activity(&mut self, id: CompoundId, value: f64) -> Result<(), StoreError> {
        let position = *self.index.get(&id).ok_or(StoreError::UnknownCompound(id))?;
        if !value.is_finite() {
            return Err(StoreError::InvalidActivity { id, value });
        }
        let compound = &mut self.compounds[position];
        if compound.activity().is_some() {
            return Err(StoreError::ActivityAlreadySet(id));
        }
        compound.set_activity(value);
        Ok(())
    }

    /// Number of compounds with an activity label.
    pub fn count_labelled(&self) -> usize {
        self.compounds.iter().filter(|c| c.activity().is_some()).count()
    }

    /// All compounds in insertion order.
    pub fn all_compounds(&self) -> &[Compound] {
        &self.compounds
    }
}

impl CompoundStore for InMemoryCompoundStore {
    fn count_compounds(&self) -> usize {
        self.compounds.len()
    }

    fn compound(&self, index: usize) -> Option<&Compound> {
        self.compounds.get(index)
    }

    fn index_of(&self, id: CompoundId) -> Option<usize> {
        self.index.get(&id).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EdgeLabel, VertexLabel};

    fn make_graph(labels: &[u16], edges: &[(usize, usize, u16)]) -> MolGraph {
        MolGraph::from_parts(
            labels.iter().map(|&l| VertexLabel(l)).collect(),
            edges.iter().map(|&(a, b, l)| (a, b, EdgeLabel(l))).collect(),
        )
    }

    #[test]
    fn test_add_and_get_compound() {
        let mut store = InMemoryCompoundStore::new();
        let index = store.add_compound(CompoundId(10), &make_graph(&[6, 8], &[(0, 1, 1)])).unwrap();

        assert_eq!(index, 0);
        assert_eq!(store.count_compounds(), 1);
        assert_eq!(store.index_of(CompoundId(10)), Some(0));
        assert_eq!(store.compound(0).map(|c| c.id()), Some(CompoundId(10)));
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut store = InMemoryCompoundStore::new();
        store.add_compound(CompoundId(1), &make_graph(&[6], &[])).unwrap();

        let err = store.add_compound(CompoundId(1), &make_graph(&[7], &[])).unwrap_err();
        assert_eq!(err, StoreError::DuplicateId(CompoundId(1)));
        assert_eq!(store.count_compounds(), 1);
    }

    #[test]
    fn test_malformed_graph_leaves_store_unchanged() {
        let mut store = InMemoryCompoundStore::new();
        let err = store
            .add_compound(CompoundId(3), &make_graph(&[6, 6], &[(0, 1, 1), (1, 0, 2)]))
            .unwrap_err();
        assert!(matches!(
            err,
            StoreError::MalformedGraph { id: CompoundId(3), source: GraphError::DuplicateEdge { .. } }
        ));
        assert_eq!(store.count_compounds(), 0);
        assert_eq!(store.index_of(CompoundId(3)), None);
    }

    #[test]
    fn test_activity_rules() {
        let mut store = InMemoryCompoundStore::new();
        store.add_compound(CompoundId(1), &make_graph(&[6], &[])).unwrap();

        assert_eq!(
            store.add_activity(CompoundId(2), 1.0),
            Err(StoreError::UnknownCompound(CompoundId(2)))
        );
        assert!(matches!(
            store.add_activity(CompoundId(1), f64::NAN),
            Err(StoreError::InvalidActivity { .. })
        ));
        store.add_activity(CompoundId(1), 1.0).unwrap();
        assert_eq!(
            store.add_activity(CompoundId(1), 0.0),
            Err(StoreError::ActivityAlreadySet(CompoundId(1)))
        );
        assert_eq!(store.count_labelled(), 1);
    }

    #[test]
    fn test_root_labels_and_support() {
        let mut store = InMemoryCompoundStore::new();
        store.add_compound(CompoundId(1), &make_graph(&[8, 6], &[(0, 1, 1)])).unwrap();
        store.add_compound(CompoundId(2), &make_graph(&[7, 6], &[(0, 1, 2)])).unwrap();

        assert_eq!(store.root_labels(), vec![VertexLabel(6), VertexLabel(7), VertexLabel(8)]);

        let pattern = IndexedGraph::from_mol(&make_graph(&[6, 7], &[(0, 1, 2)])).unwrap();
        assert_eq!(store.support_of(&pattern).as_slice(), &[1]);
    }
}
