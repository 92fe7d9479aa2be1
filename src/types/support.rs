//! Supporting compound sets.

use serde::{Deserialize, Serialize};

/// Sorted, deduplicated store indices of the compounds containing a pattern.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SupportSet(Vec<usize>);

impl SupportSet {
    /// Build from indices in any order.
    pub fn from_indices(mut indices: Vec<usize>) -> Self {
        indices.sort_unstable();
        indices.dedup();
        Self(indices)
    }

    /// Number of supporting compounds.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether no compound supports the pattern.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether compound `index` is in the set.
    pub fn contains(&self, index: usize) -> bool {
        self.0.binary_search(&index).is_ok()
    }

    /// Indices in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.0.iter().copied()
    }

    /// Indices as a slice.
    pub fn as_slice(&self) -> &[usize] {
        &self.0
    }

    /// Whether every member of `other` is also in `self`.
    pub fn is_superset(&self, other: &SupportSet) -> bool {
        other.iter().all(|i| self.contains(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sorted_and_deduplicated() {
        let set = SupportSet::from_indices(vec![4, 1, 4, 2]);
        assert_eq!(set.as_slice(), &[1, 2, 4]);
        assert!(set.contains(2));
        assert!(!set.contains(3));
        assert!(set.is_superset(&SupportSet::from_indices(vec![1, 4])));
        assert!(!set.is_superset(&SupportSet::from_indices(vec![0])));
    }
}
