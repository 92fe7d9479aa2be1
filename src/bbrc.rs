//! Closed/boundary filter for backbone refinement class mining.
//!
//! Patterns with the same supporting set form a class. Only the class
//! boundary is reported when the backbone filter is on:
//!
//! - closed: no one-edge extension keeps the supporting set
//! - entry: every connected one-edge removal strictly grows it
//!
//! One-edge patterns are always entries. Supports of removal patterns
//! are found by subgraph matching and cached per root.

use std::num::NonZeroUsize;

use lru::LruCache;

use crate::canonical_form::{canonical_code, CanonicalError};
use crate::occurrence::Pattern;
use crate::store::CompoundStore;
use crate::types::{DfsCode, PatternRole};

/// Default number of cached sub-pattern supports per root.
pub const DEFAULT_SUPPORT_CACHE: usize = 4096;

/// Whether no child shares the pattern's supporting set.
///
/// `children` must hold every one-edge extension, canonical or not.
/// Child supports are subsets of the parent's, so equal size means equal
/// set.
pub fn is_closed(pattern: &Pattern, children: &[Pattern]) -> bool {
    let support = pattern.support().len();
    children.iter().all(|child| child.support().len() < support)
}

/// Role from the two boundary flags.
pub fn role_of(closed: bool, entry: bool) -> PatternRole {
    if closed {
        PatternRole::Closed
    } else if entry {
        PatternRole::Entry
    } else {
        PatternRole::Interior
    }
}

/// Entry test with a per-root cache of sub-pattern supports.
pub struct BoundaryFilter<'s, S: CompoundStore> {
    store: &'s S,
    cache: LruCache<DfsCode, usize>,
    lookups: u64,
    hits: u64,
}

impl<'s, S: CompoundStore> BoundaryFilter<'s, S> {
    /// Create a filter over `store` caching up to `capacity` supports.
    pub fn new(store: &'s S, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            store,
            cache: LruCache::new(capacity),
            lookups: 0,
            hits: 0,
        }
    }

    /// Whether `pattern` is an entry of its class.
    ///
    /// `parent_support` is the support of its canonical parent.
    pub fn is_entry(&mut self, pattern: &Pattern, parent_support: usize) -> Result<bool, CanonicalError> {
        let graph = pattern.graph();
        let support = pattern.support().len();
        if graph.edges().len() <= 1 {
            return Ok(true);
        }
        if parent_support == support {
            return Ok(false);
        }
        for removed in 0..graph.edges().len() {
            let Some(sub) = graph.without_edge(removed) else {
                continue;
            };
            let code = canonical_code(&sub)?;
            if self.support_of(code, &sub) == support {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn support_of(&mut self, code: DfsCode, sub: &crate::types::IndexedGraph) -> usize {
        self.lookups += 1;
        if let Some(&cached) = self.cache.get(&code) {
            self.hits += 1;
            return cached;
        }
        let count = self.store.support_of(sub).len();
        self.cache.put(code, count);
        count
    }

    /// `(lookups, hits)` of the support cache.
    pub fn cache_stats(&self) -> (u64, u64) {
        (self.lookups, self.hits)
    }
}
