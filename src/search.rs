//! Depth-first extension search for one root.
//!
//! Starting from a single-vertex seed, the search grows patterns one
//! edge at a time. Each pattern is explored only from its canonical
//! parent, so every pattern is visited exactly once per root.
//!
//! ## Algorithm
//!
//! 1. Seed the stack with the root pattern and its explorable children
//! 2. Pop the next child of the top frame
//! 3. Assess it, then decide whether to expand it (pruned and
//!    support-1 patterns are leaves)
//! 4. Expanding yields all children, which also settles closedness
//! 5. Emit the pattern if it passes the significance and backbone filters
//! 6. Push a frame for its canonical, frequent children (ascending code)
//!
//! Frames own their patterns and embeddings, so backtracking releases
//! them. Each frame also carries the highest statistic on its path, the
//! threshold dynamic upper bound pruning compares against.
//!
//! When block separators are on, an expanded pattern without explorable
//! children closes the current block.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::bbrc::{is_closed, role_of, BoundaryFilter, DEFAULT_SUPPORT_CACHE};
use crate::canonical_form::CanonicalError;
use crate::occurrence::Pattern;
use crate::policy::{MiningPolicy, PolicyError};
use crate::significance::{SignificanceError, SignificanceEvaluator};
use crate::store::CompoundStore;
use crate::types::{CompoundId, MiningResult, VertexLabel};

/// Error type for mining operations.
#[derive(Debug, thiserror::Error)]
pub enum MineError {
    /// Root index outside `0..count`.
    #[error("Root index {index} out of range, {count} root nodes")]
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of roots.
        count: usize,
    },
    /// Canonical form failure on a pathological pattern.
    #[error("Canonical form failure: {0}")]
    Canonical(#[from] CanonicalError),
    /// Labels unusable for the configured test.
    #[error(transparent)]
    Significance(#[from] SignificanceError),
    /// Policy values out of range.
    #[error("Invalid policy: {0}")]
    Policy(#[from] PolicyError),
    /// Streamed output was requested without a sink.
    #[error("Streamed output needs a result sink")]
    MissingSink,
    /// The result sink failed.
    #[error("Result sink failed: {0}")]
    Sink(#[from] std::io::Error),
    /// The run was cancelled.
    #[error("Mining cancelled")]
    Cancelled,
}

/// Shared flag that stops running searches at their next step.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a token that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    /// Clear a previous cancellation.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::Relaxed);
    }
}

/// What the search hands to its caller, in discovery order.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchEvent {
    /// A pattern that passed the filters.
    Pattern(MiningResult),
    /// A search leaf was reached; later patterns start a new block.
    Separator,
}

/// A root node: one distinct vertex label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RootNode {
    /// Position in ascending label order.
    pub index: usize,
    /// The label.
    pub label: VertexLabel,
}

/// Counters for one root.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Patterns visited.
    pub visited: u64,
    /// Patterns emitted.
    pub emitted: u64,
    /// Patterns whose branch was cut by the statistic bound.
    pub pruned: u64,
    /// Support-1 patterns kept as leaves.
    pub single_leaves: u64,
}

struct Frame {
    pattern: Pattern,
    children: std::vec::IntoIter<Pattern>,
    best: f64,
}

/// Extension search over one store under one policy.
pub struct ExtensionSearch<'a, S: CompoundStore> {
    store: &'a S,
    policy: &'a MiningPolicy,
    evaluator: Option<SignificanceEvaluator>,
    cancel: &'a CancellationToken,
}

impl<'a, S: CompoundStore> ExtensionSearch<'a, S> {
    /// Prepare a search. Fails when the labels do not fit the policy.
    pub fn new(store: &'a S, policy: &'a MiningPolicy, cancel: &'a CancellationToken) -> Result<Self, MineError> {
        policy.validate()?;
        let evaluator = if policy.tests_significance() {
            Some(SignificanceEvaluator::new(store, policy)?)
        } else {
            None
        };
        Ok(Self {
            store,
            policy,
            evaluator,
            cancel,
        })
    }

    /// Children of `pattern` that are explored from it, plus its
    /// closedness.
    fn expand(&self, pattern: &Pattern) -> Result<(Vec<Pattern>, bool), MineError> {
        let all = pattern.children(self.store, self.policy.structure)?;
        let closed = is_closed(pattern, &all);
        let explorable = all
            .into_iter()
            .filter(|child| child.support().len() >= self.policy.min_frequency)
            .filter(|child| pattern.is_parent_of(child))
            .collect();
        Ok((explorable, closed))
    }

    fn compound_ids(&self, pattern: &Pattern) -> Vec<CompoundId> {
        let mut ids: Vec<CompoundId> = pattern
            .support()
            .iter()
            .filter_map(|i| self.store.compound(i).map(|c| c.id()))
            .collect();
        ids.sort_unstable();
        ids
    }

    /// Mine every pattern rooted at `root`, passing results to `emit` in
    /// depth-first preorder.
    pub fn run<F>(&self, root: RootNode, mut emit: F) -> Result<SearchStats, MineError>
    where
        F: FnMut(SearchEvent) -> Result<(), MineError>,
    {
        let mut stats = SearchStats::default();
        let seed = Pattern::root(self.store, root.label);
        if seed.support().len() < self.policy.min_frequency {
            return Ok(stats);
        }

        let mut filter = BoundaryFilter::new(self.store, DEFAULT_SUPPORT_CACHE);
        let (children, _) = self.expand(&seed)?;
        let separates = self.policy.separates_blocks();
        let mut stack = vec![Frame {
            pattern: seed,
            children: children.into_iter(),
            best: 0.0,
        }];

        while let Some(frame) = stack.last_mut() {
            if self.cancel.is_cancelled() {
                return Err(MineError::Cancelled);
            }
            let Some(child) = frame.children.next() else {
                stack.pop();
                continue;
            };
            let parent_support = frame.pattern.support().len();
            let best = frame.best;
            stats.visited += 1;

            let assessment = self.evaluator.as_ref().map(|e| e.assess(child.support()));
            let pruned = match (&self.evaluator, &assessment) {
                (Some(evaluator), Some(a)) => evaluator.prunes(a, best),
                _ => false,
            };
            let single = !self.policy.refine_singles && child.support().len() == 1;
            let significant = assessment.as_ref().map_or(true, |a| a.significant);

            let (grandchildren, closed) = if pruned {
                stats.pruned += 1;
                // Only a dynamic bound cuts significant patterns.
                let closed = significant && self.expand(&child)?.1;
                (Vec::new(), closed)
            } else if single {
                stats.single_leaves += 1;
                (Vec::new(), !child.has_extension(self.store, self.policy.structure))
            } else {
                self.expand(&child)?
            };
            let leaf = !pruned && !single && grandchildren.is_empty();
            let path_best = assessment.as_ref().map_or(best, |a| best.max(a.statistic));

            if significant {
                let entry = if closed { false } else { filter.is_entry(&child, parent_support)? };
                let boundary = closed || entry;
                if !self.policy.backbone || boundary {
                    stats.emitted += 1;
                    emit(SearchEvent::Pattern(MiningResult {
                        root: root.index,
                        code: child.code().clone(),
                        support: child.support().len(),
                        compounds: self.compound_ids(&child),
                        assessment,
                        closed,
                        role: role_of(closed, entry),
                        boundary,
                    }))?;
                }
            }
            if separates && leaf {
                emit(SearchEvent::Separator)?;
            }

            if !grandchildren.is_empty() {
                stack.push(Frame {
                    pattern: child,
                    children: grandchildren.into_iter(),
                    best: path_best,
                });
            }
        }

        let (lookups, hits) = filter.cache_stats();
        tracing::debug!(
            visited = stats.visited,
            emitted = stats.emitted,
            pruned = stats.pruned,
            single_leaves = stats.single_leaves,
            cache_lookups = lookups,
            cache_hits = hits,
            "root finished"
        );
        Ok(stats)
    }
}
