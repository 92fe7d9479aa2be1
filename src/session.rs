//! Read-only mining session over a frozen compound store.
//!
//! A session fixes the root nodes (distinct vertex labels, ascending)
//! and mines one root per call. Sessions are `Send + Sync`; roots can be
//! mined from several threads at once because the store is never
//! mutated.

use std::sync::Arc;

use tracing::info_span;

use crate::policy::{MiningPolicy, OutputMode};
use crate::search::{CancellationToken, ExtensionSearch, MineError, RootNode, SearchEvent, SearchStats};
use crate::sink::ResultSink;
use crate::store::CompoundStore;
use crate::types::{MiningResult, VertexLabel};

/// Root enumerator and result collector.
pub struct MiningSession<S: CompoundStore> {
    store: Arc<S>,
    roots: Vec<VertexLabel>,
}

impl<S: CompoundStore> MiningSession<S> {
    /// Freeze `store` and enumerate its roots.
    pub fn new(store: Arc<S>) -> Self {
        let roots = store.root_labels();
        Self { store, roots }
    }

    /// Number of compounds.
    pub fn count_compounds(&self) -> usize {
        self.store.count_compounds()
    }

    /// Number of root nodes.
    pub fn count_root_nodes(&self) -> usize {
        self.roots.len()
    }

    /// Root node at `index`.
    pub fn root(&self, index: usize) -> Result<RootNode, MineError> {
        self.roots
            .get(index)
            .map(|&label| RootNode { index, label })
            .ok_or(MineError::IndexOutOfRange {
                index,
                count: self.roots.len(),
            })
    }

    /// All root nodes in index order.
    pub fn roots(&self) -> impl Iterator<Item = RootNode> + '_ {
        self.roots
            .iter()
            .enumerate()
            .map(|(index, &label)| RootNode { index, label })
    }

    /// Get a reference to the store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Mine root `index` into a buffer.
    pub fn mine_root(&self, index: usize, policy: &MiningPolicy) -> Result<Vec<MiningResult>, MineError> {
        self.mine_root_with(index, policy, None, &CancellationToken::new())
    }

    /// Mine root `index` under `policy`.
    ///
    /// Buffered mode returns the results in discovery order. Streamed mode
    /// hands each result to `sink` as it is found and returns an empty
    /// vector. On cancellation nothing is returned; results already
    /// streamed stay with the sink.
    pub fn mine_root_with(
        &self,
        index: usize,
        policy: &MiningPolicy,
        sink: Option<&dyn ResultSink>,
        cancel: &CancellationToken,
    ) -> Result<Vec<MiningResult>, MineError> {
        let blocks = self.mine_blocks(index, policy, sink, cancel)?;
        Ok(blocks.into_iter().flatten().collect())
    }

    /// Mine root `index` into blocks.
    ///
    /// With block separators on, each block ends at a search leaf.
    /// Otherwise all results form one block. Empty blocks are dropped.
    pub fn mine_root_blocks(&self, index: usize, policy: &MiningPolicy) -> Result<Vec<Vec<MiningResult>>, MineError> {
        self.mine_blocks(index, policy, None, &CancellationToken::new())
    }

    fn mine_blocks(
        &self,
        index: usize,
        policy: &MiningPolicy,
        sink: Option<&dyn ResultSink>,
        cancel: &CancellationToken,
    ) -> Result<Vec<Vec<MiningResult>>, MineError> {
        let root = self.root(index)?;
        let span = info_span!("mine_root", root = index, label = %root.label);
        let _guard = span.enter();

        let search = ExtensionSearch::new(self.store.as_ref(), policy, cancel)?;
        let mut blocks = Vec::new();
        let mut current = Vec::new();

        let stats: SearchStats = match policy.output {
            OutputMode::Buffered => search.run(root, |event| {
                match event {
                    SearchEvent::Pattern(result) => current.push(result),
                    SearchEvent::Separator if current.is_empty() => {}
                    SearchEvent::Separator => blocks.push(std::mem::take(&mut current)),
                }
                Ok(())
            })?,
            OutputMode::Streamed => {
                let sink = sink.ok_or(MineError::MissingSink)?;
                let stats = search.run(root, |event| match event {
                    SearchEvent::Pattern(result) => sink.accept(&result).map_err(MineError::from),
                    SearchEvent::Separator => Ok(()),
                })?;
                sink.flush()?;
                stats
            }
        };
        if !current.is_empty() {
            blocks.push(current);
        }

        tracing::debug!(emitted = stats.emitted, blocks = blocks.len(), "results delivered");
        Ok(blocks)
    }
}
