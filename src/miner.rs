//! Session facade with the scripting-style API.
//!
//! A `Miner` starts in a loading state where compounds and activities
//! can be added. The first mining call freezes the store into a
//! [`MiningSession`]; from then on population calls fail with
//! [`MinerError::SessionFrozen`] until [`Miner::reset`].

use std::sync::Arc;

use tracing::info;

use crate::batch::{BatchMineResult, BatchMiner};
use crate::io::report::ActivityMap;
use crate::policy::{MiningPolicy, OutputMode, PolicyError, StructureClass};
use crate::search::{CancellationToken, MineError};
use crate::session::MiningSession;
use crate::sink::ResultSink;
use crate::store::{CompoundStore, InMemoryCompoundStore, StoreError};
use crate::types::{CompoundId, MiningResult, MolGraph};

/// Error type for facade operations.
#[derive(Debug, thiserror::Error)]
pub enum MinerError {
    /// Population failed.
    #[error(transparent)]
    Store(#[from] StoreError),
    /// Mining failed.
    #[error(transparent)]
    Mine(#[from] MineError),
    /// A setting was out of range.
    #[error(transparent)]
    Policy(#[from] PolicyError),
    /// The store is read-only once mining has started.
    #[error("Session is frozen; compounds and activities cannot change after mining started")]
    SessionFrozen,
    /// Registry hashing failed.
    #[error("Registry serialization failed: {0}")]
    Registry(#[from] serde_json::Error),
}

enum SessionState {
    Loading(InMemoryCompoundStore),
    Frozen(Arc<MiningSession<InMemoryCompoundStore>>),
}

/// Mining session facade.
pub struct Miner {
    state: SessionState,
    policy: MiningPolicy,
    sink: Option<Arc<dyn ResultSink>>,
    cancel: CancellationToken,
}

impl Default for Miner {
    fn default() -> Self {
        Self::new()
    }
}

impl Miner {
    /// Create an empty miner with the default policy.
    pub fn new() -> Self {
        Self::with_policy(MiningPolicy::default())
    }

    /// Create an empty miner with `policy`.
    pub fn with_policy(policy: MiningPolicy) -> Self {
        Self {
            state: SessionState::Loading(InMemoryCompoundStore::new()),
            policy,
            sink: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Attach the sink used in streamed mode.
    pub fn with_sink(mut self, sink: Arc<dyn ResultSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Replace the sink used in streamed mode.
    pub fn set_sink(&mut self, sink: Arc<dyn ResultSink>) {
        self.sink = Some(sink);
    }

    fn loading(&mut self) -> Result<&mut InMemoryCompoundStore, MinerError> {
        match &mut self.state {
            SessionState::Loading(store) => Ok(store),
            SessionState::Frozen(_) => Err(MinerError::SessionFrozen),
        }
    }

    fn session(&mut self) -> Arc<MiningSession<InMemoryCompoundStore>> {
        let session = match &mut self.state {
            SessionState::Frozen(session) => return Arc::clone(session),
            SessionState::Loading(store) => {
                let store = std::mem::take(store);
                info!(
                    compounds = store.count_compounds(),
                    labelled = store.count_labelled(),
                    "freezing compound store"
                );
                Arc::new(MiningSession::new(Arc::new(store)))
            }
        };
        self.state = SessionState::Frozen(Arc::clone(&session));
        session
    }

    /// Add a compound.
    pub fn add_compound(&mut self, id: impl Into<CompoundId>, graph: &MolGraph) -> Result<(), MinerError> {
        self.loading()?.add_compound(id.into(), graph)?;
        Ok(())
    }

    /// Attach an activity label to a compound.
    pub fn add_activity(&mut self, id: impl Into<CompoundId>, value: f64) -> Result<(), MinerError> {
        self.loading()?.add_activity(id.into(), value)?;
        Ok(())
    }

    /// Set the significance level. 0 reports every frequent pattern.
    pub fn set_chisq_sig(&mut self, level: f64) -> Result<(), MinerError> {
        self.policy.set_significance_level(level)?;
        Ok(())
    }

    /// Toggle extension of support-1 patterns.
    pub fn set_refine_singles(&mut self, refine_singles: bool) {
        self.policy.set_refine_singles(refine_singles);
    }

    /// Toggle streamed (console) output. Refused while block separators
    /// are on.
    pub fn set_console_out(&mut self, streamed: bool) {
        self.policy.set_output(if streamed {
            OutputMode::Streamed
        } else {
            OutputMode::Buffered
        });
    }

    /// Set the minimum number of supporting compounds.
    pub fn set_min_frequency(&mut self, min_frequency: usize) -> Result<(), MinerError> {
        self.policy.set_min_frequency(min_frequency)?;
        Ok(())
    }

    /// Restrict pattern shapes.
    pub fn set_structure(&mut self, structure: StructureClass) {
        self.policy.structure = structure;
    }

    /// Toggle the backbone filter.
    pub fn set_backbone(&mut self, backbone: bool) {
        self.policy.set_backbone(backbone);
    }

    /// Toggle statistical pruning.
    pub fn set_pruning(&mut self, pruning: bool) {
        self.policy.set_pruning(pruning);
    }

    /// Toggle the significance filter.
    pub fn set_chisq_active(&mut self, active: bool) {
        self.policy.set_significance_active(active);
    }

    /// Toggle regression mode.
    pub fn set_regression(&mut self, regression: bool) {
        self.policy.set_regression(regression);
    }

    /// Toggle dynamic upper bound pruning.
    pub fn set_dynamic_upper_bound(&mut self, dynamic: bool) {
        self.policy.set_dynamic_upper_bound(dynamic);
    }

    /// Toggle block separators in buffered results.
    pub fn set_bbrc_sep(&mut self, bbrc_sep: bool) {
        self.policy.set_bbrc_sep(bbrc_sep);
    }

    /// Current policy.
    pub fn policy(&self) -> &MiningPolicy {
        &self.policy
    }

    /// Token that cancels running mining calls.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Number of compounds.
    pub fn count_compounds(&self) -> usize {
        match &self.state {
            SessionState::Loading(store) => store.count_compounds(),
            SessionState::Frozen(session) => session.count_compounds(),
        }
    }

    /// Number of root nodes (distinct vertex labels).
    pub fn count_root_nodes(&self) -> usize {
        match &self.state {
            SessionState::Loading(store) => store.root_labels().len(),
            SessionState::Frozen(session) => session.count_root_nodes(),
        }
    }

    /// Activity labels of all compounds, for report rendering.
    pub fn activities(&self) -> ActivityMap {
        let collect = |store: &InMemoryCompoundStore| -> ActivityMap {
            store
                .all_compounds()
                .iter()
                .filter_map(|c| c.activity().map(|a| (c.id(), a)))
                .collect()
        };
        match &self.state {
            SessionState::Loading(store) => collect(store),
            SessionState::Frozen(session) => collect(session.store()),
        }
    }

    /// Mine one root. Freezes the store on first use.
    pub fn mine_root(&mut self, index: usize) -> Result<Vec<MiningResult>, MinerError> {
        let session = self.session();
        let sink = self.sink.as_deref();
        Ok(session.mine_root_with(index, &self.policy, sink, &self.cancel)?)
    }

    /// Mine one root into blocks split at search leaves. Freezes the
    /// store on first use.
    pub fn mine_root_blocks(&mut self, index: usize) -> Result<Vec<Vec<MiningResult>>, MinerError> {
        let session = self.session();
        Ok(session.mine_root_blocks(index, &self.policy)?)
    }

    /// Mine every root in parallel. Freezes the store on first use.
    pub fn mine_all(&mut self) -> Result<BatchMineResult, MinerError> {
        let session = self.session();
        let batch = BatchMiner::new(session, self.policy.clone());
        Ok(batch.mine_all(self.sink.as_deref(), &self.cancel)?)
    }

    /// Drop all compounds, activities and results; keep the policy.
    pub fn reset(&mut self) {
        self.state = SessionState::Loading(InMemoryCompoundStore::new());
        self.cancel.reset();
    }
}
