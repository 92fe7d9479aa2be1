//! Parallel mining across all roots.
//!
//! Roots share nothing but the read-only store, so each is mined on its
//! own rayon task. Outcomes are collected in root-index order and
//! summarized in a registry of per-root fingerprints.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::canonical::canonical_hash_hex;
use crate::policy::MiningPolicy;
use crate::search::{CancellationToken, MineError};
use crate::session::MiningSession;
use crate::sink::ResultSink;
use crate::store::CompoundStore;
use crate::types::{CompoundId, DfsCode, MiningResult, VertexLabel};

/// Outcome of mining one root.
#[derive(Debug)]
pub struct RootOutcome {
    /// Root index.
    pub root: usize,
    /// Root label.
    pub label: VertexLabel,
    /// Buffered results, or the error that stopped this root.
    pub results: Result<Vec<MiningResult>, MineError>,
}

/// Result of a batch run.
#[derive(Debug)]
pub struct BatchMineResult {
    /// Policy ID used for mining.
    pub policy_id: String,
    /// Policy parameters hash.
    pub policy_params_hash: String,
    /// Per-root outcomes in root-index order.
    pub outcomes: Vec<RootOutcome>,
    /// Registry of per-root fingerprints.
    pub registry: RootRegistry,
}

impl BatchMineResult {
    /// All successful results, concatenated in root order.
    pub fn results(&self) -> impl Iterator<Item = &MiningResult> {
        self.outcomes
            .iter()
            .filter_map(|o| o.results.as_ref().ok())
            .flatten()
    }

    /// Roots that failed.
    pub fn failures(&self) -> impl Iterator<Item = (usize, &MineError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.results.as_ref().err().map(|e| (o.root, e)))
    }
}

/// Registry of all roots in a batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RootRegistry {
    /// Individual root entries.
    pub entries: Vec<RootRegistryEntry>,
    /// Hash of the registry for integrity verification.
    pub registry_hash: String,
}

/// Metadata for a single root in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootRegistryEntry {
    /// Root index.
    pub root: usize,
    /// Root label.
    pub label: VertexLabel,
    /// Number of results.
    pub pattern_count: usize,
    /// Fingerprint of the result list, empty when the root failed.
    pub fingerprint: String,
    /// Error message when the root failed.
    pub error: Option<String>,
    /// Hash of policy parameters.
    pub policy_params_hash: String,
}

impl RootRegistry {
    /// Create a new registry from entries.
    pub fn new(entries: Vec<RootRegistryEntry>) -> Result<Self, serde_json::Error> {
        let registry_hash = canonical_hash_hex(&entries)?;
        Ok(Self {
            entries,
            registry_hash,
        })
    }

    /// Get entry by root index.
    pub fn get(&self, root: usize) -> Option<&RootRegistryEntry> {
        self.entries.iter().find(|e| e.root == root)
    }
}

/// Fingerprint of a result list: codes and supporting compounds, in
/// order. Statistics are left out so the fingerprint is float-free.
pub fn fingerprint(results: &[MiningResult]) -> Result<String, serde_json::Error> {
    let digest: Vec<(&DfsCode, &[CompoundId], bool)> = results
        .iter()
        .map(|r| (&r.code, r.compounds.as_slice(), r.closed))
        .collect();
    canonical_hash_hex(&digest)
}

/// Batch miner for all roots of a session.
pub struct BatchMiner<S: CompoundStore + 'static> {
    session: Arc<MiningSession<S>>,
    policy: MiningPolicy,
}

impl<S: CompoundStore + 'static> BatchMiner<S> {
    /// Create a new batch miner.
    pub fn new(session: Arc<MiningSession<S>>, policy: MiningPolicy) -> Self {
        Self { session, policy }
    }

    /// Mine every root in parallel.
    ///
    /// A failing root does not stop the others; its error is recorded in
    /// its outcome and registry entry. Returns an error only if hashing
    /// the registry fails.
    pub fn mine_all(
        &self,
        sink: Option<&dyn ResultSink>,
        cancel: &CancellationToken,
    ) -> Result<BatchMineResult, serde_json::Error> {
        let policy_params_hash = self.policy.params_hash()?;
        let roots: Vec<_> = self.session.roots().collect();

        let outcomes: Vec<RootOutcome> = roots
            .par_iter()
            .map(|root| RootOutcome {
                root: root.index,
                label: root.label,
                results: self.session.mine_root_with(root.index, &self.policy, sink, cancel),
            })
            .collect();

        let mut entries = Vec::with_capacity(outcomes.len());
        for outcome in &outcomes {
            let (pattern_count, fingerprint, error) = match &outcome.results {
                Ok(results) => (results.len(), fingerprint(results)?, None),
                Err(e) => (0, String::new(), Some(e.to_string())),
            };
            entries.push(RootRegistryEntry {
                root: outcome.root,
                label: outcome.label,
                pattern_count,
                fingerprint,
                error,
                policy_params_hash: policy_params_hash.clone(),
            });
        }
        let registry = RootRegistry::new(entries)?;

        Ok(BatchMineResult {
            policy_id: self.policy.policy_id().to_string(),
            policy_params_hash,
            outcomes,
            registry,
        })
    }

    /// Get the policy being used.
    pub fn policy(&self) -> &MiningPolicy {
        &self.policy
    }
}
