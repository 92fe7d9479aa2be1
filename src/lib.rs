//! # bbrc-miner
//!
//! Significant subgraph mining over labeled compound graphs.
//!
//! The miner answers one question:
//!
//! > Which substructures recur across a set of compounds and are
//! > statistically tied to their activity?
//!
//! ## Core Contract
//!
//! 1. Compounds (labeled undirected graphs) and activity labels are loaded
//!    into a store, which becomes read-only once mining starts
//! 2. Every distinct vertex label is a root; each root is mined
//!    independently by a depth-first extension search
//! 3. Each pattern is identified by its minimum DFS code and visited once
//! 4. Patterns are scored with a chi-square (or Kolmogorov-Smirnov) test,
//!    branches that cannot become significant are pruned, and only the
//!    boundary of each support class is reported (backbone refinement)
//!
//! ## Architecture
//!
//! ```text
//! MolGraph → CompoundStore → MiningSession → ExtensionSearch → MiningResult
//!                                 ↓                ↓
//!                            MiningPolicy   Occurrence / Canonical form
//!                                           Significance / Boundary filter
//! ```
//!
//! ## Determinism Guarantees
//!
//! - Roots are ordered by label value
//! - Children are visited in ascending canonical-code order
//! - Same store + same policy → identical result sequence per root

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod types;
pub mod policy;
pub mod store;
pub mod canonical;
pub mod canonical_form;
pub mod matcher;
pub mod occurrence;
pub mod stats;
pub mod significance;
pub mod bbrc;
pub mod search;
pub mod sink;
pub mod session;
pub mod batch;
pub mod miner;
pub mod io;

// Re-exports
pub use types::{
    Assessment, Compound, CompoundId, DfsCode, DfsEdge, Direction, EdgeLabel, GraphError,
    IndexedGraph, LabeledGraph, MiningResult, MolGraph, PatternRole, SupportSet, VertexLabel,
};
pub use policy::{MiningPolicy, OutputMode, PolicyError, SignificanceMode, StructureClass};
pub use store::{CompoundStore, InMemoryCompoundStore, StoreError};
pub use canonical::{to_canonical_bytes, canonical_hash, canonical_hash_hex};
pub use canonical_form::{canonical_code, canonical_form, CanonicalError, CanonicalForm};
pub use occurrence::{Embedding, Extension, Pattern};
pub use significance::{SignificanceError, SignificanceEvaluator};
pub use search::{CancellationToken, ExtensionSearch, MineError, RootNode, SearchEvent, SearchStats};
pub use sink::{CollectingSink, ResultSink, WriterSink};
pub use session::MiningSession;
pub use batch::{BatchMineResult, BatchMiner, RootOutcome, RootRegistry, RootRegistryEntry};
pub use miner::{Miner, MinerError};
pub use io::{read_activities, read_gsp, smarts, FormatError, ReportFormat, ReportWriter};

/// Schema version of serialized results.
/// Increment on breaking changes to any serialized type.
pub const MINER_SCHEMA_VERSION: &str = "1.0.0";

/// Default policy version identifier.
pub const DEFAULT_POLICY_VERSION: &str = "mining_policy_v1";
