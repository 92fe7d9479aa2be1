//! Core types for the miner.

pub mod compound;
pub mod dfs_code;
pub mod graph;
pub mod result;
pub mod support;

pub use compound::{Compound, CompoundId};
pub use dfs_code::{DfsCode, DfsEdge};
pub use graph::{Adjacent, EdgeLabel, GraphEdge, GraphError, IndexedGraph, LabeledGraph, MolGraph, VertexLabel};
pub use result::{Assessment, Direction, MiningResult, PatternRole};
pub use support::SupportSet;
