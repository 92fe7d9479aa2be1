//! Mining policy definitions.

pub mod v1;

pub use v1::{
    MiningPolicy, OutputMode, PolicyError, SignificanceConfig, SignificanceMode, StructureClass,
    DEFAULT_SIGNIFICANCE_LEVEL,
};
