//! MiningPolicy v1: the immutable configuration of one mining run.
//!
//! ## Float Normalization for Deterministic Hashing
//!
//! Floats are quantized to integers before hashing to avoid cross-platform
//! serialization differences. The quantization factor is 1e6 (multiply by
//! 1,000,000 and round to i64).
//!
//! ## Integrity Constraints
//!
//! Some settings only make sense together. The setters keep them
//! consistent and log a notice whenever they adjust a related setting:
//!
//! - Refining singles forces a minimum frequency of 1
//! - Turning significance off turns backbone filtering, pruning and
//!   regression off
//! - Regression mode turns the backbone filter on and pruning off (no
//!   sound bound exists)
//! - Dynamic upper bound pruning needs the backbone filter and static
//!   pruning; losing either turns it off
//! - Backbone separators need static pruning without the backbone filter,
//!   and only buffered output carries them

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::canonical::canonical_hash_hex;
use crate::stats::chi_square_quantile;
use crate::DEFAULT_POLICY_VERSION;

/// Quantization factor for float normalization.
/// Floats are multiplied by this value and rounded to i64.
const FLOAT_QUANTIZATION_FACTOR: f64 = 1_000_000.0;

/// Default significance level for the chi-square test.
pub const DEFAULT_SIGNIFICANCE_LEVEL: f64 = 0.95;

/// Error type for invalid policy values.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PolicyError {
    /// Significance levels are probabilities.
    #[error("Significance level must lie in [0, 1], got {0}")]
    InvalidLevel(f64),
    /// Every pattern occurs in at least one compound.
    #[error("Minimum frequency must be at least 1")]
    ZeroFrequency,
}

/// Shape of the patterns the search may produce.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StructureClass {
    /// Unbranched chains.
    Paths,
    /// Acyclic patterns.
    Trees,
    /// Arbitrary connected patterns, rings included.
    #[default]
    Graphs,
}

impl StructureClass {
    /// Whether cycle-closing extensions are allowed.
    pub fn allows_cycles(self) -> bool {
        matches!(self, Self::Graphs)
    }

    /// Whether a new edge may grow out of a pattern vertex of this degree.
    pub fn allows_growth_at(self, degree: usize) -> bool {
        match self {
            Self::Paths => degree <= 1,
            Self::Trees | Self::Graphs => true,
        }
    }

    /// Map the numeric level used on the command line (1 paths, 2 trees,
    /// 3 graphs).
    pub fn from_level(level: u8) -> Option<Self> {
        match level {
            1 => Some(Self::Paths),
            2 => Some(Self::Trees),
            3 => Some(Self::Graphs),
            _ => None,
        }
    }
}

/// Statistical test applied to each pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignificanceMode {
    /// Chi-square test against binary activity labels.
    Classification,
    /// Kolmogorov-Smirnov test against real-valued activities.
    Regression,
}

/// Significance filter settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignificanceConfig {
    /// Whether patterns are tested at all.
    pub active: bool,
    /// Which test is used.
    pub mode: SignificanceMode,
    /// Significance level in [0, 1]. Level 0 admits every pattern.
    pub level: f64,
}

impl Default for SignificanceConfig {
    fn default() -> Self {
        Self {
            active: true,
            mode: SignificanceMode::Classification,
            level: DEFAULT_SIGNIFICANCE_LEVEL,
        }
    }
}

/// How results leave `mine_root`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Collected and returned as a vector.
    #[default]
    Buffered,
    /// Written to a sink as they are found.
    Streamed,
}

/// Quantized policy parameters for deterministic hashing.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct QuantizedPolicyParams {
    version: String,
    min_frequency: usize,
    structure: StructureClass,
    significance_active: bool,
    significance_mode: SignificanceMode,
    significance_level: i64,
    pruning: bool,
    dynamic_upper_bound: bool,
    backbone: bool,
    bbrc_sep: bool,
    refine_singles: bool,
    output: OutputMode,
}

/// Mining policy version 1.
///
/// ## Parameters
///
/// - `min_frequency`: Minimum number of supporting compounds
/// - `structure`: Paths, trees or general graphs
/// - `significance`: Test, level and on/off switch
/// - `pruning`: Cut branches whose statistic bound is below the critical value
/// - `dynamic_upper_bound`: Also cut branches whose bound cannot beat the
///   best statistic already seen on the current path
/// - `backbone`: Emit only closed or entry patterns of each support class
/// - `bbrc_sep`: Split buffered results into blocks at search leaves
/// - `refine_singles`: Extend patterns that occur in a single compound
/// - `output`: Buffered or streamed results
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MiningPolicy {
    /// Policy version identifier.
    pub version: String,
    /// Minimum number of supporting compounds.
    pub min_frequency: usize,
    /// Pattern shape.
    pub structure: StructureClass,
    /// Significance filter.
    pub significance: SignificanceConfig,
    /// Whether statistical pruning is enabled.
    pub pruning: bool,
    /// Whether pruning raises the threshold to the best statistic on the
    /// current path.
    pub dynamic_upper_bound: bool,
    /// Whether only boundary patterns are emitted.
    pub backbone: bool,
    /// Whether buffered results are split into blocks at search leaves.
    pub bbrc_sep: bool,
    /// Whether support-1 patterns are extended.
    pub refine_singles: bool,
    /// Result delivery mode.
    pub output: OutputMode,
}

impl MiningPolicy {
    /// Get the policy ID.
    pub fn policy_id(&self) -> &str {
        &self.version
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), PolicyError> {
        let level = self.significance.level;
        if !(0.0..=1.0).contains(&level) {
            return Err(PolicyError::InvalidLevel(level));
        }
        if self.min_frequency == 0 {
            return Err(PolicyError::ZeroFrequency);
        }
        Ok(())
    }

    /// Critical value of the test statistic.
    ///
    /// Classification uses the 1-df chi-square quantile of the level.
    /// Regression compares `1 - p` against the level directly.
    pub fn critical_value(&self) -> f64 {
        match self.significance.mode {
            SignificanceMode::Classification => chi_square_quantile(self.significance.level),
            SignificanceMode::Regression => self.significance.level,
        }
    }

    /// Set the significance level.
    pub fn set_significance_level(&mut self, level: f64) -> Result<(), PolicyError> {
        if !(0.0..=1.0).contains(&level) {
            return Err(PolicyError::InvalidLevel(level));
        }
        self.significance.level = level;
        Ok(())
    }

    /// Set the minimum frequency.
    pub fn set_min_frequency(&mut self, min_frequency: usize) -> Result<(), PolicyError> {
        if min_frequency == 0 {
            return Err(PolicyError::ZeroFrequency);
        }
        if self.refine_singles && min_frequency > 1 {
            warn!(min_frequency, "refine singles is on, keeping minimum frequency 1");
            return Ok(());
        }
        self.min_frequency = min_frequency;
        Ok(())
    }

    /// Toggle extension of support-1 patterns.
    pub fn set_refine_singles(&mut self, refine_singles: bool) {
        self.refine_singles = refine_singles;
        if refine_singles && self.min_frequency != 1 {
            info!(previous = self.min_frequency, "refine singles forces minimum frequency 1");
            self.min_frequency = 1;
        }
    }

    /// Toggle the significance filter.
    pub fn set_significance_active(&mut self, active: bool) {
        self.significance.active = active;
        if !active {
            if self.dynamic_upper_bound {
                info!("significance off, disabling dynamic upper bound pruning");
                self.dynamic_upper_bound = false;
            }
            if self.backbone {
                info!("significance off, disabling backbone filter");
                self.backbone = false;
            }
            if self.pruning {
                info!("significance off, disabling statistical pruning");
                self.set_pruning(false);
            }
            self.set_regression(false);
        }
    }

    /// Toggle regression mode.
    pub fn set_regression(&mut self, regression: bool) {
        self.significance.mode = if regression {
            SignificanceMode::Regression
        } else {
            SignificanceMode::Classification
        };
        if regression {
            if !self.backbone {
                info!("regression mode, enabling backbone filter");
                self.set_backbone(true);
            }
            if self.pruning {
                info!("regression mode, disabling statistical pruning");
                self.set_pruning(false);
            }
        }
    }

    /// Toggle statistical pruning.
    pub fn set_pruning(&mut self, pruning: bool) {
        if pruning && (!self.significance.active || self.significance.mode == SignificanceMode::Regression) {
            warn!("statistical pruning needs the chi-square test, ignoring");
            return;
        }
        if !pruning {
            if self.dynamic_upper_bound {
                info!("static pruning off, disabling dynamic upper bound pruning");
                self.dynamic_upper_bound = false;
            }
            if self.bbrc_sep {
                info!("static pruning off, disabling backbone separators");
                self.bbrc_sep = false;
            }
        }
        self.pruning = pruning;
    }

    /// Toggle the backbone filter.
    pub fn set_backbone(&mut self, backbone: bool) {
        if backbone && !self.significance.active {
            warn!("backbone filter needs significance testing, ignoring");
            return;
        }
        if !backbone && self.dynamic_upper_bound {
            info!("backbone filter off, disabling dynamic upper bound pruning");
            self.dynamic_upper_bound = false;
        }
        if backbone && self.bbrc_sep {
            info!("backbone filter on, disabling backbone separators");
            self.bbrc_sep = false;
        }
        self.backbone = backbone;
    }

    /// Toggle dynamic upper bound pruning.
    pub fn set_dynamic_upper_bound(&mut self, dynamic: bool) {
        if dynamic {
            if !self.backbone {
                warn!("dynamic upper bound pruning needs the backbone filter, ignoring");
                return;
            }
            if !self.significance.active {
                warn!("dynamic upper bound pruning needs significance testing, ignoring");
                return;
            }
            if !self.pruning {
                warn!("dynamic upper bound pruning needs statistical pruning, ignoring");
                return;
            }
        }
        self.dynamic_upper_bound = dynamic;
    }

    /// Toggle block separators between search leaves.
    pub fn set_bbrc_sep(&mut self, bbrc_sep: bool) {
        if bbrc_sep {
            if self.backbone {
                warn!("backbone separators need the backbone filter off, ignoring");
                return;
            }
            if !self.pruning {
                warn!("backbone separators need statistical pruning, ignoring");
                return;
            }
            if self.output == OutputMode::Streamed {
                info!("backbone separators on, switching to buffered output");
                self.output = OutputMode::Buffered;
            }
        }
        self.bbrc_sep = bbrc_sep;
    }

    /// Choose buffered or streamed results.
    pub fn set_output(&mut self, output: OutputMode) {
        if output == OutputMode::Streamed && self.bbrc_sep {
            warn!("streamed output cannot carry backbone separators, ignoring");
            return;
        }
        self.output = output;
    }

    /// Whether statistics are computed and used to filter.
    pub fn tests_significance(&self) -> bool {
        self.significance.active
    }

    /// Whether branches may be cut on their statistic bound.
    pub fn prunes(&self) -> bool {
        self.pruning
            && self.significance.active
            && self.significance.mode == SignificanceMode::Classification
    }

    /// Whether the pruning threshold follows the best statistic on the
    /// current path.
    pub fn prunes_dynamically(&self) -> bool {
        self.prunes() && self.dynamic_upper_bound && self.backbone
    }

    /// Whether the search marks leaves with block separators.
    pub fn separates_blocks(&self) -> bool {
        self.bbrc_sep && !self.backbone
    }

    /// Compute a hash of the policy parameters.
    ///
    /// Uses quantized float representation so equal policies hash equally
    /// regardless of float formatting.
    pub fn params_hash(&self) -> Result<String, serde_json::Error> {
        canonical_hash_hex(&self.to_quantized())
    }

    /// Convert to quantized representation for deterministic hashing.
    fn to_quantized(&self) -> QuantizedPolicyParams {
        QuantizedPolicyParams {
            version: self.version.clone(),
            min_frequency: self.min_frequency,
            structure: self.structure,
            significance_active: self.significance.active,
            significance_mode: self.significance.mode,
            significance_level: quantize_float(self.significance.level),
            pruning: self.pruning,
            dynamic_upper_bound: self.dynamic_upper_bound,
            backbone: self.backbone,
            bbrc_sep: self.bbrc_sep,
            refine_singles: self.refine_singles,
            output: self.output,
        }
    }

    /// Policy that reports every frequent pattern.
    pub fn unconstrained() -> Self {
        let mut policy = Self::default();
        policy.significance.level = 0.0;
        policy.set_backbone(false);
        policy.set_pruning(false);
        policy
    }
}

/// Quantize a float to an i64 for deterministic hashing.
fn quantize_float(value: f64) -> i64 {
    (value * FLOAT_QUANTIZATION_FACTOR).round() as i64
}

impl Default for MiningPolicy {
    fn default() -> Self {
        Self {
            version: DEFAULT_POLICY_VERSION.to_string(),
            min_frequency: 1,
            structure: StructureClass::default(),
            significance: SignificanceConfig::default(),
            pruning: true,
            dynamic_upper_bound: false,
            backbone: true,
            bbrc_sep: false,
            refine_singles: false,
            output: OutputMode::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_params_hash_determinism() {
        let policy1 = MiningPolicy::default();
        let policy2 = MiningPolicy::default();

        assert_eq!(policy1.params_hash().unwrap(), policy2.params_hash().unwrap());
    }

    #[test]
    fn test_policy_params_hash_changes() {
        let policy1 = MiningPolicy::default();
        let mut policy2 = MiningPolicy::default();
        policy2.set_significance_level(0.99).unwrap();

        assert_ne!(policy1.params_hash().unwrap(), policy2.params_hash().unwrap());
    }

    #[test]
    fn test_level_range() {
        let mut policy = MiningPolicy::default();
        assert_eq!(policy.set_significance_level(1.5), Err(PolicyError::InvalidLevel(1.5)));
        assert!(policy.set_significance_level(f64::NAN).is_err());
        assert_eq!(policy.significance.level, DEFAULT_SIGNIFICANCE_LEVEL);
        policy.significance.level = -0.1;
        assert!(policy.validate().is_err());
    }

    #[test]
    fn test_critical_value() {
        let mut policy = MiningPolicy::default();
        assert!((policy.critical_value() - 3.841459).abs() < 1e-3);
        policy.set_significance_level(0.0).unwrap();
        assert_eq!(policy.critical_value(), 0.0);
    }

    #[test]
    fn test_refine_singles_forces_frequency() {
        let mut policy = MiningPolicy::default();
        policy.set_min_frequency(3).unwrap();
        policy.set_refine_singles(true);
        assert_eq!(policy.min_frequency, 1);
        policy.set_min_frequency(2).unwrap();
        assert_eq!(policy.min_frequency, 1);
        assert_eq!(policy.set_min_frequency(0), Err(PolicyError::ZeroFrequency));
    }

    #[test]
    fn test_significance_off_disables_filters() {
        let mut policy = MiningPolicy::default();
        policy.set_significance_active(false);
        assert!(!policy.backbone);
        assert!(!policy.pruning);
        policy.set_backbone(true);
        assert!(!policy.backbone);
    }

    #[test]
    fn test_regression_never_prunes() {
        let mut policy = MiningPolicy::default();
        policy.set_regression(true);
        assert!(!policy.prunes());
        policy.set_pruning(true);
        assert!(!policy.prunes());
        policy.set_regression(false);
        policy.set_pruning(true);
        assert!(policy.prunes());
    }

    #[test]
    fn test_regression_restores_backbone() {
        let mut policy = MiningPolicy::default();
        policy.set_backbone(false);
        policy.set_regression(true);
        assert!(policy.backbone);
        assert!(!policy.pruning);
        assert_eq!(policy.significance.mode, SignificanceMode::Regression);
    }

    #[test]
    fn test_significance_off_leaves_regression() {
        let mut policy = MiningPolicy::default();
        policy.set_regression(true);
        policy.set_significance_active(false);
        assert_eq!(policy.significance.mode, SignificanceMode::Classification);
        assert!(!policy.backbone);
        assert!(!policy.pruning);
    }

    #[test]
    fn test_dynamic_upper_bound_couplings() {
        let mut policy = MiningPolicy::default();
        assert!(!policy.dynamic_upper_bound);
        policy.set_dynamic_upper_bound(true);
        assert!(policy.prunes_dynamically());

        policy.set_backbone(false);
        assert!(!policy.dynamic_upper_bound);
        policy.set_dynamic_upper_bound(true);
        assert!(!policy.dynamic_upper_bound);

        policy.set_backbone(true);
        policy.set_dynamic_upper_bound(true);
        policy.set_pruning(false);
        assert!(!policy.dynamic_upper_bound);
        policy.set_dynamic_upper_bound(true);
        assert!(!policy.dynamic_upper_bound);

        policy.set_pruning(true);
        policy.set_dynamic_upper_bound(true);
        policy.set_significance_active(false);
        assert!(!policy.dynamic_upper_bound);
    }

    #[test]
    fn test_bbrc_sep_couplings() {
        let mut policy = MiningPolicy::default();
        policy.set_bbrc_sep(true);
        assert!(!policy.bbrc_sep, "refused while the backbone filter is on");

        policy.set_backbone(false);
        policy.set_output(OutputMode::Streamed);
        policy.set_bbrc_sep(true);
        assert!(policy.separates_blocks());
        assert_eq!(policy.output, OutputMode::Buffered);
        policy.set_output(OutputMode::Streamed);
        assert_eq!(policy.output, OutputMode::Buffered);

        policy.set_backbone(true);
        assert!(!policy.bbrc_sep);

        policy.set_backbone(false);
        policy.set_bbrc_sep(true);
        policy.set_pruning(false);
        assert!(!policy.bbrc_sep);
        policy.set_bbrc_sep(true);
        assert!(!policy.bbrc_sep);
    }

    #[test]
    fn test_new_switches_change_params_hash() {
        let base = MiningPolicy::default();
        let mut dynamic = base.clone();
        dynamic.set_dynamic_upper_bound(true);
        assert_ne!(base.params_hash().unwrap(), dynamic.params_hash().unwrap());
    }

    #[test]
    fn test_default_variants() {
        assert_eq!(StructureClass::default(), StructureClass::Graphs);
        assert_eq!(OutputMode::default(), OutputMode::Buffered);
    }

    #[test]
    fn test_structure_levels() {
        assert_eq!(StructureClass::from_level(1), Some(StructureClass::Paths));
        assert_eq!(StructureClass::from_level(3), Some(StructureClass::Graphs));
        assert_eq!(StructureClass::from_level(0), None);
        assert!(StructureClass::Paths.allows_growth_at(1));
        assert!(!StructureClass::Paths.allows_growth_at(2));
        assert!(!StructureClass::Trees.allows_cycles());
    }

    #[test]
    fn test_serde_roundtrip() {
        let policy = MiningPolicy::unconstrained();
        let json = serde_json::to_string(&policy).unwrap();
        assert!(json.contains("\"graphs\""));
        let back: MiningPolicy = serde_json::from_str(&json).unwrap();
        assert_eq!(back, policy);
    }
}
