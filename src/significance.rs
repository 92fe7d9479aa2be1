//! Significance evaluator.
//!
//! Scores a pattern's supporting set against the activity labels.
//!
//! ## Classification
//!
//! Pearson chi-square on the 2x2 table (pattern present/absent x
//! active/inactive). For a pattern present in `a` actives and `b`
//! inactives out of `na` actives and `ni` inactives (`n = na + ni`,
//! `x = a + b`):
//!
//! ```text
//! chi(a, b) = n * (a*ni - b*na)^2 / (x * (n - x) * na * ni)
//! ```
//!
//! Descendants only lose supporting compounds, so their counts lie in
//! `[0, a] x [0, b]`. `chi` is convex there and its maximum sits on a
//! corner, which makes `max(chi(a, 0), chi(0, b), chi(a, b))` a sound
//! upper bound for every descendant.
//!
//! ## Dynamic bounds
//!
//! With dynamic upper bounds a branch must also be able to beat the best
//! statistic already seen on its path. Patterns cut this way may still be
//! significant themselves; only their descendants are skipped.
//!
//! ## Regression
//!
//! Two-sample Kolmogorov-Smirnov test of the pattern's activities against
//! all activities. The statistic is `1 - p`. No bound exists, so
//! regression never prunes.
//!
//! ## Unlabelled compounds
//!
//! Compounds without an activity count toward support but are left out
//! of every count above.

use crate::policy::{MiningPolicy, SignificanceMode};
use crate::stats::{chi_square_p_value, ks_two_sample};
use crate::store::CompoundStore;
use crate::types::{Assessment, CompoundId, Direction, SupportSet};

/// Error type for evaluator setup.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SignificanceError {
    /// The chi-square test needs labels 0 or 1.
    #[error("Compound {id} has activity {value}, classification needs 0 or 1")]
    NonBinaryActivity {
        /// The offending compound.
        id: CompoundId,
        /// Its activity.
        value: f64,
    },
}

#[derive(Debug, Clone)]
enum Background {
    Classification {
        /// Per store index: `Some(true)` active, `Some(false)` inactive.
        labels: Vec<Option<bool>>,
        actives: usize,
        inactives: usize,
    },
    Regression {
        /// Per store index activity.
        values: Vec<Option<f64>>,
        /// All activities, sorted.
        sorted: Vec<f64>,
        mean: f64,
    },
}

/// Scores supporting sets against the activity labels of one store.
#[derive(Debug, Clone)]
pub struct SignificanceEvaluator {
    background: Background,
    critical: f64,
    prunes: bool,
    dynamic: bool,
}

impl SignificanceEvaluator {
    /// Snapshot the labels of `store` under `policy`.
    pub fn new<S: CompoundStore>(store: &S, policy: &MiningPolicy) -> Result<Self, SignificanceError> {
        let background = match policy.significance.mode {
            SignificanceMode::Classification => {
                let mut labels = Vec::with_capacity(store.count_compounds());
                let (mut actives, mut inactives) = (0, 0);
                for (_, compound) in store.iter() {
                    let label = match compound.activity() {
                        None => None,
                        Some(v) if v == 1.0 => {
                            actives += 1;
                            Some(true)
                        }
                        Some(v) if v == 0.0 => {
                            inactives += 1;
                            Some(false)
                        }
                        Some(value) => {
                            return Err(SignificanceError::NonBinaryActivity { id: compound.id(), value })
                        }
                    };
                    labels.push(label);
                }
                Background::Classification { labels, actives, inactives }
            }
            SignificanceMode::Regression => {
                let values: Vec<Option<f64>> = store.iter().map(|(_, c)| c.activity()).collect();
                let mut sorted: Vec<f64> = values.iter().flatten().copied().collect();
                sorted.sort_by(f64::total_cmp);
                let mean = mean(&sorted);
                Background::Regression { values, sorted, mean }
            }
        };
        Ok(Self {
            background,
            critical: policy.critical_value(),
            prunes: policy.prunes(),
            dynamic: policy.prunes_dynamically(),
        })
    }

    /// Critical value a statistic must reach.
    pub fn critical_value(&self) -> f64 {
        self.critical
    }

    /// Score one supporting set.
    pub fn assess(&self, support: &SupportSet) -> Assessment {
        match &self.background {
            Background::Classification { labels, actives, inactives } => {
                let (mut a, mut b) = (0, 0);
                for index in support.iter() {
                    match labels.get(index).copied().flatten() {
                        Some(true) => a += 1,
                        Some(false) => b += 1,
                        None => {}
                    }
                }
                let table = Table { na: *actives, ni: *inactives };
                let statistic = table.chi(a, b);
                let upper_bound = table.chi(a, 0).max(table.chi(0, b)).max(statistic);
                let direction = if (a * table.ni) > (b * table.na) {
                    Direction::Activating
                } else {
                    Direction::Deactivating
                };
                Assessment {
                    statistic,
                    p_value: chi_square_p_value(statistic),
                    upper_bound,
                    significant: statistic >= self.critical,
                    direction,
                    labelled: a + b,
                    active: a,
                    inactive: b,
                }
            }
            Background::Regression { values, sorted, mean: overall } => {
                let mut sample: Vec<f64> = support
                    .iter()
                    .filter_map(|index| values.get(index).copied().flatten())
                    .collect();
                sample.sort_by(f64::total_cmp);
                let (_, p_value) = ks_two_sample(&sample, sorted);
                let statistic = 1.0 - p_value;
                let direction = if !sample.is_empty() && mean(&sample) > *overall {
                    Direction::Activating
                } else {
                    Direction::Deactivating
                };
                Assessment {
                    statistic,
                    p_value,
                    upper_bound: f64::INFINITY,
                    significant: statistic >= self.critical,
                    direction,
                    labelled: sample.len(),
                    active: 0,
                    inactive: 0,
                }
            }
        }
    }

    /// Whether the descendants of a pattern with this assessment can be
    /// skipped. `best` is the highest statistic on the path above it.
    pub fn prunes(&self, assessment: &Assessment, best: f64) -> bool {
        if !self.prunes {
            return false;
        }
        let threshold = if self.dynamic {
            self.critical.max(best).max(assessment.statistic)
        } else {
            self.critical
        };
        assessment.upper_bound < threshold
    }
}

#[derive(Debug, Clone, Copy)]
struct Table {
    na: usize,
    ni: usize,
}

impl Table {
    fn chi(&self, a: usize, b: usize) -> f64 {
        let (na, ni) = (self.na as f64, self.ni as f64);
        let n = na + ni;
        let x = (a + b) as f64;
        if self.na == 0 || self.ni == 0 || a + b == 0 || x >= n {
            return 0.0;
        }
        let diff = a as f64 * ni - b as f64 * na;
        n * diff * diff / (x * (n - x) * na * ni)
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
