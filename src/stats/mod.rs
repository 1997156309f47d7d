//! Aggregation over logged trials
//!
//! Reads a slice of [`InteractionRecord`]s, independent of any live trial:
//!
//! - [`compute_summary`]: count / mean / min / max / standard deviation per
//!   condition. Conditions without records are absent, never zero-filled.
//! - [`compute_significance`]: Welch's unequal-variance t-test between the
//!   two conditions, gated by a minimum total sample size.
//!
//! ## Example
//!
//! ```rust
//! use chart_ab::stats::{compute_significance, compute_summary, Significance, SignificancePolicy};
//!
//! let summary = compute_summary(&[]);
//! assert!(summary.is_empty());
//!
//! let result = compute_significance(&[], &SignificancePolicy::default());
//! assert!(matches!(result, Significance::Unavailable(_)));
//! ```

mod distribution;

pub use distribution::{ln_gamma, regularized_incomplete_beta, student_t_two_sided_p};

use crate::experiment::{Condition, InteractionRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Descriptive statistics of one condition's response times.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConditionSummary {
    /// Number of records (always > 0)
    pub count: usize,
    /// Mean seconds
    pub mean: f64,
    /// Fastest response
    pub min: f64,
    /// Slowest response
    pub max: f64,
    /// Sample standard deviation (n - 1); `None` for a single record
    pub std_dev: Option<f64>,
}

impl ConditionSummary {
    /// Summarize a non-empty set of values.
    #[must_use]
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        let n = count_f64(values.len());
        let mean = values.iter().sum::<f64>() / n;
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        Some(Self {
            count: values.len(),
            mean,
            min,
            max,
            std_dev: sample_variance(values, mean).map(f64::sqrt),
        })
    }

    /// Sample variance (n - 1), `None` for a single record.
    #[must_use]
    pub fn variance(&self) -> Option<f64> {
        self.std_dev.map(|sd| sd * sd)
    }
}

/// Per-condition summaries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    by_condition: BTreeMap<Condition, ConditionSummary>,
}

impl Summary {
    /// Statistics for one condition, if it has records.
    #[must_use]
    pub fn get(&self, condition: Condition) -> Option<&ConditionSummary> {
        self.by_condition.get(&condition)
    }

    /// True if no condition has records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_condition.is_empty()
    }

    /// Number of conditions represented.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_condition.len()
    }

    /// Total records across conditions.
    #[must_use]
    pub fn total(&self) -> usize {
        self.by_condition.values().map(|s| s.count).sum()
    }

    /// Represented conditions in [`Condition::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = (Condition, &ConditionSummary)> {
        self.by_condition.iter().map(|(c, s)| (*c, s))
    }
}

/// Group response times by condition.
#[must_use]
pub fn compute_summary(records: &[InteractionRecord]) -> Summary {
    let by_condition = group_by_condition(records)
        .into_iter()
        .filter_map(|(condition, values)| {
            ConditionSummary::from_values(&values).map(|summary| (condition, summary))
        })
        .collect();
    Summary { by_condition }
}

/// Thresholds for significance testing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignificancePolicy {
    /// Testing requires strictly more than this many records in total
    pub min_total_samples: usize,
    /// p-values below this are labelled significant
    pub alpha: f64,
}

impl Default for SignificancePolicy {
    fn default() -> Self {
        Self {
            min_total_samples: 20,
            alpha: 0.05,
        }
    }
}

/// Why a test could not be computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnavailableReason {
    /// A condition has no records
    MissingCondition(Condition),
    /// A condition has one record, so its variance is undefined
    SingleSample(Condition),
    /// Every record in both conditions has the same value
    ZeroVariance,
}

/// Welch's t-test result. `t_statistic` is `mean(Violin) - mean(Pair)` over
/// its standard error.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WelchTest {
    /// t statistic
    pub t_statistic: f64,
    /// Welch–Satterthwaite degrees of freedom
    pub degrees_of_freedom: f64,
    /// Two-sided p-value
    pub p_value: f64,
    /// Threshold used for the label
    pub alpha: f64,
}

impl WelchTest {
    /// Compute from two groups' summaries.
    fn from_summaries(
        first: (Condition, &ConditionSummary),
        second: (Condition, &ConditionSummary),
        alpha: f64,
    ) -> Result<Self, UnavailableReason> {
        let var1 = first.1.variance().ok_or(UnavailableReason::SingleSample(first.0))?;
        let var2 = second.1.variance().ok_or(UnavailableReason::SingleSample(second.0))?;
        let n1 = count_f64(first.1.count);
        let n2 = count_f64(second.1.count);

        let se1 = var1 / n1;
        let se2 = var2 / n2;
        let se_sum = se1 + se2;
        if se_sum <= 0.0 {
            return Err(UnavailableReason::ZeroVariance);
        }

        let t_statistic = (first.1.mean - second.1.mean) / se_sum.sqrt();
        let degrees_of_freedom =
            se_sum * se_sum / (se1 * se1 / (n1 - 1.0) + se2 * se2 / (n2 - 1.0));
        Ok(Self {
            t_statistic,
            degrees_of_freedom,
            p_value: student_t_two_sided_p(t_statistic, degrees_of_freedom),
            alpha,
        })
    }

    /// Whether `p_value < alpha`.
    #[must_use]
    pub fn is_significant(&self) -> bool {
        self.p_value < self.alpha
    }

    /// Interpretive label shown next to the statistic.
    #[must_use]
    pub fn label(&self) -> &'static str {
        if self.is_significant() {
            "statistically significant"
        } else {
            "not statistically significant"
        }
    }
}

/// Outcome of [`compute_significance`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Significance {
    /// Test computed
    Computed(WelchTest),
    /// Test not computable from the groups present
    Unavailable(UnavailableReason),
    /// Too few records overall for a stable estimate
    InsufficientData {
        /// Records available
        total: usize,
        /// Records required (strictly more than this)
        required: usize,
    },
}

impl Significance {
    /// The computed test, if any.
    #[must_use]
    pub const fn test(&self) -> Option<&WelchTest> {
        match self {
            Self::Computed(test) => Some(test),
            _ => None,
        }
    }
}

impl fmt::Display for Significance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Computed(test) => write!(
                f,
                "Welch's t-test: t = {:.4}, df = {:.2}, p = {:.4} ({} at alpha = {})",
                test.t_statistic,
                test.degrees_of_freedom,
                test.p_value,
                test.label(),
                test.alpha
            ),
            Self::Unavailable(UnavailableReason::MissingCondition(c)) => {
                write!(f, "Significance test unavailable: no '{c}' trials recorded yet")
            }
            Self::Unavailable(UnavailableReason::SingleSample(c)) => write!(
                f,
                "Significance test unavailable: only one '{c}' trial recorded"
            ),
            Self::Unavailable(UnavailableReason::ZeroVariance) => write!(
                f,
                "Significance test unavailable: response times have no variance"
            ),
            Self::InsufficientData { total, required } => write!(
                f,
                "Insufficient data: {total} trials recorded, more than {required} needed"
            ),
        }
    }
}

/// Welch's t-test between the two conditions.
///
/// Checked in order: a condition without records gives `Unavailable`; a
/// total at or below `policy.min_total_samples` gives `InsufficientData`;
/// a single-record group or zero pooled variance gives `Unavailable`.
#[must_use]
pub fn compute_significance(
    records: &[InteractionRecord],
    policy: &SignificancePolicy,
) -> Significance {
    let summary = compute_summary(records);
    let [first, second] = Condition::ALL;

    let Some(a) = summary.get(first) else {
        return Significance::Unavailable(UnavailableReason::MissingCondition(first));
    };
    let Some(b) = summary.get(second) else {
        return Significance::Unavailable(UnavailableReason::MissingCondition(second));
    };

    let total = summary.total();
    if total <= policy.min_total_samples {
        return Significance::InsufficientData {
            total,
            required: policy.min_total_samples,
        };
    }

    match WelchTest::from_summaries((first, a), (second, b), policy.alpha) {
        Ok(test) => Significance::Computed(test),
        Err(reason) => Significance::Unavailable(reason),
    }
}

fn group_by_condition(records: &[InteractionRecord]) -> BTreeMap<Condition, Vec<f64>> {
    let mut groups: BTreeMap<Condition, Vec<f64>> = BTreeMap::new();
    for record in records {
        groups
            .entry(record.condition())
            .or_default()
            .push(record.elapsed_seconds());
    }
    groups
}

fn sample_variance(values: &[f64], mean: f64) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    Some(ss / count_f64(values.len() - 1))
}

#[allow(clippy::cast_precision_loss)]
fn count_f64(n: usize) -> f64 {
    n as f64
}
