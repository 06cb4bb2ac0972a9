//! # Aggregate Metrics
//!
//! Count, sum, min and max per numeric field, keyed by the field path with
//! subscripts removed so every occurrence of an OCCURS item folds into one
//! entry. All arithmetic is exact on [`ScaledDecimal`]; a sum that would
//! overflow `i128` is an error rather than a wrapped value.
//!
//! The running sum is bounded by `i128` in the unscaled digits, about
//! 1.7 × 10^38. A field of 18 digits needs more than 10^20 maximal values to
//! reach it; a field of the maximum 31 digits reaches it after roughly
//! 1.7 × 10^7 maximal values, and such a build fails with
//! [`ManifestError::Metric`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use pop_core::ScaledDecimal;
use pop_decode::CanonicalRecord;
use pop_schema::base_path;

use crate::error::ManifestError;

/// Running aggregate for one field path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldMetrics {
    /// Values observed.
    pub count: u64,
    /// Exact sum.
    pub sum: ScaledDecimal,
    /// Smallest value.
    pub min: ScaledDecimal,
    /// Largest value.
    pub max: ScaledDecimal,
}

impl FieldMetrics {
    fn first(value: ScaledDecimal) -> Self {
        Self {
            count: 1,
            sum: value,
            min: value,
            max: value,
        }
    }

    fn observe(&mut self, path: &str, value: ScaledDecimal) -> Result<(), ManifestError> {
        let metric_error = |reason: &str| ManifestError::Metric {
            path: path.to_string(),
            reason: reason.to_string(),
        };
        if value.scale != self.sum.scale {
            return Err(metric_error("scale differs between occurrences"));
        }
        self.sum = self.sum.checked_add(&value).ok_or_else(|| metric_error("sum exceeds the 128-bit accumulator"))?;
        self.count += 1;
        if value.scaled < self.min.scaled {
            self.min = value;
        }
        if value.scaled > self.max.scaled {
            self.max = value;
        }
        Ok(())
    }
}

/// Metrics keyed by subscript-free field path.
pub type Metrics = BTreeMap<String, FieldMetrics>;

/// Folds numeric values of successive records into [`Metrics`].
#[derive(Debug, Clone, Default)]
pub struct MetricsAccumulator {
    metrics: Metrics,
}

impl MetricsAccumulator {
    /// An accumulator with no observations.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold every numeric value of `record`.
    pub fn observe(&mut self, record: &CanonicalRecord) -> Result<(), ManifestError> {
        let mut outcome = Ok(());
        record.for_each_leaf(|path, value| {
            if outcome.is_err() {
                return;
            }
            let Some(scaled) = value.as_scaled() else {
                return;
            };
            let key = base_path(path);
            outcome = match self.metrics.get_mut(&key) {
                Some(entry) => entry.observe(&key, scaled),
                None => {
                    self.metrics.insert(key, FieldMetrics::first(scaled));
                    Ok(())
                }
            };
        });
        outcome
    }

    /// The metrics folded so far.
    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }

    /// Consume the accumulator.
    pub fn finish(self) -> Metrics {
        self.metrics
    }
}
