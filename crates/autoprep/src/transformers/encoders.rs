//! Categorical encoders.
//!
//! Each encoder is fitted on one column and yields a fitted value that maps
//! values of that column (or any other column) onto numbers.

use polars::prelude::*;
use std::collections::{BTreeSet, HashMap};

use crate::error::{PreprocessingError, Result};
use crate::utils::{series_to_f64, series_to_strings};

// =============================================================================
// Frequency encoding
// =============================================================================

/// Encodes each value as its relative frequency in the fitted data.
///
/// Missing values count as a category of their own. Values never seen during
/// fit encode as 0.0.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrequencyEncoder;

#[derive(Debug, Clone)]
pub struct FittedFrequencyEncoder {
    frequencies: HashMap<Option<String>, f64>,
}

impl FrequencyEncoder {
    pub fn new() -> Self {
        Self
    }

    pub fn fit(self, series: &Series) -> Result<FittedFrequencyEncoder> {
        let values = series_to_strings(series)?;
        let total = values.len();

        let mut counts: HashMap<Option<String>, usize> = HashMap::new();
        for value in values {
            *counts.entry(value).or_insert(0) += 1;
        }

        let frequencies = counts
            .into_iter()
            .map(|(value, count)| (value, count as f64 / total as f64))
            .collect();

        Ok(FittedFrequencyEncoder { frequencies })
    }

    pub fn fit_transform(self, series: &Series) -> Result<Series> {
        self.fit(series)?.transform(series)
    }
}

impl FittedFrequencyEncoder {
    /// Frequency learned for `value`; `None` looks up the missing category.
    pub fn frequency(&self, value: Option<&str>) -> f64 {
        self.frequencies
            .get(&value.map(str::to_string))
            .copied()
            .unwrap_or(0.0)
    }

    pub fn transform(&self, series: &Series) -> Result<Series> {
        let encoded: Vec<f64> = series_to_strings(series)?
            .iter()
            .map(|v| self.frequency(v.as_deref()))
            .collect();
        Ok(Series::new(series.name().clone(), encoded))
    }
}

// =============================================================================
// Target mean encoding
// =============================================================================

/// Default number of observations at which a category's own mean and the
/// global mean weigh equally.
pub const DEFAULT_TARGET_SMOOTHING: f64 = 10.0;

/// Encodes each category as its target mean, shrunk toward the global mean.
///
/// The shrink weight is `1 / (1 + exp(-(count - smoothing)))`, so categories
/// seen far more than `smoothing` times keep their own mean. Rows with a
/// missing category or a missing target do not contribute to category means.
/// Unseen and missing categories encode as the global target mean.
#[derive(Debug, Clone, Copy)]
pub struct TargetMeanEncoder {
    smoothing: f64,
}

#[derive(Debug, Clone)]
pub struct FittedTargetMeanEncoder {
    global_mean: f64,
    mapping: HashMap<String, f64>,
}

impl Default for TargetMeanEncoder {
    fn default() -> Self {
        Self::new(DEFAULT_TARGET_SMOOTHING)
    }
}

impl TargetMeanEncoder {
    pub fn new(smoothing: f64) -> Self {
        Self { smoothing }
    }

    pub fn fit(self, series: &Series, target: &Series) -> Result<FittedTargetMeanEncoder> {
        if target.len() != series.len() {
            return Err(PreprocessingError::LengthMismatch {
                column: target.name().to_string(),
                expected: series.len(),
                found: target.len(),
            });
        }

        let categories = series_to_strings(series)?;
        let targets = series_to_f64(target)?;

        let valid_targets: Vec<f64> = targets.iter().flatten().copied().collect();
        let global_mean = if valid_targets.is_empty() {
            0.0
        } else {
            valid_targets.iter().sum::<f64>() / valid_targets.len() as f64
        };

        // category -> (sum, count)
        let mut groups: HashMap<String, (f64, usize)> = HashMap::new();
        for (category, y) in categories.into_iter().zip(targets) {
            if let (Some(category), Some(y)) = (category, y) {
                let entry = groups.entry(category).or_insert((0.0, 0));
                entry.0 += y;
                entry.1 += 1;
            }
        }

        let mapping = groups
            .into_iter()
            .map(|(category, (sum, count))| {
                let category_mean = sum / count as f64;
                let weight = 1.0 / (1.0 + (-(count as f64 - self.smoothing)).exp());
                let value = global_mean * (1.0 - weight) + category_mean * weight;
                (category, value)
            })
            .collect();

        Ok(FittedTargetMeanEncoder {
            global_mean,
            mapping,
        })
    }

    pub fn fit_transform(self, series: &Series, target: &Series) -> Result<Series> {
        self.fit(series, target)?.transform(series)
    }
}

impl FittedTargetMeanEncoder {
    pub fn global_mean(&self) -> f64 {
        self.global_mean
    }

    pub fn encode(&self, value: Option<&str>) -> f64 {
        value
            .and_then(|v| self.mapping.get(v))
            .copied()
            .unwrap_or(self.global_mean)
    }

    pub fn transform(&self, series: &Series) -> Result<Series> {
        let encoded: Vec<f64> = series_to_strings(series)?
            .iter()
            .map(|v| self.encode(v.as_deref()))
            .collect();
        Ok(Series::new(series.name().clone(), encoded))
    }
}

// =============================================================================
// One-hot encoding
// =============================================================================

/// Expands a column into one 0/1 column per observed category.
///
/// Categories are sorted ascending and output columns are named
/// `<column>__<category>`. A value not seen during fit, or a missing value,
/// produces a row of zeros.
#[derive(Debug, Clone, Copy, Default)]
pub struct OneHotEncoder;

#[derive(Debug, Clone)]
pub struct FittedOneHotEncoder {
    column: String,
    categories: Vec<String>,
}

impl OneHotEncoder {
    pub fn new() -> Self {
        Self
    }

    pub fn fit(self, series: &Series) -> Result<FittedOneHotEncoder> {
        let categories: BTreeSet<String> =
            series_to_strings(series)?.into_iter().flatten().collect();
        Ok(FittedOneHotEncoder {
            column: series.name().to_string(),
            categories: categories.into_iter().collect(),
        })
    }

    pub fn fit_transform(self, series: &Series) -> Result<Vec<Series>> {
        self.fit(series)?.transform(series)
    }
}

impl FittedOneHotEncoder {
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    pub fn feature_names(&self) -> Vec<String> {
        self.categories
            .iter()
            .map(|c| format!("{}__{}", self.column, c))
            .collect()
    }

    /// One indicator column per fitted category, in category order.
    pub fn transform(&self, series: &Series) -> Result<Vec<Series>> {
        let values = series_to_strings(series)?;

        let output = self
            .categories
            .iter()
            .zip(self.feature_names())
            .map(|(category, name)| {
                let indicator: Vec<f64> = values
                    .iter()
                    .map(|v| {
                        if v.as_deref() == Some(category.as_str()) {
                            1.0
                        } else {
                            0.0
                        }
                    })
                    .collect();
                Series::new(name.into(), indicator)
            })
            .collect();

        Ok(output)
    }
}
