//! Statistical imputation methods.
//!
//! Mean and median fills for numeric columns, most-frequent fill for
//! categorical ones.

use polars::prelude::*;
use tracing::debug;

use crate::error::Result;
use crate::profiler::{mean, median};
use crate::utils::{
    fill_numeric_nulls, fill_string_nulls, series_to_f64, series_to_strings, string_mode,
    valid_values,
};

/// Statistical imputation methods for filling missing values.
pub struct StatisticalImputer;

impl StatisticalImputer {
    /// Fill missing numeric values with the median of the rest.
    ///
    /// Non-numeric values are treated as missing. Output is Float64.
    pub fn fill_median(series: &Series) -> Result<Series> {
        Self::fill_numeric_with(series, "median", median)
    }

    /// Fill missing numeric values with the mean of the rest.
    pub fn fill_mean(series: &Series) -> Result<Series> {
        Self::fill_numeric_with(series, "mean", mean)
    }

    /// Fill missing values with the most frequent value.
    ///
    /// Ties resolve to the smallest value. Output is a String series; a
    /// column with no values at all is returned unchanged as strings.
    pub fn fill_most_frequent(series: &Series) -> Result<Series> {
        let values = series_to_strings(series)?;
        let Some(mode) = string_mode(&values) else {
            return Ok(Series::new(series.name().clone(), values));
        };

        debug!("Filling '{}' with most frequent value '{}'", series.name(), mode);
        Ok(Series::new(
            series.name().clone(),
            fill_string_nulls(&values, &mode),
        ))
    }

    /// Fill numeric column with a statistic of its valid values.
    ///
    /// A column with no valid values is filled with 0.0.
    fn fill_numeric_with(
        series: &Series,
        method: &str,
        statistic: fn(&[f64]) -> f64,
    ) -> Result<Series> {
        let values = series_to_f64(series)?;
        let valid = valid_values(&values);
        let fill_value = if valid.is_empty() {
            0.0
        } else {
            statistic(&valid)
        };

        debug!(
            "Filling '{}' with {}: {:.4}",
            series.name(),
            method,
            fill_value
        );
        Ok(Series::new(
            series.name().clone(),
            fill_numeric_nulls(&values, fill_value),
        ))
    }
}
