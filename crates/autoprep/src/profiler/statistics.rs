//! Descriptive statistics for column profiling.

use polars::prelude::*;
use std::collections::BTreeMap;

use super::ColumnTypes;
use crate::error::Result;
use crate::types::{ColumnStatsEntry, ColumnType, DatasetStatsSummary, StatsSnapshot};
use crate::utils::{cardinality, missing_rate, series_to_f64, valid_values};

/// Per-column statistics in table column order.
///
/// Columns without an entry in `types` are profiled as categorical.
pub fn column_stats(df: &DataFrame, types: &ColumnTypes) -> Result<Vec<ColumnStatsEntry>> {
    let mut entries = Vec::with_capacity(df.width());

    for column in df.get_columns() {
        let series = column.as_materialized_series();
        let name = series.name().to_string();
        let column_type = types
            .get(&name)
            .copied()
            .unwrap_or(ColumnType::Categorical);

        let mut entry = ColumnStatsEntry::new(
            name,
            column_type,
            missing_rate(series)?,
            cardinality(series)?,
        );

        if column_type == ColumnType::Numeric {
            let values = valid_values(&series_to_f64(series)?);
            if !values.is_empty() {
                entry.mean = Some(mean(&values));
                entry.median = Some(median(&values));
                entry.std = Some(sample_std(&values));
                entry.skew = Some(sample_skewness(&values));
                entry.min = values.iter().copied().reduce(f64::min);
                entry.max = values.iter().copied().reduce(f64::max);
            }
        }

        entries.push(entry);
    }

    Ok(entries)
}

/// Dataset-level summary. `overall_missing_rate` is the mean per-column rate.
pub fn dataset_wide_stats(df: &DataFrame, types: &ColumnTypes) -> Result<DatasetStatsSummary> {
    let mut rate_sum = 0.0;
    let mut type_counts: BTreeMap<ColumnType, usize> = BTreeMap::new();

    for column in df.get_columns() {
        let series = column.as_materialized_series();
        rate_sum += missing_rate(series)?;
        let column_type = types
            .get(series.name().as_str())
            .copied()
            .unwrap_or(ColumnType::Categorical);
        *type_counts.entry(column_type).or_insert(0) += 1;
    }

    let overall_missing_rate = if df.width() == 0 || df.height() == 0 {
        0.0
    } else {
        rate_sum / df.width() as f64
    };

    Ok(DatasetStatsSummary {
        row_count: df.height(),
        column_count: df.width(),
        overall_missing_rate,
        type_counts,
    })
}

/// Both views together, as recorded before and after a run.
pub fn snapshot(df: &DataFrame, types: &ColumnTypes) -> Result<StatsSnapshot> {
    Ok(StatsSnapshot {
        dataset: dataset_wide_stats(df, types)?,
        columns: column_stats(df, types)?,
    })
}

// =============================================================================
// Moments and quantiles over plain slices
// =============================================================================

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub fn median(values: &[f64]) -> f64 {
    quantile(values, 0.5)
}

/// Standard deviation with Bessel's correction; 0.0 below two values.
pub fn sample_std(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    (ss / (n as f64 - 1.0)).sqrt()
}

/// Standard deviation over n (no correction).
pub fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    (ss / values.len() as f64).sqrt()
}

/// Moment coefficient of skewness `g1 = m3 / m2^1.5`.
///
/// Returns 0.0 with fewer than two values or zero variance.
pub fn population_skewness(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let m = mean(values);
    let m2 = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / n as f64;
    let m3 = values.iter().map(|v| (v - m).powi(3)).sum::<f64>() / n as f64;
    if m2 <= (f64::EPSILON * m).powi(2) {
        return 0.0;
    }
    m3 / m2.powf(1.5)
}

/// Adjusted Fisher-Pearson skewness `G1 = g1 * sqrt(n(n-1)) / (n-2)`.
///
/// With two values the sample is symmetric, so the result is 0.0.
pub fn sample_skewness(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 3 {
        return 0.0;
    }
    let n = n as f64;
    population_skewness(values) * (n * (n - 1.0)).sqrt() / (n - 2.0)
}

/// Quantile with linear interpolation between closest ranks.
///
/// `q` is clamped to [0, 1]. Returns NaN for an empty slice.
pub fn quantile(values: &[f64], q: f64) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let frac = pos - lower as f64;
    sorted[lower] + (sorted[upper] - sorted[lower]) * frac
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profiler::infer_types;
    use pretty_assertions::assert_eq;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    // ==================== Moment tests ====================

    #[test]
    fn test_mean_median() {
        assert!(approx(mean(&[1.0, 2.0, 3.0, 10.0]), 4.0));
        assert!(approx(median(&[1.0, 2.0, 3.0, 10.0]), 2.5));
        assert!(approx(median(&[5.0, 1.0, 3.0]), 3.0));
    }

    #[test]
    fn test_std_variants() {
        let values = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert!(approx(population_std(&values), 2.0));
        assert!(approx(sample_std(&values), (32.0f64 / 7.0).sqrt()));
        assert_eq!(sample_std(&[3.0]), 0.0);
    }

    #[test]
    fn test_skewness_symmetric_is_zero() {
        assert!(approx(population_skewness(&[1.0, 2.0, 3.0, 4.0, 5.0]), 0.0));
        assert!(approx(sample_skewness(&[1.0, 2.0, 3.0, 4.0, 5.0]), 0.0));
    }

    #[test]
    fn test_skewness_small_and_constant_inputs() {
        assert_eq!(population_skewness(&[]), 0.0);
        assert_eq!(population_skewness(&[4.0]), 0.0);
        assert_eq!(sample_skewness(&[1.0, 9.0]), 0.0);
        assert_eq!(population_skewness(&[7.0, 7.0, 7.0]), 0.0);
    }

    #[test]
    fn test_skewness_right_tail_is_positive() {
        let values = [1.0, 1.0, 1.0, 1.0, 100.0];
        let g1 = population_skewness(&values);
        assert!(g1 > 1.0);
        // The adjusted estimator is larger in magnitude for small n.
        assert!(sample_skewness(&values) > g1);
    }

    #[test]
    fn test_quantile_linear_interpolation() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 100.0];
        assert!(approx(quantile(&values, 0.25), 2.25));
        assert!(approx(quantile(&values, 0.75), 4.75));
        assert!(quantile(&[], 0.5).is_nan());
    }

    // ==================== Column stats tests ====================

    #[test]
    fn test_column_stats_numeric_and_categorical() {
        let df = df![
            "age" => [Some(20.0), Some(30.0), None, Some(40.0), Some(30.0)],
            "city" => [Some("a"), Some("b"), Some("a"), None, Some("a")],
        ]
        .unwrap();
        let types = infer_types(&df).unwrap();
        let stats = column_stats(&df, &types).unwrap();

        let age = &stats[0];
        assert_eq!(age.column_type, ColumnType::Numeric);
        assert!(approx(age.missing_rate, 0.2));
        assert_eq!(age.cardinality, 3);
        assert!(approx(age.mean.unwrap(), 30.0));
        assert!(approx(age.median.unwrap(), 30.0));
        assert_eq!(age.min, Some(20.0));
        assert_eq!(age.max, Some(40.0));

        let city = &stats[1];
        assert_eq!(city.column_type, ColumnType::Categorical);
        assert_eq!(city.cardinality, 2);
        assert!(city.mean.is_none());
        assert!(city.skew.is_none());
    }

    #[test]
    fn test_column_stats_all_missing_numeric() {
        let df = df!["x" => [None::<f64>, None, None]].unwrap();
        let mut types = ColumnTypes::new();
        types.insert("x".to_string(), ColumnType::Numeric);
        let stats = column_stats(&df, &types).unwrap();

        assert_eq!(stats[0].missing_rate, 1.0);
        assert!(stats[0].mean.is_none());
        assert!(stats[0].median.is_none());
        assert!(stats[0].std.is_none());
        assert!(stats[0].skew.is_none());
    }

    #[test]
    fn test_column_stats_is_idempotent() {
        let df = df![
            "score" => [1.0, 2.0, 2.0, 8.0, 2.0, 1.0],
            "group" => ["x", "y", "x", "x", "y", "x"],
        ]
        .unwrap();
        let types = infer_types(&df).unwrap();
        let first = column_stats(&df, &types).unwrap();
        let second = column_stats(&df, &types).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_dataset_wide_stats() {
        let df = df![
            "a" => [Some(1.0), None, Some(1.5), Some(1.0)],
            "b" => [Some("x"), Some("y"), Some("x"), Some("y")],
        ]
        .unwrap();
        let types = infer_types(&df).unwrap();
        let summary = dataset_wide_stats(&df, &types).unwrap();

        assert_eq!(summary.row_count, 4);
        assert_eq!(summary.column_count, 2);
        assert!(approx(summary.overall_missing_rate, 0.125));
        assert_eq!(summary.type_counts.get(&ColumnType::Numeric), Some(&1));
        assert_eq!(summary.type_counts.get(&ColumnType::Categorical), Some(&1));
    }
}
