use polars::prelude::*;
use tracing::debug;

use crate::error::{PreprocessingError, Result};
use crate::profiler::mean;
use crate::utils::{series_to_f64, valid_values};

/// Fills missing values from the k most similar rows.
///
/// Similarity is measured over a set of context columns (the other numeric
/// features of the table). Distances use a normalized Euclidean metric over
/// the context values both rows share, and neighbors are weighted by inverse
/// distance. When no candidate shares any context value with the row being
/// filled, the column mean is used instead.
pub struct KNNImputer {
    n_neighbors: usize,
}

impl KNNImputer {
    /// Create a new KNN imputer with specified number of neighbors
    pub fn new(n_neighbors: usize) -> Self {
        Self {
            n_neighbors: n_neighbors.max(1), // Ensure at least 1 neighbor
        }
    }

    /// Impute `series` using the columns of `context` as features.
    ///
    /// `context` must have the same height as `series`; it may be empty, in
    /// which case every gap is filled with the column mean. The output is a
    /// Float64 series with the input's name and no missing values.
    pub fn impute(&self, series: &Series, context: &DataFrame) -> Result<Series> {
        if context.width() > 0 && context.height() != series.len() {
            return Err(PreprocessingError::LengthMismatch {
                column: series.name().to_string(),
                expected: series.len(),
                found: context.height(),
            });
        }

        let target = series_to_f64(series)?;
        let features = create_feature_matrix(context)?;
        let imputed = self.impute_values(&target, &features);
        Ok(Series::new(series.name().clone(), imputed))
    }

    /// Impute over plain buffers. `features[row][col]` holds context values.
    pub fn impute_values(&self, target: &[Option<f64>], features: &[Vec<Option<f64>>]) -> Vec<f64> {
        let fallback = column_mean(target);
        let candidate_rows: Vec<usize> = (0..target.len())
            .filter(|&row| target[row].is_some())
            .collect();

        let missing = target.iter().filter(|v| v.is_none()).count();
        if missing > 0 {
            debug!(
                "KNN imputing {} values from {} candidate rows",
                missing,
                candidate_rows.len()
            );
        }

        target
            .iter()
            .enumerate()
            .map(|(row_idx, value)| match value {
                Some(v) => *v,
                None => self.impute_value(target, features, row_idx, &candidate_rows, fallback),
            })
            .collect()
    }

    /// Impute a single missing value using KNN
    fn impute_value(
        &self,
        target: &[Option<f64>],
        features: &[Vec<Option<f64>>],
        row_idx: usize,
        candidate_rows: &[usize],
        fallback: f64,
    ) -> f64 {
        let Some(row_features) = features.get(row_idx) else {
            return fallback;
        };

        // Calculate distances to all candidate rows
        let mut distances: Vec<(usize, f64)> = candidate_rows
            .iter()
            .filter_map(|&candidate| {
                features
                    .get(candidate)
                    .map(|other| (candidate, calculate_distance(row_features, other)))
            })
            .collect();

        // Sort by distance (ascending)
        distances.sort_by(|a, b| a.1.total_cmp(&b.1));

        let mut weighted_sum = 0.0;
        let mut weight_sum = 0.0;

        for &(neighbor_row, distance) in distances.iter().take(self.n_neighbors) {
            let Some(value) = target[neighbor_row] else {
                continue;
            };
            if !distance.is_finite() {
                continue;
            }

            // Use inverse distance as weight (avoiding division by zero)
            let weight = if distance < 1e-10 {
                1e10 // Very close neighbor gets very high weight
            } else {
                1.0 / distance
            };

            weighted_sum += value * weight;
            weight_sum += weight;
        }

        if weight_sum > 0.0 {
            weighted_sum / weight_sum
        } else {
            fallback
        }
    }
}

/// Row-major matrix of the context columns.
fn create_feature_matrix(context: &DataFrame) -> Result<Vec<Vec<Option<f64>>>> {
    let n_rows = context.height();
    let n_cols = context.width();
    let mut matrix = vec![vec![None; n_cols]; n_rows];

    for (col_idx, column) in context.get_columns().iter().enumerate() {
        let values = series_to_f64(column.as_materialized_series())?;
        for (row, value) in matrix.iter_mut().zip(values) {
            row[col_idx] = value;
        }
    }

    Ok(matrix)
}

/// Normalized Euclidean distance over features present in both rows.
fn calculate_distance(row1: &[Option<f64>], row2: &[Option<f64>]) -> f64 {
    let mut sum_squared_diff = 0.0;
    let mut count = 0;

    for (a, b) in row1.iter().zip(row2) {
        if let (Some(val1), Some(val2)) = (a, b) {
            let diff = val1 - val2;
            sum_squared_diff += diff * diff;
            count += 1;
        }
    }

    if count > 0 {
        (sum_squared_diff / count as f64).sqrt()
    } else {
        f64::INFINITY // No common non-null features
    }
}

fn column_mean(values: &[Option<f64>]) -> f64 {
    let valid = valid_values(values);
    if valid.is_empty() { 0.0 } else { mean(&valid) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn floats(series: &Series) -> Vec<f64> {
        series.f64().unwrap().into_iter().flatten().collect()
    }

    // ==================== KNNImputer::new() tests ====================

    #[test]
    fn test_knn_imputer_new_with_valid_neighbors() {
        let imputer = KNNImputer::new(5);
        assert_eq!(imputer.n_neighbors, 5);
    }

    #[test]
    fn test_knn_imputer_new_with_zero_neighbors_defaults_to_one() {
        let imputer = KNNImputer::new(0);
        assert_eq!(imputer.n_neighbors, 1);
    }

    // ==================== impute() tests ====================

    #[test]
    fn test_impute_uses_nearest_rows() {
        let imputer = KNNImputer::new(2);
        let target = Series::new(
            "income".into(),
            &[Some(10.0), Some(20.0), None, Some(40.0), Some(50.0)],
        );
        let context = df!["age" => [1.0, 2.0, 3.0, 4.0, 5.0]].unwrap();

        let result = imputer.impute(&target, &context).unwrap();
        assert_eq!(result.null_count(), 0);

        // Rows 1 and 3 are equally close: (20 + 40) / 2
        let values = floats(&result);
        assert!((values[2] - 30.0).abs() < 1e-9);
        assert_eq!(values[0], 10.0);
    }

    #[test]
    fn test_impute_exact_match_dominates() {
        let imputer = KNNImputer::new(3);
        let target = Series::new("y".into(), &[Some(100.0), Some(0.0), Some(0.0), None]);
        let context = df!["x" => [7.0, 1.0, 2.0, 7.0]].unwrap();

        let values = floats(&imputer.impute(&target, &context).unwrap());
        assert!((values[3] - 100.0).abs() < 1e-6);
    }

    #[test]
    fn test_impute_without_context_uses_mean() {
        let imputer = KNNImputer::new(5);
        let target = Series::new("y".into(), &[Some(1.0), None, Some(3.0)]);
        let context = DataFrame::empty_with_height(3);

        let values = floats(&imputer.impute(&target, &context).unwrap());
        assert_eq!(values, vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_impute_no_shared_features_uses_mean() {
        let imputer = KNNImputer::new(2);
        let target = Series::new("y".into(), &[Some(2.0), Some(4.0), None]);
        let context = df!["x" => [Some(1.0), Some(2.0), None]].unwrap();

        let values = floats(&imputer.impute(&target, &context).unwrap());
        assert_eq!(values[2], 3.0);
    }

    #[test]
    fn test_impute_all_missing_falls_back_to_zero() {
        let imputer = KNNImputer::new(3);
        let target = Series::new("y".into(), &[None::<f64>, None]);
        let context = df!["x" => [1.0, 2.0]].unwrap();

        let values = floats(&imputer.impute(&target, &context).unwrap());
        assert_eq!(values, vec![0.0, 0.0]);
    }

    #[test]
    fn test_impute_rejects_misaligned_context() {
        let imputer = KNNImputer::new(3);
        let target = Series::new("y".into(), &[Some(1.0), None, Some(3.0)]);
        let context = df!["x" => [1.0, 2.0]].unwrap();

        let err = imputer.impute(&target, &context).unwrap_err();
        assert_eq!(err.error_code(), "LENGTH_MISMATCH");
    }
}
