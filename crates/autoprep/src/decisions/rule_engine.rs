//! Rule-based strategy advisor using heuristics.

use super::StrategyAdvisor;
use crate::config::{EncodingMethod, ImputationMethod, ScalingMethod};
use crate::types::{ColumnStatsEntry, ColumnType, Decision};
use tracing::debug;

/// Missing rate above which a numeric column is imputed with the median.
const NUMERIC_MISSING_MEDIAN_THRESHOLD: f64 = 0.2;

/// Skew magnitude below which the mean is a fair center.
const MEAN_SKEW_LIMIT: f64 = 1.0;

/// Skew magnitude below which standard scaling is suggested.
const STANDARD_SCALING_SKEW_LIMIT: f64 = 0.5;

/// Distinct values up to which a categorical column is one-hot encoded.
const ONE_HOT_MAX_CARDINALITY: usize = 20;

/// Missing rate above which a datetime column is dropped.
const DATETIME_DROP_MISSING_RATE: f64 = 0.3;

/// Deterministic advisor driven only by the column statistics.
///
/// Works offline and is the fallback for the remote advisor.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicAdvisor;

impl HeuristicAdvisor {
    pub fn new() -> Self {
        Self
    }

    fn numeric(column: &ColumnStatsEntry) -> Decision {
        let skew = column.skew.unwrap_or(0.0);

        let (imputation, imputation_reason) =
            if column.missing_rate > NUMERIC_MISSING_MEDIAN_THRESHOLD {
                (
                    ImputationMethod::Median,
                    format!(
                        "{:.0}% missing, median is robust",
                        column.missing_rate * 100.0
                    ),
                )
            } else if skew.abs() < MEAN_SKEW_LIMIT {
                (
                    ImputationMethod::Mean,
                    format!("near-symmetric distribution (skew {:.2})", skew),
                )
            } else {
                (
                    ImputationMethod::Median,
                    format!("skewed distribution (skew {:.2})", skew),
                )
            };

        let scaling = if skew.abs() < STANDARD_SCALING_SKEW_LIMIT {
            ScalingMethod::Standard
        } else {
            ScalingMethod::MinMax
        };

        Decision::new(
            imputation,
            None,
            Some(scaling),
            format!("Numeric: {}, {} scaling", imputation_reason, scaling),
        )
    }

    fn categorical(column: &ColumnStatsEntry) -> Decision {
        let (encoding, reason) = if column.cardinality <= ONE_HOT_MAX_CARDINALITY {
            (
                EncodingMethod::OneHot,
                format!("Categorical: {} categories, one-hot", column.cardinality),
            )
        } else {
            (
                EncodingMethod::Frequency,
                format!(
                    "Categorical: {} categories, frequency encoding",
                    column.cardinality
                ),
            )
        };

        Decision::new(ImputationMethod::MostFrequent, Some(encoding), None, reason)
    }

    fn datetime(column: &ColumnStatsEntry) -> Decision {
        let (imputation, reason) = if column.missing_rate > DATETIME_DROP_MISSING_RATE {
            (
                ImputationMethod::Drop,
                format!(
                    "Datetime: {:.0}% missing, too sparse to use",
                    column.missing_rate * 100.0
                ),
            )
        } else {
            (
                ImputationMethod::Leave,
                "Datetime: extract calendar features".to_string(),
            )
        };

        Decision::new(imputation, Some(EncodingMethod::Cyclical), None, reason)
    }
}

impl StrategyAdvisor for HeuristicAdvisor {
    fn advise(&self, column: &ColumnStatsEntry, _model_hint: Option<&str>) -> Decision {
        let decision = match column.column_type {
            ColumnType::Numeric => Self::numeric(column),
            ColumnType::Categorical => Self::categorical(column),
            ColumnType::Datetime => Self::datetime(column),
            ColumnType::Identifier => Decision::new(
                ImputationMethod::Leave,
                None,
                None,
                "No specific rule for this column type",
            ),
        };

        debug!(
            "Heuristic decision for '{}': imputation={}, encoding={:?}, scaling={:?}",
            column.name, decision.imputation, decision.encoding, decision.scaling
        );
        decision
    }

    fn name(&self) -> &str {
        "heuristic"
    }
}
