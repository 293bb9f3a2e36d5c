//! Per-column transform execution.
//!
//! Applies one column's [`Decision`] to its values. Each call fits fresh
//! transformers on the column and discards them afterwards.

use chrono::{Datelike, Local, NaiveDateTime, Timelike};
use polars::prelude::*;
use std::collections::HashMap;
use tracing::debug;

use crate::config::{EncodingMethod, ImputationMethod, PipelineConfig, ScalingMethod};
use crate::error::Result;
use crate::imputers::{KNNImputer, StatisticalImputer};
use crate::transformers::{
    FrequencyEncoder, OneHotEncoder, OutlierCapper, TargetMeanEncoder, choose_scaling_method,
    scale_series,
};
use crate::types::Decision;
use crate::utils::{
    ParsedTimestamp, cardinality, is_numeric_dtype, series_to_f64, series_to_strings,
    series_to_timestamps, valid_values,
};

/// Names of the calendar features derived from a datetime column.
pub const YEAR_FEATURE: &str = "year";
pub const MONTH_FEATURE: &str = "month";
pub const DAY_FEATURE: &str = "day";
pub const DAY_OF_WEEK_FEATURE: &str = "day_of_week";
pub const IS_WEEKEND_FEATURE: &str = "is_weekend";
pub const PART_DAY_FEATURES: [&str; 3] =
    ["part_day_morning", "part_day_afternoon", "part_day_evening"];

/// Applies decisions to single columns under one run's configuration.
pub struct PreprocessingExecutor<'a> {
    config: &'a PipelineConfig,
}

impl<'a> PreprocessingExecutor<'a> {
    pub fn new(config: &'a PipelineConfig) -> Self {
        Self { config }
    }

    /// Scaler for a feature: the configured one, else picked from `values`.
    fn scaling_for(&self, values: &[f64]) -> ScalingMethod {
        self.config
            .scaling_method
            .unwrap_or_else(|| choose_scaling_method(values))
    }

    /// Impute, cap and scale a numeric column.
    ///
    /// `context` holds the numeric features available to KNN imputation; the
    /// column itself is excluded from it if present.
    pub fn process_numeric(
        &self,
        series: &Series,
        decision: &Decision,
        context: &DataFrame,
    ) -> Result<Series> {
        let name = series.name().clone();
        let values = series_to_f64(series)?;
        let original = valid_values(&values);
        let coerced = Series::new(name.clone(), values);

        let mut processed = match decision.imputation {
            ImputationMethod::Mean => StatisticalImputer::fill_mean(&coerced)?,
            ImputationMethod::Knn => {
                let context = if context.column(name.as_str()).is_ok() {
                    context.drop(name.as_str())?
                } else {
                    context.clone()
                };
                KNNImputer::new(self.config.knn_neighbors).impute(&coerced, &context)?
            }
            _ => StatisticalImputer::fill_median(&coerced)?,
        };

        if self.config.apply_outlier_treatment {
            let capper = OutlierCapper::iqr().fit(&processed)?;
            let (lower, upper) = capper.bounds();
            debug!(
                "Capping '{}' to [{:.4}, {:.4}], {} values affected",
                name,
                lower,
                upper,
                capper.count_outside(&series_to_f64(&processed)?)
            );
            processed = capper.transform(&processed)?;
        }

        if self.config.scaling_enabled {
            let method = self.scaling_for(&original);
            debug!("Scaling '{}' with {}", name, method);
            processed = scale_series(&processed, method)?;
        }

        Ok(processed)
    }

    /// Impute and encode a categorical column.
    ///
    /// One-hot encoding yields one column per category; every other encoding
    /// yields a single column under the original name.
    pub fn process_categorical(
        &self,
        series: &Series,
        decision: &Decision,
        target: Option<&Series>,
    ) -> Result<Vec<Series>> {
        let filled = StatisticalImputer::fill_most_frequent(series)?;

        let encoding = match decision.encoding {
            Some(encoding) => encoding,
            None if cardinality(series)? <= self.config.low_card_threshold => {
                EncodingMethod::OneHot
            }
            None => EncodingMethod::Frequency,
        };

        match encoding {
            EncodingMethod::OneHot => OneHotEncoder::new().fit_transform(&filled),
            EncodingMethod::Target => match target.map(numeric_target).transpose()?.flatten() {
                Some(y) => Ok(vec![TargetMeanEncoder::default().fit_transform(&filled, &y)?]),
                None => {
                    debug!(
                        "No numeric target for '{}', using frequency encoding",
                        series.name()
                    );
                    Ok(vec![FrequencyEncoder::new().fit_transform(&filled)?])
                }
            },
            EncodingMethod::Frequency | EncodingMethod::Cyclical => {
                Ok(vec![FrequencyEncoder::new().fit_transform(&filled)?])
            }
        }
    }

    /// Derive calendar features from a datetime column.
    ///
    /// Missing or unparseable timestamps are filled with the most common
    /// timestamp, or the current local time when there is none. Year, month,
    /// day and day of week share one scaler chosen from the year values;
    /// `is_weekend` is never scaled. Part-of-day indicators are added only
    /// when at least one value carries a clock time.
    pub fn process_datetime(&self, series: &Series) -> Result<Vec<Series>> {
        let parsed = series_to_timestamps(series)?;
        let has_time = parsed.iter().flatten().any(|t| t.has_time);
        let fill = mode_timestamp(&parsed).unwrap_or_else(|| Local::now().naive_local());
        let filled: Vec<NaiveDateTime> = parsed
            .iter()
            .map(|t| t.map(|t| t.datetime).unwrap_or(fill))
            .collect();

        let year = calendar_feature(&filled, |d| d.year() as f64);
        let month = calendar_feature(&filled, |d| d.month() as f64);
        let day = calendar_feature(&filled, |d| d.day() as f64);
        let day_of_week = calendar_feature(&filled, |d| d.weekday().num_days_from_monday() as f64);
        let is_weekend: Vec<i32> = day_of_week
            .iter()
            .map(|&dow| i32::from(dow >= 5.0))
            .collect();

        let scaling = self
            .config
            .scaling_enabled
            .then(|| self.scaling_for(&year));

        let mut features = Vec::with_capacity(8);
        for (name, values) in [
            (YEAR_FEATURE, year),
            (MONTH_FEATURE, month),
            (DAY_FEATURE, day),
            (DAY_OF_WEEK_FEATURE, day_of_week),
        ] {
            let feature = Series::new(name.into(), values);
            features.push(match scaling {
                Some(method) => scale_series(&feature, method)?,
                None => feature,
            });
        }
        features.push(Series::new(IS_WEEKEND_FEATURE.into(), is_weekend));

        if has_time {
            let parts: Vec<usize> = filled.iter().map(|d| part_of_day(d.hour())).collect();
            for (index, name) in PART_DAY_FEATURES.iter().enumerate() {
                let indicator: Vec<i32> = parts.iter().map(|&p| i32::from(p == index)).collect();
                features.push(Series::new((*name).into(), indicator));
            }
        }

        debug!(
            "Derived {} features from datetime column '{}'",
            features.len(),
            series.name()
        );
        Ok(features)
    }
}

fn calendar_feature(values: &[NaiveDateTime], f: impl Fn(&NaiveDateTime) -> f64) -> Vec<f64> {
    values.iter().map(f).collect()
}

/// Index into [`PART_DAY_FEATURES`]: morning [6,12), afternoon [12,18),
/// evening otherwise.
fn part_of_day(hour: u32) -> usize {
    match hour {
        6..=11 => 0,
        12..=17 => 1,
        _ => 2,
    }
}

/// Most frequent timestamp; ties go to the earliest.
fn mode_timestamp(values: &[Option<ParsedTimestamp>]) -> Option<NaiveDateTime> {
    let mut counts: HashMap<NaiveDateTime, usize> = HashMap::new();
    for value in values.iter().flatten() {
        *counts.entry(value.datetime).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .max_by(|(a, a_count), (b, b_count)| a_count.cmp(b_count).then_with(|| b.cmp(a)))
        .map(|(datetime, _)| datetime)
}

/// The target as floats, if it is numeric or every present value parses as
/// a number.
fn numeric_target(target: &Series) -> Result<Option<Series>> {
    let values = series_to_f64(target)?;
    if !is_numeric_dtype(target.dtype()) {
        let present = series_to_strings(target)?.iter().flatten().count();
        let parsed = values.iter().flatten().count();
        if present == 0 || parsed != present {
            return Ok(None);
        }
    }
    Ok(Some(Series::new(target.name().clone(), values)))
}
