//! Feature scaling.

use polars::prelude::*;

use crate::config::ScalingMethod;
use crate::error::Result;
use crate::profiler::{mean, population_skewness, population_std};
use crate::utils::{series_to_f64, valid_values};

/// Skewness magnitude above which min-max scaling is preferred.
pub const SKEW_SCALING_THRESHOLD: f64 = 0.5;

/// Pick a scaler from the shape of the data.
///
/// Fewer than two values default to standard scaling.
pub fn choose_scaling_method(values: &[f64]) -> ScalingMethod {
    if values.len() < 2 {
        return ScalingMethod::Standard;
    }
    if population_skewness(values).abs() > SKEW_SCALING_THRESHOLD {
        ScalingMethod::MinMax
    } else {
        ScalingMethod::Standard
    }
}

/// Fit the given scaler on `series` and transform it in one pass.
pub fn scale_series(series: &Series, method: ScalingMethod) -> Result<Series> {
    match method {
        ScalingMethod::Standard => StandardScaler::new().fit_transform(series),
        ScalingMethod::MinMax => MinMaxScaler::new().fit_transform(series),
    }
}

/// Centers on the mean and divides by the population standard deviation.
///
/// A constant column scales to all zeros.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardScaler;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FittedStandardScaler {
    mean: f64,
    scale: f64,
}

impl StandardScaler {
    pub fn new() -> Self {
        Self
    }

    pub fn fit(self, series: &Series) -> Result<FittedStandardScaler> {
        let values = valid_values(&series_to_f64(series)?);
        let std = population_std(&values);
        Ok(FittedStandardScaler {
            mean: mean(&values),
            scale: if std > 0.0 { std } else { 1.0 },
        })
    }

    pub fn fit_transform(self, series: &Series) -> Result<Series> {
        self.fit(series)?.transform(series)
    }
}

impl FittedStandardScaler {
    pub fn transform(&self, series: &Series) -> Result<Series> {
        let scaled: Vec<Option<f64>> = series_to_f64(series)?
            .into_iter()
            .map(|v| v.map(|x| (x - self.mean) / self.scale))
            .collect();
        Ok(Series::new(series.name().clone(), scaled))
    }
}

/// Rescales to [0, 1] using the fitted minimum and maximum.
///
/// A constant column scales to all zeros.
#[derive(Debug, Clone, Copy, Default)]
pub struct MinMaxScaler;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FittedMinMaxScaler {
    min: f64,
    range: f64,
}

impl MinMaxScaler {
    pub fn new() -> Self {
        Self
    }

    pub fn fit(self, series: &Series) -> Result<FittedMinMaxScaler> {
        let values = valid_values(&series_to_f64(series)?);
        let min = values.iter().copied().reduce(f64::min).unwrap_or(0.0);
        let max = values.iter().copied().reduce(f64::max).unwrap_or(0.0);
        let range = max - min;
        Ok(FittedMinMaxScaler {
            min,
            range: if range > 0.0 { range } else { 1.0 },
        })
    }

    pub fn fit_transform(self, series: &Series) -> Result<Series> {
        self.fit(series)?.transform(series)
    }
}

impl FittedMinMaxScaler {
    pub fn transform(&self, series: &Series) -> Result<Series> {
        let scaled: Vec<Option<f64>> = series_to_f64(series)?
            .into_iter()
            .map(|v| v.map(|x| (x - self.min) / self.range))
            .collect();
        Ok(Series::new(series.name().clone(), scaled))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn floats(series: &Series) -> Vec<f64> {
        series.f64().unwrap().into_iter().flatten().collect()
    }

    // ==================== Scaler tests ====================

    #[test]
    fn test_standard_scaler() {
        let series = Series::new("x".into(), &[1.0, 2.0, 3.0]);
        let scaled = floats(&StandardScaler::new().fit_transform(&series).unwrap());
        let std = (2.0f64 / 3.0).sqrt();
        assert!((scaled[0] + 1.0 / std).abs() < 1e-9);
        assert!(scaled[1].abs() < 1e-9);
        assert!((scaled[2] - 1.0 / std).abs() < 1e-9);
    }

    #[test]
    fn test_minmax_scaler() {
        let series = Series::new("x".into(), &[10.0, 20.0, 30.0, 15.0]);
        let scaled = floats(&MinMaxScaler::new().fit_transform(&series).unwrap());
        assert_eq!(scaled, vec![0.0, 0.5, 1.0, 0.25]);
    }

    #[test]
    fn test_constant_column_scales_to_zero() {
        let series = Series::new("x".into(), &[4.0, 4.0, 4.0]);
        assert_eq!(
            floats(&scale_series(&series, ScalingMethod::Standard).unwrap()),
            vec![0.0, 0.0, 0.0]
        );
        assert_eq!(
            floats(&scale_series(&series, ScalingMethod::MinMax).unwrap()),
            vec![0.0, 0.0, 0.0]
        );
    }

    #[test]
    fn test_scalers_keep_missing_values() {
        let series = Series::new("x".into(), &[Some(1.0), None, Some(3.0)]);
        let scaled = MinMaxScaler::new().fit_transform(&series).unwrap();
        assert_eq!(scaled.null_count(), 1);
    }

    // ==================== Selection tests ====================

    #[test]
    fn test_choose_scaling_method() {
        assert_eq!(choose_scaling_method(&[]), ScalingMethod::Standard);
        assert_eq!(choose_scaling_method(&[3.0]), ScalingMethod::Standard);
        assert_eq!(
            choose_scaling_method(&[1.0, 2.0, 3.0, 4.0, 5.0]),
            ScalingMethod::Standard
        );
        assert_eq!(
            choose_scaling_method(&[1.0, 1.0, 1.0, 1.0, 100.0]),
            ScalingMethod::MinMax
        );
    }
}
