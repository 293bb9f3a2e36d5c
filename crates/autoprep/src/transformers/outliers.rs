//! Outlier capping for numeric columns.
//!
//! Values outside the fitted bounds are clipped to the nearest bound; missing
//! values pass through untouched. Rows are never removed.

use polars::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::profiler::{mean, quantile, sample_std};
use crate::utils::{series_to_f64, valid_values};

/// Multiplier applied to the interquartile range for the fences.
pub const IQR_MULTIPLIER: f64 = 1.5;

/// Default z-score bound.
pub const DEFAULT_Z_THRESHOLD: f64 = 3.0;

/// How capping bounds are learned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutlierMethod {
    /// `[Q1 - 1.5 * IQR, Q3 + 1.5 * IQR]`
    #[default]
    Iqr,
    /// `[mean - z * std, mean + z * std]`
    ZScore,
}

#[derive(Debug, Clone, Copy)]
pub struct OutlierCapper {
    method: OutlierMethod,
    z_threshold: f64,
}

/// Bounds learned by [`OutlierCapper::fit`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FittedOutlierCapper {
    lower: f64,
    upper: f64,
}

impl Default for OutlierCapper {
    fn default() -> Self {
        Self::iqr()
    }
}

impl OutlierCapper {
    pub fn new(method: OutlierMethod) -> Self {
        Self {
            method,
            z_threshold: DEFAULT_Z_THRESHOLD,
        }
    }

    pub fn iqr() -> Self {
        Self::new(OutlierMethod::Iqr)
    }

    pub fn zscore(z_threshold: f64) -> Self {
        Self {
            method: OutlierMethod::ZScore,
            z_threshold,
        }
    }

    pub fn method(&self) -> OutlierMethod {
        self.method
    }

    /// Learn bounds from the non-missing values.
    ///
    /// With no usable values the bounds are infinite and transform is a no-op.
    pub fn fit(self, series: &Series) -> Result<FittedOutlierCapper> {
        let values = valid_values(&series_to_f64(series)?);
        if values.is_empty() {
            return Ok(FittedOutlierCapper {
                lower: f64::NEG_INFINITY,
                upper: f64::INFINITY,
            });
        }

        let (lower, upper) = match self.method {
            OutlierMethod::Iqr => {
                let q1 = quantile(&values, 0.25);
                let q3 = quantile(&values, 0.75);
                let iqr = q3 - q1;
                (q1 - IQR_MULTIPLIER * iqr, q3 + IQR_MULTIPLIER * iqr)
            }
            OutlierMethod::ZScore => {
                let mu = mean(&values);
                let mut sd = sample_std(&values);
                // A zero spread would collapse both bounds onto the mean
                if sd == 0.0 || !sd.is_finite() {
                    sd = 1.0;
                }
                (mu - self.z_threshold * sd, mu + self.z_threshold * sd)
            }
        };

        Ok(FittedOutlierCapper { lower, upper })
    }

    pub fn fit_transform(self, series: &Series) -> Result<Series> {
        self.fit(series)?.transform(series)
    }
}

impl FittedOutlierCapper {
    pub fn bounds(&self) -> (f64, f64) {
        (self.lower, self.upper)
    }

    pub fn cap(&self, value: f64) -> f64 {
        value.clamp(self.lower, self.upper)
    }

    /// Clip to the fitted bounds. Output is Float64 with the input's name.
    pub fn transform(&self, series: &Series) -> Result<Series> {
        let capped: Vec<Option<f64>> = series_to_f64(series)?
            .into_iter()
            .map(|v| v.map(|x| self.cap(x)))
            .collect();
        Ok(Series::new(series.name().clone(), capped))
    }

    /// Number of values the bounds would change.
    pub fn count_outside(&self, values: &[Option<f64>]) -> usize {
        values
            .iter()
            .flatten()
            .filter(|&&v| v < self.lower || v > self.upper)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn floats(series: &Series) -> Vec<Option<f64>> {
        series.f64().unwrap().into_iter().collect()
    }

    // ==================== IQR tests ====================

    #[test]
    fn test_iqr_caps_high_outlier() {
        let series = Series::new("v".into(), &[1.0, 2.0, 3.0, 4.0, 5.0, 100.0]);
        let fitted = OutlierCapper::iqr().fit(&series).unwrap();

        // Q1 = 2.25, Q3 = 4.75, IQR = 2.5
        let (lower, upper) = fitted.bounds();
        assert!((lower - (2.25 - 3.75)).abs() < 1e-9);
        assert!((upper - (4.75 + 3.75)).abs() < 1e-9);

        let capped = floats(&fitted.transform(&series).unwrap());
        assert_eq!(
            capped,
            vec![Some(1.0), Some(2.0), Some(3.0), Some(4.0), Some(5.0), Some(8.5)]
        );
        assert_eq!(fitted.count_outside(&[Some(100.0), Some(3.0)]), 1);
    }

    #[test]
    fn test_iqr_keeps_missing_values() {
        let series = Series::new("v".into(), &[Some(1.0), None, Some(2.0), Some(3.0)]);
        let capped = OutlierCapper::iqr().fit_transform(&series).unwrap();
        assert_eq!(capped.null_count(), 1);
        assert_eq!(capped.name().as_str(), "v");
    }

    #[test]
    fn test_capper_on_empty_values_is_noop() {
        let series = Series::new("v".into(), &[None::<f64>, None]);
        let fitted = OutlierCapper::iqr().fit(&series).unwrap();
        assert_eq!(fitted.bounds(), (f64::NEG_INFINITY, f64::INFINITY));
        assert_eq!(fitted.cap(1e12), 1e12);
    }

    // ==================== Z-score tests ====================

    #[test]
    fn test_zscore_bounds() {
        let series = Series::new("v".into(), &[2.0, 4.0, 6.0]);
        let fitted = OutlierCapper::zscore(1.0).fit(&series).unwrap();
        // mean 4, sample std 2
        assert_eq!(fitted.bounds(), (2.0, 6.0));
        assert_eq!(fitted.cap(10.0), 6.0);
    }

    #[test]
    fn test_zscore_zero_std_uses_unit_spread() {
        let series = Series::new("v".into(), &[5.0, 5.0, 5.0]);
        let fitted = OutlierCapper::zscore(DEFAULT_Z_THRESHOLD).fit(&series).unwrap();
        assert_eq!(fitted.bounds(), (2.0, 8.0));
    }
}
