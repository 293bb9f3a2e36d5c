//! Configuration types for the preprocessing pipeline.
//!
//! Holds the run options ([`PipelineConfig`]) and the strategy vocabulary
//! shared by the advisor, the decision log and the executor.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How missing values in a column are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ImputationMethod {
    /// Fill with the mean of non-null values
    Mean,
    /// Fill with the median of non-null values
    Median,
    /// Fill from the k nearest rows over the other numeric columns
    Knn,
    /// Remove the column from the output
    Drop,
    /// No explicit strategy; the executor applies its per-type default
    #[default]
    Leave,
    /// Fill with the most frequent value
    MostFrequent,
}

impl ImputationMethod {
    /// Wire name used in decision logs and advisor payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mean => "mean",
            Self::Median => "median",
            Self::Knn => "knn",
            Self::Drop => "drop",
            Self::Leave => "leave",
            Self::MostFrequent => "most_frequent",
        }
    }

    /// Lenient parse of free text (case and separator insensitive).
    pub fn from_name(name: &str) -> Option<Self> {
        match normalize_name(name).as_str() {
            "mean" => Some(Self::Mean),
            "median" => Some(Self::Median),
            "knn" => Some(Self::Knn),
            "drop" => Some(Self::Drop),
            "leave" => Some(Self::Leave),
            "most_frequent" | "mode" => Some(Self::MostFrequent),
            _ => None,
        }
    }
}

/// Categorical/datetime encoding strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EncodingMethod {
    /// One 0/1 column per observed category
    OneHot,
    /// Relative frequency of the category
    Frequency,
    /// Smoothed mean of the target per category
    Target,
    /// Calendar feature extraction for datetime columns
    Cyclical,
}

impl EncodingMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OneHot => "onehot",
            Self::Frequency => "frequency",
            Self::Target => "target",
            Self::Cyclical => "cyclical",
        }
    }

    /// Lenient parse; `"none"` and unknown names yield `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        match normalize_name(name).replace('_', "").as_str() {
            "onehot" => Some(Self::OneHot),
            "frequency" | "freq" => Some(Self::Frequency),
            "target" => Some(Self::Target),
            "cyclical" => Some(Self::Cyclical),
            _ => None,
        }
    }
}

/// Scaling strategy for numeric output columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalingMethod {
    /// Zero mean, unit (population) variance
    Standard,
    /// Rescale to [0, 1]
    MinMax,
}

impl ScalingMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::MinMax => "minmax",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match normalize_name(name).replace('_', "").as_str() {
            "standard" | "zscore" => Some(Self::Standard),
            "minmax" => Some(Self::MinMax),
            _ => None,
        }
    }
}

impl fmt::Display for ImputationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for EncodingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for ScalingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase().replace(['-', ' '], "_")
}

/// Configuration for the preprocessing pipeline.
///
/// Use [`PipelineConfig::builder()`] for a validated configuration.
///
/// # Example
///
/// ```rust,ignore
/// use autoprep::config::{PipelineConfig, ScalingMethod};
///
/// let config = PipelineConfig::builder()
///     .target_column("price")
///     .scaling_method(ScalingMethod::MinMax)
///     .build()?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Column to keep out of processing. Ignored if absent from the table.
    /// Default: None
    pub target_column: Option<String>,

    /// Categorical columns with at most this many distinct values are
    /// one-hot encoded when the decision names no encoding.
    /// Default: 10
    pub low_card_threshold: usize,

    /// Columns with a missing rate above this fraction are dropped.
    /// Default: 0.3
    pub high_missing_threshold: f64,

    /// Cap numeric outliers at the IQR fences after imputation.
    /// Default: true
    pub apply_outlier_treatment: bool,

    /// Scale numeric and datetime-derived features.
    /// Default: true
    pub scaling_enabled: bool,

    /// Explicit scaler. `None` picks per column from skewness.
    /// Default: None
    pub scaling_method: Option<ScalingMethod>,

    /// Opaque model name handed to the remote advisor.
    /// Default: None
    pub advisor_model_hint: Option<String>,

    /// Number of neighbors for KNN imputation.
    /// Default: 5
    pub knn_neighbors: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            target_column: None,
            low_card_threshold: 10,
            high_missing_threshold: 0.3,
            apply_outlier_treatment: true,
            scaling_enabled: true,
            scaling_method: None,
            advisor_model_hint: None,
            knn_neighbors: 5,
        }
    }
}

impl PipelineConfig {
    /// Create a new configuration builder.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if !(0.0..=1.0).contains(&self.high_missing_threshold) {
            return Err(ConfigValidationError::InvalidThreshold {
                field: "high_missing_threshold".to_string(),
                value: self.high_missing_threshold,
            });
        }

        if self.low_card_threshold < 2 {
            return Err(ConfigValidationError::InvalidLowCardinalityThreshold(
                self.low_card_threshold,
            ));
        }

        if self.knn_neighbors == 0 {
            return Err(ConfigValidationError::InvalidKnnNeighbors(
                self.knn_neighbors,
            ));
        }

        Ok(())
    }

    /// Label used in decision logs for the scaling setting.
    pub fn scaling_label(&self) -> String {
        self.scaling_method
            .map(|m| m.as_str().to_string())
            .unwrap_or_else(|| "auto-detect".to_string())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid threshold for '{field}': {value} (must be between 0.0 and 1.0)")]
    InvalidThreshold { field: String, value: f64 },

    #[error("Invalid low-cardinality threshold: {0} (must be at least 2)")]
    InvalidLowCardinalityThreshold(usize),

    #[error("Invalid KNN neighbors: {0} (must be at least 1)")]
    InvalidKnnNeighbors(usize),
}

/// Builder for [`PipelineConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    target_column: Option<String>,
    low_card_threshold: Option<usize>,
    high_missing_threshold: Option<f64>,
    apply_outlier_treatment: Option<bool>,
    scaling_enabled: Option<bool>,
    scaling_method: Option<ScalingMethod>,
    advisor_model_hint: Option<String>,
    knn_neighbors: Option<usize>,
}

impl PipelineConfigBuilder {
    /// Set the target column (used for target encoding, left out of the output).
    pub fn target_column(mut self, column: impl Into<String>) -> Self {
        self.target_column = Some(column.into());
        self
    }

    /// Set the distinct-value limit for default one-hot encoding.
    pub fn low_card_threshold(mut self, threshold: usize) -> Self {
        self.low_card_threshold = Some(threshold);
        self
    }

    /// Set the missing-rate fraction above which columns are dropped.
    ///
    /// # Arguments
    /// * `threshold` - Value between 0.0 and 1.0 (e.g., 0.3 = 30%)
    pub fn high_missing_threshold(mut self, threshold: f64) -> Self {
        self.high_missing_threshold = Some(threshold);
        self
    }

    /// Enable or disable IQR capping of numeric columns.
    pub fn apply_outlier_treatment(mut self, enable: bool) -> Self {
        self.apply_outlier_treatment = Some(enable);
        self
    }

    /// Enable or disable scaling.
    pub fn scaling_enabled(mut self, enable: bool) -> Self {
        self.scaling_enabled = Some(enable);
        self
    }

    /// Force one scaler for every column instead of skew-based selection.
    pub fn scaling_method(mut self, method: ScalingMethod) -> Self {
        self.scaling_method = Some(method);
        self
    }

    /// Set the model name passed to the remote advisor.
    pub fn advisor_model_hint(mut self, model: impl Into<String>) -> Self {
        self.advisor_model_hint = Some(model.into());
        self
    }

    /// Set the number of neighbors for KNN imputation.
    pub fn knn_neighbors(mut self, k: usize) -> Self {
        self.knn_neighbors = Some(k);
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `PipelineConfig` or an error if validation fails.
    pub fn build(self) -> Result<PipelineConfig, ConfigValidationError> {
        let defaults = PipelineConfig::default();
        let config = PipelineConfig {
            target_column: self.target_column,
            low_card_threshold: self.low_card_threshold.unwrap_or(defaults.low_card_threshold),
            high_missing_threshold: self
                .high_missing_threshold
                .unwrap_or(defaults.high_missing_threshold),
            apply_outlier_treatment: self
                .apply_outlier_treatment
                .unwrap_or(defaults.apply_outlier_treatment),
            scaling_enabled: self.scaling_enabled.unwrap_or(defaults.scaling_enabled),
            scaling_method: self.scaling_method,
            advisor_model_hint: self.advisor_model_hint,
            knn_neighbors: self.knn_neighbors.unwrap_or(defaults.knn_neighbors),
        };

        config.validate()?;
        Ok(config)
    }
}
