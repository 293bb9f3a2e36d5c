use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::config::{EncodingMethod, ImputationMethod, PipelineConfig, ScalingMethod};

/// Semantic kind of a column, derived from its name and values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Numeric,
    Categorical,
    Datetime,
    Identifier,
}

impl ColumnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Numeric => "numeric",
            Self::Categorical => "categorical",
            Self::Datetime => "datetime",
            Self::Identifier => "identifier",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Descriptive statistics for one column.
///
/// The numeric fields are only filled for numeric columns with at least one
/// value that coerces to a number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnStatsEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    pub missing_rate: f64,
    /// Distinct non-missing values.
    pub cardinality: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mean: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub median: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub std: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub skew: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

impl ColumnStatsEntry {
    /// Entry with only the fields every column type carries.
    pub fn new(
        name: impl Into<String>,
        column_type: ColumnType,
        missing_rate: f64,
        cardinality: usize,
    ) -> Self {
        Self {
            name: name.into(),
            column_type,
            missing_rate,
            cardinality,
            mean: None,
            median: None,
            std: None,
            skew: None,
            min: None,
            max: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetStatsSummary {
    pub row_count: usize,
    pub column_count: usize,
    /// Mean of the per-column missing rates.
    pub overall_missing_rate: f64,
    pub type_counts: BTreeMap<ColumnType, usize>,
}

/// Dataset-wide summary plus per-column entries, taken before or after a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub dataset: DatasetStatsSummary,
    pub columns: Vec<ColumnStatsEntry>,
}

impl StatsSnapshot {
    pub fn column(&self, name: &str) -> Option<&ColumnStatsEntry> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Column name to inferred type.
    pub fn types(&self) -> BTreeMap<String, ColumnType> {
        self.columns
            .iter()
            .map(|c| (c.name.clone(), c.column_type))
            .collect()
    }
}

/// Cleaning strategy chosen for one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    pub imputation: ImputationMethod,
    pub encoding: Option<EncodingMethod>,
    pub scaling: Option<ScalingMethod>,
    pub reason: String,
}

impl Decision {
    pub fn new(
        imputation: ImputationMethod,
        encoding: Option<EncodingMethod>,
        scaling: Option<ScalingMethod>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            imputation,
            encoding,
            scaling,
            reason: reason.into(),
        }
    }

    /// Map a loosely-typed JSON object onto a decision.
    ///
    /// Missing or unrecognized fields default to `leave`, no encoding, no
    /// scaling and an empty reason. Returns `None` if `value` is not an object.
    pub fn from_json_value(value: &serde_json::Value) -> Option<Self> {
        let object = value.as_object()?;
        let text = |key: &str| object.get(key).and_then(|v| v.as_str());

        Some(Self {
            imputation: text("imputation")
                .and_then(ImputationMethod::from_name)
                .unwrap_or_default(),
            encoding: text("encoding").and_then(EncodingMethod::from_name),
            scaling: text("scaling").and_then(ScalingMethod::from_name),
            reason: text("reason").unwrap_or_default().to_string(),
        })
    }
}

/// Snapshot of the run-wide settings recorded at the head of a decision log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalSettings {
    pub target_column: Option<String>,
    pub low_card_threshold: usize,
    pub high_missing_threshold: f64,
    pub outliers: bool,
    pub scaling: bool,
    /// Configured scaler, or `"auto-detect"`.
    pub scaling_method: String,
}

impl GlobalSettings {
    /// Settings as they apply to a run; `target_column` is the resolved target.
    pub fn from_config(config: &PipelineConfig, target_column: Option<&str>) -> Self {
        Self {
            target_column: target_column.map(str::to_string),
            low_card_threshold: config.low_card_threshold,
            high_missing_threshold: config.high_missing_threshold,
            outliers: config.apply_outlier_treatment,
            scaling: config.scaling_enabled,
            scaling_method: config.scaling_label(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDecision {
    pub column: String,
    #[serde(flatten)]
    pub decision: Decision,
}

/// Everything the pipeline decided during one run, in table order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionLog {
    pub global: GlobalSettings,
    pub drops: Vec<String>,
    pub features: Vec<ColumnDecision>,
}

impl DecisionLog {
    pub fn decision_for(&self, column: &str) -> Option<&Decision> {
        self.features
            .iter()
            .find(|f| f.column == column)
            .map(|f| &f.decision)
    }

    pub fn was_dropped(&self, column: &str) -> bool {
        self.drops.iter().any(|d| d == column)
    }
}

/// Accumulates a [`DecisionLog`] during a run.
#[derive(Debug)]
pub struct DecisionLogBuilder {
    global: GlobalSettings,
    drops: Vec<String>,
    features: Vec<ColumnDecision>,
}

impl DecisionLogBuilder {
    pub fn new(global: GlobalSettings) -> Self {
        Self {
            global,
            drops: Vec::new(),
            features: Vec::new(),
        }
    }

    pub fn record_drop(&mut self, column: impl Into<String>) {
        self.drops.push(column.into());
    }

    pub fn record_decision(&mut self, column: impl Into<String>, decision: Decision) {
        self.features.push(ColumnDecision {
            column: column.into(),
            decision,
        });
    }

    pub fn finish(self) -> DecisionLog {
        DecisionLog {
            global: self.global,
            drops: self.drops,
            features: self.features,
        }
    }
}

/// Output of one pipeline run.
#[derive(Debug, Clone)]
pub struct PreprocessResult {
    pub processed: DataFrame,
    pub decisions: DecisionLog,
    pub before: StatsSnapshot,
    pub after: StatsSnapshot,
}
