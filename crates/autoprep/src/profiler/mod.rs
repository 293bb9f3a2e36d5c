//! Dataset profiling: column type inference and descriptive statistics.
//!
//! - [`infer_types`] classifies every column as numeric, categorical,
//!   datetime or identifier.
//! - [`column_stats`] and [`dataset_wide_stats`] produce the entries the
//!   advisor reads and the summaries recorded before and after a run.

mod statistics;
mod type_inference;

use std::collections::BTreeMap;

use crate::types::ColumnType;

pub use statistics::{
    column_stats, dataset_wide_stats, mean, median, population_skewness, population_std,
    quantile, sample_skewness, sample_std, snapshot,
};
pub use type_inference::{
    infer_column_type, infer_storage_type, infer_storage_types, infer_types, is_identifier_name,
};

/// Column name to inferred type.
pub type ColumnTypes = BTreeMap<String, ColumnType>;
