//! Column type inference.

use once_cell::sync::Lazy;
use polars::prelude::*;
use regex::Regex;

use super::ColumnTypes;
use crate::error::Result;
use crate::types::ColumnType;
use crate::utils::{
    cardinality, is_datetime_dtype, is_numeric_dtype, is_text_dtype, parse_datetime_string,
    series_to_strings,
};

// Names that denote keys rather than features - compiled once at startup
static ID_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(id|.*_id|code|.*_code|.*_number|.*_num)$")
        .expect("Invalid regex: identifier name pattern")
});

/// A column whose distinct non-missing values exceed this share of the rows
/// is an identifier.
const IDENTIFIER_UNIQUENESS_RATIO: f64 = 0.9;

/// Leading non-missing values examined when sniffing text for dates.
const DATETIME_SAMPLE_SIZE: usize = 50;

/// Share of sampled values that must parse for a text column to be a datetime.
const DATETIME_PARSE_THRESHOLD: f64 = 0.7;

/// Infer the type of every column in the table.
pub fn infer_types(df: &DataFrame) -> Result<ColumnTypes> {
    let mut types = ColumnTypes::new();
    for column in df.get_columns() {
        let series = column.as_materialized_series();
        types.insert(series.name().to_string(), infer_column_type(series)?);
    }
    Ok(types)
}

/// Infer column types from storage and values only, without the identifier
/// rules. Used for the processed table, whose columns are all features.
pub fn infer_storage_types(df: &DataFrame) -> Result<ColumnTypes> {
    let mut types = ColumnTypes::new();
    for column in df.get_columns() {
        let series = column.as_materialized_series();
        types.insert(series.name().to_string(), infer_storage_type(series)?);
    }
    Ok(types)
}

/// Classify one column. The first matching rule wins:
///
/// 1. identifier-like name
/// 2. distinct values above 90% of the row count
/// 3. integer or float storage
/// 4. native date or datetime storage
/// 5. text where more than 70% of a 50-value sample parses as a date
/// 6. everything else is categorical
pub fn infer_column_type(series: &Series) -> Result<ColumnType> {
    if is_identifier_name(series.name()) {
        return Ok(ColumnType::Identifier);
    }

    let unique = cardinality(series)?;
    if unique as f64 > IDENTIFIER_UNIQUENESS_RATIO * series.len() as f64 {
        return Ok(ColumnType::Identifier);
    }

    infer_storage_type(series)
}

/// Rules 3 to 6 of [`infer_column_type`].
pub fn infer_storage_type(series: &Series) -> Result<ColumnType> {
    let dtype = series.dtype();

    if is_numeric_dtype(dtype) {
        return Ok(ColumnType::Numeric);
    }

    if is_datetime_dtype(dtype) {
        return Ok(ColumnType::Datetime);
    }

    if is_text_dtype(dtype) && looks_like_datetime(series)? {
        return Ok(ColumnType::Datetime);
    }

    Ok(ColumnType::Categorical)
}

/// Case-insensitive match against the identifier naming pattern.
pub fn is_identifier_name(name: &str) -> bool {
    ID_PATTERN.is_match(name)
}

fn looks_like_datetime(series: &Series) -> Result<bool> {
    let sample: Vec<String> = series_to_strings(series)?
        .into_iter()
        .flatten()
        .take(DATETIME_SAMPLE_SIZE)
        .collect();

    if sample.is_empty() {
        return Ok(false);
    }

    let parsed = sample
        .iter()
        .filter(|v| parse_datetime_string(v).is_some())
        .count();

    Ok(parsed as f64 / sample.len() as f64 > DATETIME_PARSE_THRESHOLD)
}
