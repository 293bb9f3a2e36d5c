//! Shared helpers for dtype checks, value coercion and null filling.
//!
//! Columns are pulled out of polars into plain `Vec<Option<_>>` buffers so
//! that statistics and transformers work on the same coerced view of the
//! data. A float `NaN` is treated as missing everywhere.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use polars::prelude::*;
use std::collections::{HashMap, HashSet};

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Check if a DataType carries calendar dates.
#[inline]
pub fn is_datetime_dtype(dtype: &DataType) -> bool {
    matches!(dtype, DataType::Datetime(_, _) | DataType::Date)
}

/// Check if a DataType holds free text or categories.
#[inline]
pub fn is_text_dtype(dtype: &DataType) -> bool {
    matches!(dtype, DataType::String | DataType::Categorical(_, _))
}

// =============================================================================
// String Parsing Utilities
// =============================================================================

/// Parse a string as a finite number. Anything else is treated as missing.
pub fn parse_numeric_string(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// A timestamp parsed from text, remembering whether a clock time was present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedTimestamp {
    pub datetime: NaiveDateTime,
    pub has_time: bool,
}

const DATETIME_FORMATS: [&str; 12] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%d/%m/%Y %H:%M:%S",
    "%d.%m.%Y %H:%M:%S",
];

const DATE_FORMATS: [&str; 10] = [
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%d %B %Y",
    "%d %b %Y",
];

/// Parse a date or date-time string in one of the common layouts.
///
/// Month-first layouts win over day-first ones when both would match.
pub fn parse_datetime_string(s: &str) -> Option<ParsedTimestamp> {
    let trimmed = s.trim();
    if trimmed.len() < 6 {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(ParsedTimestamp {
            datetime: dt.naive_local(),
            has_time: true,
        });
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(trimmed, fmt) {
            return Some(ParsedTimestamp {
                datetime,
                has_time: true,
            });
        }
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, fmt) {
            return Some(ParsedTimestamp {
                datetime: date.and_time(NaiveTime::MIN),
                has_time: false,
            });
        }
    }

    None
}

// =============================================================================
// Series Conversion Utilities
// =============================================================================

/// Coerce a Series to floats; values that are not numbers become `None`.
pub fn series_to_f64(series: &Series) -> PolarsResult<Vec<Option<f64>>> {
    let dtype = series.dtype();
    if is_numeric_dtype(dtype) || matches!(dtype, DataType::Boolean) {
        let cast = series.cast(&DataType::Float64)?;
        return Ok(cast
            .f64()?
            .into_iter()
            .map(|v| v.filter(|x| !x.is_nan()))
            .collect());
    }

    let strings = series_to_strings(series)?;
    Ok(strings
        .iter()
        .map(|v| v.as_deref().and_then(parse_numeric_string))
        .collect())
}

/// Render a Series as strings; missing values (including float NaN) are `None`.
pub fn series_to_strings(series: &Series) -> PolarsResult<Vec<Option<String>>> {
    if matches!(series.dtype(), DataType::Float32 | DataType::Float64) {
        let cast = series.cast(&DataType::Float64)?;
        return Ok(cast
            .f64()?
            .into_iter()
            .map(|v| v.filter(|x| !x.is_nan()).map(|x| x.to_string()))
            .collect());
    }

    let cast = series.cast(&DataType::String)?;
    Ok(cast
        .str()?
        .into_iter()
        .map(|v| v.map(str::to_string))
        .collect())
}

/// Parse a Series into timestamps. Unparseable values become `None`.
pub fn series_to_timestamps(series: &Series) -> PolarsResult<Vec<Option<ParsedTimestamp>>> {
    match series.dtype() {
        DataType::Date => {
            let days = series.cast(&DataType::Int32)?;
            Ok(days
                .i32()?
                .into_iter()
                .map(|v| {
                    v.and_then(|d| {
                        NaiveDate::from_num_days_from_ce_opt(d + UNIX_EPOCH_DAYS_FROM_CE)
                    })
                    .map(|date| ParsedTimestamp {
                        datetime: date.and_time(NaiveTime::MIN),
                        has_time: false,
                    })
                })
                .collect())
        }
        DataType::Datetime(unit, _) => {
            let unit = *unit;
            let raw = series.cast(&DataType::Int64)?;
            Ok(raw
                .i64()?
                .into_iter()
                .map(|v| {
                    v.and_then(|ts| timestamp_from_unit(ts, unit))
                        .map(|datetime| ParsedTimestamp {
                            datetime,
                            has_time: true,
                        })
                })
                .collect())
        }
        _ => {
            let strings = series_to_strings(series)?;
            Ok(strings
                .iter()
                .map(|v| v.as_deref().and_then(parse_datetime_string))
                .collect())
        }
    }
}

const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

fn timestamp_from_unit(ts: i64, unit: TimeUnit) -> Option<NaiveDateTime> {
    let dt = match unit {
        TimeUnit::Nanoseconds => Some(DateTime::from_timestamp_nanos(ts)),
        TimeUnit::Microseconds => DateTime::from_timestamp_micros(ts),
        TimeUnit::Milliseconds => DateTime::from_timestamp_millis(ts),
    };
    dt.map(|d| d.naive_utc())
}

// =============================================================================
// Series Statistics Utilities
// =============================================================================

/// Number of missing entries (nulls, plus NaN for float columns).
pub fn missing_count(series: &Series) -> PolarsResult<usize> {
    if matches!(series.dtype(), DataType::Float32 | DataType::Float64) {
        let cast = series.cast(&DataType::Float64)?;
        return Ok(cast
            .f64()?
            .into_iter()
            .filter(|v| v.is_none_or(|x| x.is_nan()))
            .count());
    }
    Ok(series.null_count())
}

/// Fraction of missing entries; 0.0 for an empty Series.
pub fn missing_rate(series: &Series) -> PolarsResult<f64> {
    if series.is_empty() {
        return Ok(0.0);
    }
    Ok(missing_count(series)? as f64 / series.len() as f64)
}

/// Distinct non-missing values.
pub fn cardinality(series: &Series) -> PolarsResult<usize> {
    if is_numeric_dtype(series.dtype()) {
        let values = series_to_f64(series)?;
        let distinct: HashSet<u64> = values
            .into_iter()
            .flatten()
            // -0.0 and 0.0 are the same value
            .map(|v| if v == 0.0 { 0u64 } else { v.to_bits() })
            .collect();
        return Ok(distinct.len());
    }

    let values = series_to_strings(series)?;
    let distinct: HashSet<String> = values.into_iter().flatten().collect();
    Ok(distinct.len())
}

/// Most frequent value; ties go to the smallest value.
pub fn string_mode(values: &[Option<String>]) -> Option<String> {
    let mut value_counts: HashMap<&str, usize> = HashMap::new();
    for val in values.iter().flatten() {
        *value_counts.entry(val.as_str()).or_insert(0) += 1;
    }

    value_counts
        .into_iter()
        .max_by(|(a_val, a_count), (b_val, b_count)| {
            a_count.cmp(b_count).then_with(|| b_val.cmp(a_val))
        })
        .map(|(val, _)| val.to_string())
}

/// Non-missing values of a coerced column.
pub fn valid_values(values: &[Option<f64>]) -> Vec<f64> {
    values.iter().flatten().copied().collect()
}

// =============================================================================
// Fill Utilities
// =============================================================================

/// Replace missing numeric values with `fill_value`.
pub fn fill_numeric_nulls(values: &[Option<f64>], fill_value: f64) -> Vec<f64> {
    values.iter().map(|v| v.unwrap_or(fill_value)).collect()
}

/// Replace missing string values with `fill_value`.
pub fn fill_string_nulls(values: &[Option<String>], fill_value: &str) -> Vec<String> {
    values
        .iter()
        .map(|v| v.clone().unwrap_or_else(|| fill_value.to_string()))
        .collect()
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    // ==================== Dtype tests ====================

    #[test]
    fn test_is_numeric_dtype() {
        assert!(is_numeric_dtype(&DataType::Int64));
        assert!(is_numeric_dtype(&DataType::UInt8));
        assert!(is_numeric_dtype(&DataType::Float64));
        assert!(!is_numeric_dtype(&DataType::String));
        assert!(!is_numeric_dtype(&DataType::Boolean));
    }

    #[test]
    fn test_is_datetime_dtype() {
        assert!(is_datetime_dtype(&DataType::Date));
        assert!(is_datetime_dtype(&DataType::Datetime(
            TimeUnit::Milliseconds,
            None
        )));
        assert!(!is_datetime_dtype(&DataType::String));
    }

    // ==================== Parsing tests ====================

    #[test]
    fn test_parse_numeric_string() {
        assert_eq!(parse_numeric_string("42"), Some(42.0));
        assert_eq!(parse_numeric_string(" -1.5 "), Some(-1.5));
        assert_eq!(parse_numeric_string("1e3"), Some(1000.0));
        assert_eq!(parse_numeric_string(""), None);
        assert_eq!(parse_numeric_string("NaN"), None);
        assert_eq!(parse_numeric_string("abc"), None);
    }

    #[test]
    fn test_parse_datetime_string_date_only() {
        let parsed = parse_datetime_string("2024-03-09").unwrap();
        assert!(!parsed.has_time);
        assert_eq!(parsed.datetime.year(), 2024);
        assert_eq!(parsed.datetime.month(), 3);
        assert_eq!(parsed.datetime.day(), 9);

        assert!(parse_datetime_string("03/09/2024").is_some());
        assert!(parse_datetime_string("March 9, 2024").is_some());
    }

    #[test]
    fn test_parse_datetime_string_with_time() {
        let parsed = parse_datetime_string("2024-03-09 14:30:00").unwrap();
        assert!(parsed.has_time);
        assert_eq!(parsed.datetime.hour(), 14);

        let iso = parse_datetime_string("2024-03-09T08:15:00Z").unwrap();
        assert!(iso.has_time);
        assert_eq!(iso.datetime.hour(), 8);
    }

    #[test]
    fn test_parse_datetime_string_rejects_non_dates() {
        assert!(parse_datetime_string("red").is_none());
        assert!(parse_datetime_string("12345").is_none());
        assert!(parse_datetime_string("hello world").is_none());
        assert!(parse_datetime_string("2024-13-45").is_none());
    }

    // ==================== Conversion tests ====================

    #[test]
    fn test_series_to_f64_coerces_strings() {
        let series = Series::new("x".into(), &[Some("1.5"), Some("abc"), None, Some("3")]);
        let values = series_to_f64(&series).unwrap();
        assert_eq!(values, vec![Some(1.5), None, None, Some(3.0)]);
    }

    #[test]
    fn test_series_to_f64_nan_is_missing() {
        let series = Series::new("x".into(), &[Some(1.0), Some(f64::NAN), None]);
        let values = series_to_f64(&series).unwrap();
        assert_eq!(values, vec![Some(1.0), None, None]);
        assert_eq!(missing_count(&series).unwrap(), 2);
    }

    #[test]
    fn test_series_to_timestamps_from_strings() {
        let series = Series::new(
            "when".into(),
            &[Some("2024-01-06"), Some("garbage"), None],
        );
        let ts = series_to_timestamps(&series).unwrap();
        assert_eq!(ts[0].map(|t| t.datetime.weekday().num_days_from_monday()), Some(5));
        assert!(ts[1].is_none());
        assert!(ts[2].is_none());
    }

    // ==================== Statistics helper tests ====================

    #[test]
    fn test_cardinality_ignores_missing() {
        let numbers = Series::new("n".into(), &[Some(1.0), Some(1.0), None, Some(2.0)]);
        assert_eq!(cardinality(&numbers).unwrap(), 2);

        let text = Series::new("t".into(), &[Some("a"), None, Some("b"), Some("a")]);
        assert_eq!(cardinality(&text).unwrap(), 2);
    }

    #[test]
    fn test_missing_rate() {
        let series = Series::new("t".into(), &[Some("a"), None, None, Some("b")]);
        assert_eq!(missing_rate(&series).unwrap(), 0.5);
    }

    #[test]
    fn test_string_mode_tie_breaks_to_smallest() {
        let values = vec![
            Some("b".to_string()),
            Some("a".to_string()),
            None,
            Some("b".to_string()),
            Some("a".to_string()),
        ];
        assert_eq!(string_mode(&values), Some("a".to_string()));
        assert_eq!(string_mode(&[None, None]), None);
    }

    #[test]
    fn test_fill_nulls() {
        assert_eq!(
            fill_numeric_nulls(&[Some(1.0), None, Some(3.0)], 0.0),
            vec![1.0, 0.0, 3.0]
        );
        assert_eq!(
            fill_string_nulls(&[None, Some("x".to_string())], "y"),
            vec!["y".to_string(), "x".to_string()]
        );
    }
}
