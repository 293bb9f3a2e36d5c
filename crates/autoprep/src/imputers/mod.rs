//! Imputation module for handling missing values.
//!
//! This module provides the imputation strategies the executor applies:
//! - KNN imputation over the other numeric columns
//! - Statistical imputation (mean, median, most frequent)

mod knn;
mod statistical;

pub use knn::KNNImputer;
pub use statistical::StatisticalImputer;
