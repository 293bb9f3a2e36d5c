//! Pipeline module.
//!
//! This module provides the main preprocessing pipeline and related components.

mod builder;
mod executor;
pub mod progress;

pub use builder::{Pipeline, PipelineBuilder, fit_transform};
pub use executor::{
    DAY_FEATURE, DAY_OF_WEEK_FEATURE, IS_WEEKEND_FEATURE, MONTH_FEATURE, PART_DAY_FEATURES,
    PreprocessingExecutor, YEAR_FEATURE,
};
pub use progress::{ClosureProgressReporter, PreprocessingStage, ProgressReporter, ProgressUpdate};
