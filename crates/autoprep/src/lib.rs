//! Automatic Tabular Preprocessing Library
//!
//! Turns a raw table into a model-ready numeric table built with Rust and Polars.
//!
//! # Overview
//!
//! One call to [`fit_transform`] (or [`Pipeline::fit_transform`]) runs:
//!
//! - **Type Inference**: numeric, categorical, datetime or identifier per column
//! - **Column Statistics**: missing rate, cardinality and moments, before and after
//! - **Column Pruning**: identifiers, constants and mostly-missing columns are dropped
//! - **Strategy Advice**: a remote LLM advisor when configured, a heuristic otherwise
//! - **Transformation**: imputation, outlier capping, scaling, encoding and
//!   calendar features
//! - **Decision Log**: every drop and every per-column choice, with a reason
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use autoprep::{Pipeline, PipelineConfig};
//! use polars::prelude::*;
//!
//! let df = CsvReadOptions::default()
//!     .with_has_header(true)
//!     .try_into_reader_with_file_path(Some("data.csv".into()))?
//!     .finish()?;
//!
//! // Heuristic advisor only
//! let config = PipelineConfig::builder()
//!     .target_column("price")
//!     .high_missing_threshold(0.4)
//!     .build()?;
//!
//! let result = Pipeline::builder()
//!     .config(config)
//!     .on_progress(|update| {
//!         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
//!     })
//!     .build()?
//!     .fit_transform(&df)?;
//!
//! println!("Dropped: {:?}", result.decisions.drops);
//! println!("Output shape: {:?}", result.processed.shape());
//! ```
//!
//! # Remote Advisor
//!
//! With the `ai` feature (default), [`ai::ChatCompletionsProvider`] talks to
//! any OpenAI-compatible chat completions endpoint. [`fit_transform`] picks it
//! up from the environment; [`PipelineBuilder::ai_provider`] wires one in
//! explicitly. Provider failures never fail a run: the column gets the
//! heuristic decision instead.
//!
//! To plug in another backend, implement [`ai::AIProvider`].

pub mod ai;
pub mod config;
pub mod decisions;
pub mod error;
pub mod imputers;
pub mod pipeline;
pub mod profiler;
pub mod reporting;
pub mod transformers;
pub mod types;
pub mod utils;

// Re-exports for convenient access
pub use config::{
    ConfigValidationError, EncodingMethod, ImputationMethod, PipelineConfig,
    PipelineConfigBuilder, ScalingMethod,
};
pub use decisions::{HeuristicAdvisor, RemoteAdvisor, StrategyAdvisor};
pub use error::{PreprocessingError, Result, ResultExt};
pub use imputers::{KNNImputer, StatisticalImputer};
pub use pipeline::{
    ClosureProgressReporter, Pipeline, PipelineBuilder, PreprocessingExecutor, PreprocessingStage,
    ProgressReporter, ProgressUpdate, fit_transform,
};
pub use profiler::{infer_types, snapshot};
pub use reporting::{ProcessingReport, ReportGenerator};
pub use types::{
    ColumnDecision, ColumnStatsEntry, ColumnType, DatasetStatsSummary, Decision, DecisionLog,
    GlobalSettings, PreprocessResult, StatsSnapshot,
};
