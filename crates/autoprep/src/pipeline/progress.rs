//! Progress reporting for the preprocessing pipeline.
//!
//! A run is synchronous and cannot be interrupted; progress updates only let
//! a caller (CLI, UI thread) follow what the pipeline is doing.
//!
//! # Example
//!
//! ```rust,ignore
//! use autoprep::Pipeline;
//!
//! let result = Pipeline::builder()
//!     .on_progress(|update| {
//!         println!("[{:?}] {}", update.stage, update.message);
//!     })
//!     .build()?
//!     .fit_transform(&df)?;
//! ```

use serde::{Deserialize, Serialize};

/// Stages of one pipeline run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreprocessingStage {
    /// Validating the configuration and target column
    Initializing,
    /// Classifying columns
    TypeInference,
    /// Computing the "before" statistics
    Statistics,
    /// Dropping identifier, constant and sparse columns
    ColumnPruning,
    /// Advising on and transforming each remaining column
    ColumnProcessing,
    /// Computing the "after" statistics
    FinalStatistics,
    /// Run finished successfully
    Complete,
    /// Run failed with an error
    Failed,
}

impl PreprocessingStage {
    /// Returns a human-readable name for the stage.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Initializing => "Initializing",
            Self::TypeInference => "Inferring Types",
            Self::Statistics => "Computing Statistics",
            Self::ColumnPruning => "Pruning Columns",
            Self::ColumnProcessing => "Processing Columns",
            Self::FinalStatistics => "Final Statistics",
            Self::Complete => "Complete",
            Self::Failed => "Failed",
        }
    }

    /// Share of the whole run spent in this stage (0.0 - 1.0).
    ///
    /// The working stages sum to 1.0; terminal states weigh nothing.
    pub fn weight(&self) -> f32 {
        match self {
            Self::Initializing => 0.02,
            Self::TypeInference => 0.08,
            Self::Statistics => 0.10,
            Self::ColumnPruning => 0.05,
            Self::ColumnProcessing => 0.65,
            Self::FinalStatistics => 0.10,
            Self::Complete => 0.0,
            Self::Failed => 0.0,
        }
    }

    /// Returns the cumulative progress at the start of this stage.
    pub fn base_progress(&self) -> f32 {
        match self {
            Self::Initializing => 0.0,
            Self::TypeInference => 0.02,
            Self::Statistics => 0.10,
            Self::ColumnPruning => 0.20,
            Self::ColumnProcessing => 0.25,
            Self::FinalStatistics => 0.90,
            Self::Complete => 1.0,
            Self::Failed => 0.0,
        }
    }
}

/// One progress event emitted by a running pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressUpdate {
    pub stage: PreprocessingStage,

    /// Column being processed, as "Column: <name>"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_stage: Option<String>,

    /// Whole run, 0.0 - 1.0
    pub progress: f32,

    /// Within `stage`, 0.0 - 1.0
    pub stage_progress: f32,

    pub message: String,

    /// Columns done so far in `ColumnProcessing`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items_processed: Option<usize>,

    /// Columns to process in `ColumnProcessing`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items_total: Option<usize>,
}

impl ProgressUpdate {
    fn at(stage: PreprocessingStage, stage_progress: f32, progress: f32, message: String) -> Self {
        Self {
            stage,
            sub_stage: None,
            progress: progress.clamp(0.0, 1.0),
            stage_progress: stage_progress.clamp(0.0, 1.0),
            message,
            items_processed: None,
            items_total: None,
        }
    }

    /// Update inside `stage`, `stage_progress` of the way through it.
    pub fn new(stage: PreprocessingStage, stage_progress: f32, message: impl Into<String>) -> Self {
        let progress = stage.base_progress() + stage.weight() * stage_progress;
        Self::at(stage, stage_progress, progress, message.into())
    }

    /// Update for item `current` of `total`; stage progress is their ratio.
    pub fn with_items(
        stage: PreprocessingStage,
        sub_stage: impl Into<String>,
        current: usize,
        total: usize,
        message: impl Into<String>,
    ) -> Self {
        let ratio = match total {
            0 => 0.0,
            _ => current as f32 / total as f32,
        };
        Self {
            sub_stage: Some(sub_stage.into()),
            items_processed: Some(current),
            items_total: Some(total),
            ..Self::new(stage, ratio, message)
        }
    }

    pub fn complete(message: impl Into<String>) -> Self {
        Self::at(PreprocessingStage::Complete, 1.0, 1.0, message.into())
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::at(PreprocessingStage::Failed, 0.0, 0.0, message.into())
    }
}

/// Receives progress updates during a run.
///
/// `Send + Sync` so a pipeline running on a worker thread can report to the
/// thread that owns the UI.
pub trait ProgressReporter: Send + Sync {
    /// Called at each stage boundary and once per processed column.
    fn report(&self, update: ProgressUpdate);
}

/// [`ProgressReporter`] backed by a closure.
pub struct ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    callback: F,
}

impl<F> ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    pub fn new(callback: F) -> Self {
        Self { callback }
    }
}

impl<F> ProgressReporter for ClosureProgressReporter<F>
where
    F: Fn(ProgressUpdate) + Send + Sync,
{
    fn report(&self, update: ProgressUpdate) {
        (self.callback)(update);
    }
}

static_assertions::assert_impl_all!(ProgressUpdate: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    const WORKING_STAGES: [PreprocessingStage; 6] = [
        PreprocessingStage::Initializing,
        PreprocessingStage::TypeInference,
        PreprocessingStage::Statistics,
        PreprocessingStage::ColumnPruning,
        PreprocessingStage::ColumnProcessing,
        PreprocessingStage::FinalStatistics,
    ];

    #[test]
    fn test_progress_update_new() {
        let update = ProgressUpdate::new(PreprocessingStage::Statistics, 0.5, "Profiling...");
        assert_eq!(update.stage, PreprocessingStage::Statistics);
        assert!(update.sub_stage.is_none());
        assert_eq!(update.stage_progress, 0.5);
        assert!((update.progress - 0.15).abs() < 1e-6);
    }

    #[test]
    fn test_progress_update_with_items() {
        let update = ProgressUpdate::with_items(
            PreprocessingStage::ColumnProcessing,
            "Column: age",
            5,
            10,
            "Processing column age",
        );
        assert_eq!(update.sub_stage, Some("Column: age".to_string()));
        assert_eq!(update.stage_progress, 0.5);
        assert_eq!(update.items_processed, Some(5));
        assert_eq!(update.items_total, Some(10));
    }

    #[test]
    fn test_progress_update_with_zero_items() {
        let update =
            ProgressUpdate::with_items(PreprocessingStage::ColumnProcessing, "none", 0, 0, "");
        assert_eq!(update.stage_progress, 0.0);
    }

    #[test]
    fn test_progress_update_complete_and_failed() {
        let done = ProgressUpdate::complete("Done!");
        assert_eq!(done.stage, PreprocessingStage::Complete);
        assert_eq!(done.progress, 1.0);

        let failed = ProgressUpdate::failed("boom");
        assert_eq!(failed.stage, PreprocessingStage::Failed);
        assert_eq!(failed.message, "boom");
    }

    #[test]
    fn test_closure_reporter_collects_updates() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let reporter = ClosureProgressReporter::new(move |update: ProgressUpdate| {
            sink.lock().unwrap().push(update.stage);
        });

        reporter.report(ProgressUpdate::new(PreprocessingStage::TypeInference, 0.0, "types"));
        reporter.report(ProgressUpdate::complete("done"));

        assert_eq!(
            *seen.lock().unwrap(),
            vec![PreprocessingStage::TypeInference, PreprocessingStage::Complete]
        );
    }

    #[test]
    fn test_preprocessing_stage_weights_sum() {
        let total_weight: f32 = WORKING_STAGES.iter().map(|s| s.weight()).sum();
        assert!((total_weight - 1.0).abs() < 0.01, "Weights should sum to ~1.0");
    }

    #[test]
    fn test_base_progress_is_cumulative() {
        let mut expected = 0.0;
        for stage in WORKING_STAGES {
            assert!((stage.base_progress() - expected).abs() < 1e-6, "{:?}", stage);
            expected += stage.weight();
        }
        assert!((PreprocessingStage::Complete.base_progress() - expected).abs() < 1e-6);
    }

    #[test]
    fn test_preprocessing_stage_json_values() {
        let stage_expectations = [
            (PreprocessingStage::Initializing, "\"initializing\""),
            (PreprocessingStage::TypeInference, "\"type_inference\""),
            (PreprocessingStage::Statistics, "\"statistics\""),
            (PreprocessingStage::ColumnPruning, "\"column_pruning\""),
            (PreprocessingStage::ColumnProcessing, "\"column_processing\""),
            (PreprocessingStage::FinalStatistics, "\"final_statistics\""),
            (PreprocessingStage::Complete, "\"complete\""),
            (PreprocessingStage::Failed, "\"failed\""),
        ];

        for (stage, expected_json) in stage_expectations {
            let json = serde_json::to_string(&stage).expect("Should serialize");
            assert_eq!(json, expected_json);
        }
        assert_eq!(PreprocessingStage::ColumnPruning.display_name(), "Pruning Columns");
    }

    #[test]
    fn test_progress_reporter_across_threads() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let reporter: Arc<dyn ProgressReporter> =
            Arc::new(ClosureProgressReporter::new(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }));

        let handles: Vec<_> = (0..3)
            .map(|i| {
                let reporter = reporter.clone();
                std::thread::spawn(move || {
                    reporter.report(ProgressUpdate::with_items(
                        PreprocessingStage::ColumnProcessing,
                        format!("Column: c{}", i),
                        i + 1,
                        3,
                        "worker",
                    ));
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
