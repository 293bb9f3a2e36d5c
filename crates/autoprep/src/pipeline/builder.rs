//! Main preprocessing pipeline module.
//!
//! This module provides the core [`Pipeline`] struct and builder for
//! orchestrating one `fit_transform` run.

use crate::ai::AIProvider;
use crate::config::{ConfigValidationError, ImputationMethod, PipelineConfig};
use crate::decisions::{StrategyAdvisor, select_advisor};
use crate::error::{Result, ResultExt};
use crate::pipeline::PreprocessingExecutor;
use crate::pipeline::progress::{
    ClosureProgressReporter, PreprocessingStage, ProgressReporter, ProgressUpdate,
};
use crate::profiler::{ColumnTypes, infer_storage_types, infer_types, snapshot};
use crate::types::{
    ColumnStatsEntry, ColumnType, DecisionLogBuilder, GlobalSettings, PreprocessResult,
    StatsSnapshot,
};
use polars::prelude::*;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// The main preprocessing pipeline.
///
/// Use [`Pipeline::builder()`] to create a new pipeline with custom configuration.
///
/// # Example
///
/// ```rust,ignore
/// use autoprep::{Pipeline, PipelineConfig};
/// use autoprep::ai::ChatCompletionsProvider;
/// use std::sync::Arc;
///
/// // With a remote advisor and progress reporting
/// let provider = Arc::new(ChatCompletionsProvider::new(api_key, url)?);
///
/// let result = Pipeline::builder()
///     .ai_provider(provider)
///     .on_progress(|update| {
///         println!("[{:.0}%] {}", update.progress * 100.0, update.message);
///     })
///     .config(PipelineConfig::default())
///     .build()?
///     .fit_transform(&dataframe)?;
///
/// // Heuristic decisions only
/// let result = Pipeline::builder().build()?.fit_transform(&dataframe)?;
/// ```
pub struct Pipeline {
    config: PipelineConfig,
    advisor: Arc<dyn StrategyAdvisor>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

// Ensure Pipeline is Send (can be moved to another thread)
static_assertions::assert_impl_all!(Pipeline: Send);

impl Pipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Name of the advisor chosen at build time.
    pub fn advisor_name(&self) -> &str {
        self.advisor.name()
    }

    /// Clean and encode `df`.
    ///
    /// The input is never modified. Returns the processed table, the decision
    /// log and statistics taken before and after processing.
    ///
    /// # Errors
    ///
    /// Only polars failures on the table itself surface here. Advisor
    /// failures, unparseable values and an unknown target column are
    /// recovered from and logged.
    pub fn fit_transform(&self, df: &DataFrame) -> Result<PreprocessResult> {
        match self.fit_transform_internal(df) {
            Ok(result) => {
                self.report_progress(ProgressUpdate::complete("Preprocessing completed successfully"));
                Ok(result)
            }
            Err(e) => {
                self.report_progress(ProgressUpdate::failed(e.to_string()));
                error!("Pipeline error: {}", e);
                Err(e)
            }
        }
    }

    /// Report progress if a reporter is configured.
    fn report_progress(&self, update: ProgressUpdate) {
        if let Some(reporter) = &self.progress_reporter {
            reporter.report(update);
        }
    }

    /// The configured target, if the table has it.
    fn resolve_target(&self, df: &DataFrame) -> Option<String> {
        let target = self.config.target_column.as_deref()?;
        if df.column(target).is_ok() {
            Some(target.to_string())
        } else {
            warn!("Target column '{}' not found, continuing without a target", target);
            None
        }
    }

    /// Identifier, constant and sparse columns, in table order.
    fn columns_to_drop(&self, df: &DataFrame, types: &ColumnTypes, before: &StatsSnapshot) -> Vec<String> {
        let mut drops = Vec::new();
        for name in df.get_column_names() {
            let name = name.as_str();
            let Some(entry) = before.column(name) else {
                continue;
            };

            let reason = if types.get(name) == Some(&ColumnType::Identifier) {
                Some("identifier".to_string())
            } else if entry.cardinality <= 1 {
                Some("constant".to_string())
            } else if entry.missing_rate > self.config.high_missing_threshold {
                Some(format!("{:.0}% missing", entry.missing_rate * 100.0))
            } else {
                None
            };

            if let Some(reason) = reason {
                debug!("Dropping '{}' ({})", name, reason);
                drops.push(name.to_string());
            }
        }
        drops
    }

    fn fit_transform_internal(&self, df: &DataFrame) -> Result<PreprocessResult> {
        let start_time = Instant::now();

        info!(
            "Starting preprocessing of {} rows x {} columns with the {} advisor",
            df.height(),
            df.width(),
            self.advisor.name()
        );
        self.report_progress(ProgressUpdate::new(
            PreprocessingStage::Initializing,
            0.0,
            "Starting preprocessing...",
        ));
        let mut target = self.resolve_target(df);

        // Step 1: Type inference
        self.report_progress(ProgressUpdate::new(
            PreprocessingStage::TypeInference,
            0.0,
            "Inferring column types...",
        ));
        let mut types = infer_types(df)?;
        debug!("Inferred types: {:?}", types);

        // Step 2: Before statistics
        self.report_progress(ProgressUpdate::new(
            PreprocessingStage::Statistics,
            0.0,
            "Computing column statistics...",
        ));
        let before = snapshot(df, &types)?;

        // Step 3: Drop pass
        self.report_progress(ProgressUpdate::new(
            PreprocessingStage::ColumnPruning,
            0.0,
            "Dropping identifier, constant and sparse columns...",
        ));
        let drops = self.columns_to_drop(df, &types, &before);
        for name in &drops {
            types.remove(name);
        }
        if let Some(t) = target.take_if(|t| drops.contains(t)) {
            warn!("Target column '{}' was dropped, continuing without a target", t);
        }
        info!("Dropped {} columns: {:?}", drops.len(), drops);

        let mut log = DecisionLogBuilder::new(GlobalSettings::from_config(
            &self.config,
            target.as_deref(),
        ));
        for name in &drops {
            log.record_drop(name.clone());
        }

        // Step 4: Per-column processing
        let feature_names: Vec<String> = df
            .get_column_names()
            .into_iter()
            .map(|n| n.to_string())
            .filter(|n| types.contains_key(n) && Some(n.as_str()) != target.as_deref())
            .collect();

        let numeric_features: Vec<String> = feature_names
            .iter()
            .filter(|n| types.get(*n) == Some(&ColumnType::Numeric))
            .cloned()
            .collect();
        let numeric_context = df
            .select(numeric_features)
            .context("Selecting numeric context for imputation")?;
        let target_series = target
            .as_deref()
            .map(|t| df.column(t).map(|c| c.as_materialized_series().clone()))
            .transpose()?;

        let executor = PreprocessingExecutor::new(&self.config);
        let model_hint = self.config.advisor_model_hint.as_deref();
        let total = feature_names.len();
        let mut output: Vec<Series> = Vec::new();
        let mut datetime_done = false;

        for (index, name) in feature_names.iter().enumerate() {
            self.report_progress(ProgressUpdate::with_items(
                PreprocessingStage::ColumnProcessing,
                format!("Column: {}", name),
                index + 1,
                total,
                format!("Processing column {}", name),
            ));

            let column_type = types.get(name).copied().unwrap_or(ColumnType::Categorical);
            let entry = before
                .column(name)
                .cloned()
                .unwrap_or_else(|| ColumnStatsEntry::new(name.as_str(), column_type, 0.0, 0));

            let decision = self.advisor.advise(&entry, model_hint);
            log.record_decision(name.clone(), decision.clone());

            if decision.imputation == ImputationMethod::Drop {
                debug!("Advisor dropped '{}': {}", name, decision.reason);
                continue;
            }

            let series = df
                .column(name)
                .context(format!("Reading column '{}'", name))?
                .as_materialized_series();
            let processed = match column_type {
                ColumnType::Numeric => executor
                    .process_numeric(series, &decision, &numeric_context)
                    .map(|s| vec![s]),
                ColumnType::Categorical => {
                    executor.process_categorical(series, &decision, target_series.as_ref())
                }
                ColumnType::Datetime if datetime_done => {
                    debug!("Skipping datetime column '{}', features already derived", name);
                    Ok(Vec::new())
                }
                ColumnType::Datetime => {
                    datetime_done = true;
                    executor.process_datetime(series)
                }
                ColumnType::Identifier => Ok(vec![series.clone()]),
            };

            match processed {
                Ok(columns) => output.extend(columns),
                Err(e) => warn!("Failed to process column '{}', leaving it out: {}", name, e),
            }
        }

        let processed = assemble(output, df.height())?;

        // Step 5: After statistics
        self.report_progress(ProgressUpdate::new(
            PreprocessingStage::FinalStatistics,
            0.0,
            "Computing statistics of the processed table...",
        ));
        let after_types = infer_storage_types(&processed)?;
        let after = snapshot(&processed, &after_types)?;

        info!(
            "Preprocessing finished in {:.2?}: {} x {} -> {} x {}",
            start_time.elapsed(),
            df.height(),
            df.width(),
            processed.height(),
            processed.width()
        );

        Ok(PreprocessResult {
            processed,
            decisions: log.finish(),
            before,
            after,
        })
    }
}

/// Build the output table. A name already taken by an earlier column is skipped.
fn assemble(series: Vec<Series>, height: usize) -> Result<DataFrame> {
    if series.is_empty() {
        return Ok(DataFrame::empty_with_height(height));
    }

    let mut seen = HashSet::new();
    let mut columns = Vec::with_capacity(series.len());
    for s in series {
        if seen.insert(s.name().clone()) {
            columns.push(s.into_column());
        } else {
            warn!("Duplicate output column '{}' skipped", s.name());
        }
    }
    Ok(DataFrame::new(columns)?)
}

/// Run the pipeline once with `config`.
///
/// The advisor is the remote one when the environment configures an
/// endpoint (with the `ai` feature), the heuristic otherwise.
pub fn fit_transform(df: &DataFrame, config: PipelineConfig) -> Result<PreprocessResult> {
    let builder = Pipeline::builder().config(config);
    #[cfg(feature = "ai")]
    let builder = builder.advisor_from_env();
    builder.build()?.fit_transform(df)
}

/// Builder for creating a [`Pipeline`] instance.
///
/// Use [`Pipeline::builder()`] to get started.
#[derive(Default)]
pub struct PipelineBuilder {
    config: Option<PipelineConfig>,
    ai_provider: Option<Arc<dyn AIProvider>>,
    advisor: Option<Arc<dyn StrategyAdvisor>>,
    progress_reporter: Option<Arc<dyn ProgressReporter>>,
}

// Ensure PipelineBuilder is Send (can be moved to another thread during construction)
static_assertions::assert_impl_all!(PipelineBuilder: Send);

impl PipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Use a remote advisor backed by `provider`.
    ///
    /// Without a provider the pipeline uses the heuristic advisor.
    pub fn ai_provider(mut self, provider: Arc<dyn AIProvider>) -> Self {
        self.ai_provider = Some(provider);
        self
    }

    /// Use a custom advisor. Takes precedence over [`ai_provider`](Self::ai_provider).
    pub fn advisor(mut self, advisor: Arc<dyn StrategyAdvisor>) -> Self {
        self.advisor = Some(advisor);
        self
    }

    /// Use the remote endpoint configured in the environment, if any.
    ///
    /// A misconfigured endpoint is logged and leaves the heuristic advisor in place.
    #[cfg(feature = "ai")]
    pub fn advisor_from_env(mut self) -> Self {
        match crate::ai::ChatCompletionsProvider::from_env() {
            Ok(Some(provider)) => {
                info!("Remote advisor enabled at {}", provider.url());
                self.ai_provider = Some(Arc::new(provider));
            }
            Ok(None) => {}
            Err(e) => warn!("Remote advisor unavailable, using heuristic: {}", e),
        }
        self
    }

    /// Set a progress reporter for receiving updates during processing.
    pub fn progress_reporter(mut self, reporter: Arc<dyn ProgressReporter>) -> Self {
        self.progress_reporter = Some(reporter);
        self
    }

    /// Set a progress callback closure.
    ///
    /// This is a convenience method for simple progress handling.
    /// For more complex scenarios, use [`progress_reporter`](Self::progress_reporter).
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let pipeline = Pipeline::builder()
    ///     .on_progress(|update| {
    ///         println!("[{:.0}%] {:?}: {}",
    ///             update.progress * 100.0,
    ///             update.stage,
    ///             update.message
    ///         );
    ///     })
    ///     .build()?;
    /// ```
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(ProgressUpdate) + Send + Sync + 'static,
    {
        self.progress_reporter = Some(Arc::new(ClosureProgressReporter::new(callback)));
        self
    }

    /// Build the pipeline.
    ///
    /// Returns an error if the configuration is invalid.
    pub fn build(self) -> std::result::Result<Pipeline, ConfigValidationError> {
        let config = self.config.unwrap_or_default();
        config.validate()?;

        let advisor = self
            .advisor
            .unwrap_or_else(|| select_advisor(self.ai_provider));

        Ok(Pipeline {
            config,
            advisor,
            progress_reporter: self.progress_reporter,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScalingMethod;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn sample_df() -> DataFrame {
        df![
            "customer_id" => [1i64, 2, 3, 4, 5, 6, 7, 8, 9, 10],
            "age" => [Some(25.0), Some(32.0), None, Some(41.0), Some(25.0), Some(38.0), Some(29.0), Some(41.0), Some(32.0), Some(25.0)],
            "city" => ["oslo", "rome", "oslo", "lima", "rome", "oslo", "lima", "oslo", "rome", "oslo"],
            "country" => ["no", "no", "no", "no", "no", "no", "no", "no", "no", "no"],
            "price" => [10.0, 12.0, 10.0, 15.0, 12.0, 10.0, 15.0, 10.0, 12.0, 99.0],
        ]
        .unwrap()
    }

    // ==================== Builder tests ====================

    #[test]
    fn test_pipeline_builder_default() {
        let pipeline = Pipeline::builder().build().unwrap();
        assert_eq!(pipeline.advisor_name(), "heuristic");
        assert_eq!(pipeline.config(), &PipelineConfig::default());
    }

    #[test]
    fn test_pipeline_builder_rejects_invalid_config() {
        let config = PipelineConfig {
            high_missing_threshold: 1.5,
            ..PipelineConfig::default()
        };
        assert!(Pipeline::builder().config(config).build().is_err());
    }

    #[test]
    fn test_pipeline_builder_with_progress_callback() {
        let call_count = Arc::new(AtomicUsize::new(0));
        let call_count_clone = call_count.clone();

        let pipeline = Pipeline::builder()
            .on_progress(move |_update| {
                call_count_clone.fetch_add(1, Ordering::SeqCst);
            })
            .build()
            .unwrap();

        pipeline.report_progress(ProgressUpdate::new(PreprocessingStage::Statistics, 0.5, "Test"));

        assert_eq!(call_count.load(Ordering::SeqCst), 1);
    }

    // ==================== Run tests ====================

    #[test]
    fn test_drop_pass_and_decisions() {
        let pipeline = Pipeline::builder().build().unwrap();
        let result = pipeline.fit_transform(&sample_df()).unwrap();

        assert_eq!(result.decisions.drops, vec!["customer_id", "country"]);
        let decided: Vec<&str> = result
            .decisions
            .features
            .iter()
            .map(|f| f.column.as_str())
            .collect();
        assert_eq!(decided, vec!["age", "city", "price"]);

        let names: Vec<String> = result
            .processed
            .get_column_names()
            .iter()
            .map(|n| n.to_string())
            .collect();
        assert_eq!(names, vec!["age", "city__lima", "city__oslo", "city__rome", "price"]);
        assert_eq!(result.processed.height(), 10);
        assert_eq!(result.before.columns.len(), 5);
        assert_eq!(result.after.columns.len(), 5);
    }

    #[test]
    fn test_unknown_target_is_ignored() {
        let config = PipelineConfig::builder()
            .target_column("missing")
            .build()
            .unwrap();
        let result = Pipeline::builder()
            .config(config)
            .build()
            .unwrap()
            .fit_transform(&sample_df())
            .unwrap();

        assert_eq!(result.decisions.global.target_column, None);
    }

    #[test]
    fn test_target_excluded_from_processed() {
        let config = PipelineConfig::builder()
            .target_column("price")
            .scaling_method(ScalingMethod::Standard)
            .build()
            .unwrap();
        let result = Pipeline::builder()
            .config(config)
            .build()
            .unwrap()
            .fit_transform(&sample_df())
            .unwrap();

        assert!(result.processed.column("price").is_err());
        assert!(result.after.column("price").is_none());
        assert!(result.decisions.decision_for("price").is_none());
        assert_eq!(result.decisions.global.target_column.as_deref(), Some("price"));
        assert_eq!(result.decisions.global.scaling_method, "standard");
    }

    #[test]
    fn test_string_target_leaves_only_numeric_features() {
        let df = df![
            "x" => [1.0, 2.0, 2.0, 3.0, 3.0, 1.0],
            "label" => ["a", "b", "a", "b", "a", "b"],
        ]
        .unwrap();
        let config = PipelineConfig::builder()
            .target_column("label")
            .build()
            .unwrap();
        let result = Pipeline::builder()
            .config(config)
            .build()
            .unwrap()
            .fit_transform(&df)
            .unwrap();

        let names: Vec<String> = result
            .processed
            .get_column_names()
            .iter()
            .map(|n| n.to_string())
            .collect();
        assert_eq!(names, vec!["x".to_string()]);
        assert_eq!(result.processed.column("x").unwrap().dtype(), &DataType::Float64);
    }

    #[test]
    fn test_progress_stages_in_order() {
        let stages = Arc::new(Mutex::new(Vec::new()));
        let stages_clone = stages.clone();

        Pipeline::builder()
            .on_progress(move |update| {
                stages_clone.lock().unwrap().push(update.stage);
            })
            .build()
            .unwrap()
            .fit_transform(&sample_df())
            .unwrap();

        let stages = stages.lock().unwrap();
        assert_eq!(stages.first(), Some(&PreprocessingStage::Initializing));
        assert_eq!(stages.last(), Some(&PreprocessingStage::Complete));
        let per_column = stages
            .iter()
            .filter(|s| **s == PreprocessingStage::ColumnProcessing)
            .count();
        assert_eq!(per_column, 3);
    }

    #[test]
    fn test_empty_result_keeps_height() {
        let df = df!["only_id" => [1i64, 2, 3]].unwrap();
        let result = Pipeline::builder().build().unwrap().fit_transform(&df).unwrap();

        assert_eq!(result.processed.width(), 0);
        assert_eq!(result.processed.height(), 3);
        assert_eq!(result.decisions.drops, vec!["only_id"]);
    }

    #[test]
    fn test_assemble_skips_duplicate_names() {
        let a = Series::new("x".into(), &[1.0, 2.0]);
        let b = Series::new("x".into(), &[3.0, 4.0]);
        let df = assemble(vec![a, b], 2).unwrap();
        assert_eq!(df.width(), 1);
    }
}
