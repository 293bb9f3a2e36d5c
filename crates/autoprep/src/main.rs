//! CLI entry point for the automatic preprocessing pipeline.

use anyhow::{Result, anyhow};
use autoprep::{
    Pipeline, PipelineConfig, PreprocessResult, ProcessingReport, ReportGenerator, ScalingMethod,
};
use clap::{Parser, ValueEnum};
use dotenv::dotenv;
use polars::io::csv::read::CsvReadOptions;
use polars::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info};

#[cfg(not(feature = "ai"))]
use tracing::warn;

/// CLI-compatible scaling method enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum CliScalingMethod {
    /// Pick per column from skewness
    Auto,
    /// Zero mean, unit variance
    Standard,
    /// Rescale to [0, 1]
    Minmax,
}

impl CliScalingMethod {
    fn method(self) -> Option<ScalingMethod> {
        match self {
            CliScalingMethod::Auto => None,
            CliScalingMethod::Standard => Some(ScalingMethod::Standard),
            CliScalingMethod::Minmax => Some(ScalingMethod::MinMax),
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    version,
    about = "Automatic preprocessing of tabular datasets",
    long_about = "Turns a raw CSV table into a model-ready numeric table.\n\n\
                  ENVIRONMENT VARIABLES (remote advisor, optional):\n  \
                  OPENAI_API_KEY / LLM_API_KEY / HUAWEI_LLM_API_KEY   credential\n  \
                  FULL_CHAT_COMPLETIONS_URL / HUAWEI_LLM_ENDPOINT     full endpoint URL\n  \
                  OPENAI_BASE_URL / LLM_API_BASE                      base URL\n  \
                  LLM_AUTH_HEADER                                     Authorization | X-Auth-Token\n  \
                  LLM_MODEL_NAME                                      default model\n\n\
                  EXAMPLES:\n  \
                  # Basic usage\n  \
                  autoprep -i data.csv\n\n  \
                  # Keep a target column out of processing\n  \
                  autoprep -i data.csv --target price -o results/\n\n  \
                  # Inspect inferred types and statistics only\n  \
                  autoprep -i data.csv --dry-run\n\n  \
                  # Heuristic advisor only\n  \
                  autoprep -i data.csv --no-ai"
)]
struct Args {
    /// Path to the CSV file to process
    #[arg(short, long)]
    input: String,

    /// Output directory for results
    #[arg(short, long, default_value = "./outputs")]
    output: String,

    /// Custom output file name (without extension)
    ///
    /// If not specified, uses the input file name
    #[arg(long)]
    output_name: Option<String>,

    /// Column passed through unchanged as the last output column
    #[arg(short, long)]
    target: Option<String>,

    /// Categorical columns with at most this many values are one-hot encoded
    /// when the advisor names no encoding
    #[arg(long, default_value = "10")]
    low_card_threshold: usize,

    /// Missing rate (0.0 - 1.0) above which a column is dropped
    #[arg(long, default_value = "0.3")]
    high_missing_threshold: f64,

    /// Do not cap numeric outliers
    #[arg(long)]
    no_outliers: bool,

    /// Do not scale numeric features
    #[arg(long)]
    no_scaling: bool,

    /// Scaler for numeric features
    #[arg(long, value_enum, default_value = "auto")]
    scaling_method: CliScalingMethod,

    /// Model name handed to the remote advisor
    #[arg(short, long)]
    model: Option<String>,

    /// Disable the remote advisor (heuristic only)
    #[arg(long)]
    no_ai: bool,

    /// Print inferred types and column statistics without processing
    #[arg(long)]
    dry_run: bool,

    /// Output JSON to stdout instead of human-readable summary
    ///
    /// Disables all progress logs; only outputs the final JSON report.
    #[arg(long)]
    json: bool,

    /// Write a detailed JSON report to the output directory
    ///
    /// The report will be saved as <output_name>_report.json
    #[arg(short = 'r', long)]
    emit_report: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Suppress progress output (only show errors and final result)
    #[arg(short, long)]
    quiet: bool,
}

/// Initialize the tracing subscriber for logging.
///
/// When `json_output` is true, logging is completely disabled to ensure
/// only JSON is written to stdout.
fn init_logging(level: &str, quiet: bool, json_output: bool) {
    if json_output {
        return;
    }

    use tracing_subscriber::EnvFilter;

    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(&args.log_level, args.quiet, args.json);

    // Load environment variables from .env file
    dotenv().ok();

    if !Path::new(&args.input).exists() {
        return Err(anyhow!("Input file not found: {}", args.input));
    }

    info!("Loading dataset from: {}", args.input);
    let data = load_csv_with_fallbacks(&args.input)?;
    info!("Dataset loaded successfully: {:?}", data.shape());

    if args.dry_run {
        return run_dry_run(&args, &data);
    }

    let mut config_builder = PipelineConfig::builder()
        .low_card_threshold(args.low_card_threshold)
        .high_missing_threshold(args.high_missing_threshold)
        .apply_outlier_treatment(!args.no_outliers)
        .scaling_enabled(!args.no_scaling);

    if let Some(method) = args.scaling_method.method() {
        config_builder = config_builder.scaling_method(method);
    }

    if let Some(ref target) = args.target {
        config_builder = config_builder.target_column(target);
    }

    if let Some(ref model) = args.model {
        config_builder = config_builder.advisor_model_hint(model);
    }

    let config = config_builder.build()?;
    let pipeline = build_pipeline(&args, config)?;

    run_pipeline(&pipeline, &args, &data)
}

/// Show inferred types and column statistics without processing.
///
/// Uses `println!` intentionally: this output is the purpose of --dry-run
/// and must be visible regardless of log level.
fn run_dry_run(args: &Args, data: &DataFrame) -> Result<()> {
    let types = autoprep::infer_types(data)?;
    let stats = autoprep::snapshot(data, &types)?;

    println!("\n{}", "=".repeat(80));
    println!("DRY RUN - Inferred types and column statistics");
    println!("{}\n", "=".repeat(80));

    println!("DATASET OVERVIEW");
    println!("{}", "-".repeat(40));
    println!("  File: {}", args.input);
    println!("  Rows: {}", stats.dataset.row_count);
    println!("  Columns: {}", stats.dataset.column_count);
    println!(
        "  Overall missing: {:.1}%",
        stats.dataset.overall_missing_rate * 100.0
    );
    println!();

    println!("COLUMN STATISTICS");
    println!("{}", "-".repeat(40));
    println!(
        "{:<20} {:<12} {:<10} {:<8} {:>12} {:>12} {:>8}",
        "Column", "Type", "Missing %", "Unique", "Mean", "Std", "Skew"
    );
    println!("{}", "-".repeat(86));

    for col in &stats.columns {
        println!(
            "{:<20} {:<12} {:<10.1} {:<8} {:>12} {:>12} {:>8}",
            truncate_str(&col.name, 19),
            col.column_type.as_str(),
            col.missing_rate * 100.0,
            col.cardinality,
            format_optional(col.mean, 3),
            format_optional(col.std, 3),
            format_optional(col.skew, 2),
        );
    }
    println!();

    println!("{}", "=".repeat(80));
    println!("To execute this preprocessing, run without --dry-run");
    println!("{}", "=".repeat(80));

    Ok(())
}

fn format_optional(value: Option<f64>, precision: usize) -> String {
    value
        .map(|v| format!("{:.*}", precision, v))
        .unwrap_or_else(|| "-".to_string())
}

/// Truncate a string to max length with ellipsis
fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

fn pipeline_builder(args: &Args, config: PipelineConfig) -> autoprep::PipelineBuilder {
    let mut builder = Pipeline::builder().config(config);

    if !args.quiet && !args.json {
        builder = builder.on_progress(|update| {
            info!(
                "[{:.0}%] {}: {}",
                update.progress * 100.0,
                update.stage.display_name(),
                update.message
            );
        });
    }

    builder
}

/// Build the pipeline with the remote advisor when the environment configures one
#[cfg(feature = "ai")]
fn build_pipeline(args: &Args, config: PipelineConfig) -> Result<Pipeline> {
    let mut builder = pipeline_builder(args, config);

    if args.no_ai {
        info!("Running with the heuristic advisor (remote advisor disabled)");
    } else {
        builder = builder.advisor_from_env();
    }

    let pipeline = builder.build()?;
    if !args.no_ai && pipeline.advisor_name() == "heuristic" {
        info!("No remote endpoint configured, running with the heuristic advisor");
    }
    Ok(pipeline)
}

/// Build the pipeline without AI support (fallback when "ai" feature is disabled)
#[cfg(not(feature = "ai"))]
fn build_pipeline(args: &Args, config: PipelineConfig) -> Result<Pipeline> {
    if !args.no_ai {
        warn!("Remote advisor not compiled in. Using the heuristic advisor.");
        warn!("Compile with --features ai to enable it.");
    }

    Ok(pipeline_builder(args, config).build()?)
}

/// Run pipeline and write results
fn run_pipeline(pipeline: &Pipeline, args: &Args, data: &DataFrame) -> Result<()> {
    info!("{}", "=".repeat(80));
    info!("Starting automated preprocessing pipeline...");
    info!("{}", "=".repeat(80));

    let result = pipeline.fit_transform(data).map_err(|e| {
        error!("Pipeline failed: {}", e);
        anyhow!("Pipeline failed: {}", e)
    })?;

    handle_pipeline_output(&result, pipeline.advisor_name(), data, args)
}

/// Handle pipeline output based on CLI flags.
///
/// Output behavior:
/// - Always: write `<name>_processed.csv` to the output directory
/// - Default: Print human-readable summary to stdout
/// - `--json`: Print JSON to stdout only (no logs)
/// - `--emit-report`: Write JSON report to file
fn handle_pipeline_output(
    result: &PreprocessResult,
    advisor: &str,
    original_df: &DataFrame,
    args: &Args,
) -> Result<()> {
    let generator = ReportGenerator::new(PathBuf::from(&args.output), args.output_name.clone());
    let base_name = generator.base_name(&args.input);

    let csv_path = generator.write_processed_csv(&result.processed, &base_name)?;
    let csv_path = csv_path.to_string_lossy();

    let report = ReportGenerator::build_report(
        &args.input,
        Some(csv_path.as_ref()),
        advisor,
        original_df,
        result,
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    if args.emit_report {
        let report_path = generator.write_report_to_file(&report, &base_name)?;
        info!("Report written to: {}", report_path.display());
    }

    print_human_readable_summary(&report);

    Ok(())
}

/// Print a human-readable summary of the preprocessing results.
fn print_human_readable_summary(report: &ProcessingReport) {
    let summary = &report.summary;

    println!();
    println!("{}", "=".repeat(80));
    println!("PREPROCESSING COMPLETE");
    println!("{}", "=".repeat(80));
    println!();

    println!(
        "Input:  {} ({} rows x {} columns)",
        report.input_file, summary.original_shape.0, summary.original_shape.1
    );
    if let Some(ref output_file) = report.output_file {
        println!(
            "Output: {} ({} rows x {} columns)",
            output_file, summary.final_shape.0, summary.final_shape.1
        );
    }
    println!("Advisor: {}", report.advisor);
    if let Some(ref target) = report.decisions.global.target_column {
        println!("Target Column: {}", target);
    }
    println!();

    if !report.decisions.drops.is_empty() {
        println!("Dropped Columns:");
        for column in &report.decisions.drops {
            println!("  - {}", column);
        }
        println!();
    }

    if !report.decisions.features.is_empty() {
        println!("Column Decisions:");
        for feature in &report.decisions.features {
            let decision = &feature.decision;
            println!(
                "  - {:<20} imputation={:<13} encoding={:<9} scaling={:<8} {}",
                truncate_str(&feature.column, 19),
                decision.imputation.as_str(),
                decision.encoding.map(|e| e.as_str()).unwrap_or("-"),
                decision.scaling.map(|s| s.as_str()).unwrap_or("-"),
                decision.reason
            );
        }
        println!();
    }

    println!("Use --json for machine-readable output");
    println!("Use --emit-report to save detailed JSON report");
    println!("{}", "=".repeat(80));
}

/// Load CSV with fallback strategies
fn load_csv_with_fallbacks(path: &str) -> Result<DataFrame> {
    // Strategy 1: Standard loading with quote handling
    match CsvReadOptions::default()
        .with_infer_schema_length(Some(100))
        .with_has_header(true)
        .with_parse_options(CsvParseOptions::default().with_quote_char(Some(b'"')))
        .try_into_reader_with_file_path(Some(PathBuf::from(path)))?
        .finish()
    {
        Ok(df) => return Ok(df),
        Err(e) => {
            debug!("Standard loading failed: {}", e);
        }
    }

    // Strategy 2: Without quote handling
    CsvReadOptions::default()
        .with_infer_schema_length(Some(100))
        .with_has_header(true)
        .with_parse_options(CsvParseOptions::default().with_quote_char(None))
        .try_into_reader_with_file_path(Some(PathBuf::from(path)))?
        .finish()
        .map_err(|e| {
            error!("Could not load CSV: {}", e);
            e.into()
        })
}
