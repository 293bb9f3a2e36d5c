use crate::config::ImputationMethod;
use crate::types::{DecisionLog, PreprocessResult, StatsSnapshot};
use anyhow::Result;
use chrono::Local;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

// ============================================================================
// Report Types
// ============================================================================

/// Everything a run produced, except the processed table itself.
///
/// Used for JSON output (`--json`), report files (`--emit-report`) and by
/// renderers that present a run to people.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessingReport {
    /// Timestamp when the report was generated
    pub generated_at: String,
    /// Path to the input file
    pub input_file: String,
    /// Path to the processed CSV (if written)
    pub output_file: Option<String>,
    /// Advisor that produced the decisions
    pub advisor: String,
    pub summary: ReportSummary,
    pub decisions: DecisionLog,
    pub before: StatsSnapshot,
    pub after: StatsSnapshot,
}

/// Shape changes of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    /// (rows, columns) of the input
    pub original_shape: (usize, usize),
    /// (rows, columns) of the processed table
    pub final_shape: (usize, usize),
    /// Dropped by the identifier, constant and missing-rate rules
    pub columns_dropped: usize,
    /// Dropped because the advisor chose `drop`
    pub columns_dropped_by_advisor: usize,
    pub columns_decided: usize,
}

pub struct ReportGenerator {
    output_dir: PathBuf,
    output_name: Option<String>,
}

impl Default for ReportGenerator {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("./outputs"),
            output_name: None,
        }
    }
}

impl ReportGenerator {
    /// Create a new ReportGenerator with custom output settings.
    pub fn new(output_dir: PathBuf, output_name: Option<String>) -> Self {
        Self {
            output_dir,
            output_name,
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Base name for output files: the configured name, else the input file stem.
    pub fn base_name(&self, input_file: impl AsRef<Path>) -> String {
        self.output_name.clone().unwrap_or_else(|| {
            input_file
                .as_ref()
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "dataset".to_string())
        })
    }

    /// Build the report for one run.
    pub fn build_report(
        input_file: &str,
        output_file: Option<&str>,
        advisor: &str,
        original_df: &DataFrame,
        result: &PreprocessResult,
    ) -> ProcessingReport {
        let decisions = &result.decisions;
        let summary = ReportSummary {
            original_shape: (original_df.height(), original_df.width()),
            final_shape: (result.processed.height(), result.processed.width()),
            columns_dropped: decisions.drops.len(),
            columns_dropped_by_advisor: decisions
                .features
                .iter()
                .filter(|f| f.decision.imputation == ImputationMethod::Drop)
                .count(),
            columns_decided: decisions.features.len(),
        };

        ProcessingReport {
            generated_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            input_file: input_file.to_string(),
            output_file: output_file.map(String::from),
            advisor: advisor.to_string(),
            summary,
            decisions: decisions.clone(),
            before: result.before.clone(),
            after: result.after.clone(),
        }
    }

    /// Write the processed table as `<base_name>_processed.csv`.
    pub fn write_processed_csv(&self, df: &DataFrame, base_name: &str) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;

        let output_path = self
            .output_dir
            .join(format!("{}_processed.csv", base_name));
        let mut file = File::create(&output_path)?;

        let mut df = df.clone();
        CsvWriter::new(&mut file)
            .include_header(true)
            .with_separator(b',')
            .with_quote_char(b'"')
            .finish(&mut df)?;

        info!("Dataset saved: {}", output_path.display());
        Ok(output_path)
    }

    /// Write a report to `<base_name>_report.json`.
    pub fn write_report_to_file(
        &self,
        report: &ProcessingReport,
        base_name: &str,
    ) -> Result<PathBuf> {
        fs::create_dir_all(&self.output_dir)?;

        let report_path = self.output_dir.join(format!("{}_report.json", base_name));
        let mut file = File::create(&report_path)?;
        file.write_all(serde_json::to_string_pretty(report)?.as_bytes())?;

        info!("Report saved: {}", report_path.display());
        Ok(report_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::Pipeline;

    fn scratch_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("autoprep_{}_{}", name, std::process::id()))
    }

    fn run() -> (DataFrame, PreprocessResult) {
        let df = df![
            "row_id" => [1i64, 2, 3, 4, 5, 6],
            "size" => ["s", "m", "s", "l", "m", "s"],
            "weight" => [1.0, 2.0, 1.5, 3.0, 2.0, 1.0],
        ]
        .unwrap();
        let result = Pipeline::builder().build().unwrap().fit_transform(&df).unwrap();
        (df, result)
    }

    #[test]
    fn test_base_name() {
        let generator = ReportGenerator::default();
        assert_eq!(generator.base_name("data/train.csv"), "train");

        let named = ReportGenerator::new(PathBuf::from("out"), Some("custom".to_string()));
        assert_eq!(named.base_name("data/train.csv"), "custom");
        assert_eq!(named.output_dir(), Path::new("out"));
    }

    #[test]
    fn test_build_report_summary() {
        let (df, result) = run();
        let report = ReportGenerator::build_report("in.csv", None, "heuristic", &df, &result);

        assert_eq!(report.summary.original_shape, (6, 3));
        assert_eq!(report.summary.final_shape, (6, result.processed.width()));
        assert_eq!(report.summary.columns_dropped, 1);
        assert_eq!(report.summary.columns_decided, 2);
        assert_eq!(report.summary.columns_dropped_by_advisor, 0);
        assert_eq!(report.advisor, "heuristic");

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["decisions"]["drops"][0], "row_id");
        assert_eq!(json["decisions"]["features"][0]["column"], "size");
        assert_eq!(json["before"]["columns"][1]["type"], "categorical");
    }

    #[test]
    fn test_write_files() {
        let (df, result) = run();
        let dir = scratch_dir("write_files");
        let generator = ReportGenerator::new(dir.clone(), None);

        let csv_path = generator
            .write_processed_csv(&result.processed, "sample")
            .unwrap();
        assert!(csv_path.ends_with("sample_processed.csv"));
        let csv = fs::read_to_string(&csv_path).unwrap();
        assert!(csv.starts_with("size__l,size__m,size__s,weight"));
        assert_eq!(csv.lines().count(), 7);

        let report = ReportGenerator::build_report(
            "sample.csv",
            Some(&csv_path.to_string_lossy()),
            "heuristic",
            &df,
            &result,
        );
        let report_path = generator.write_report_to_file(&report, "sample").unwrap();
        let parsed: ProcessingReport =
            serde_json::from_str(&fs::read_to_string(&report_path).unwrap()).unwrap();
        assert_eq!(parsed.decisions, report.decisions);

        fs::remove_dir_all(dir).ok();
    }
}
