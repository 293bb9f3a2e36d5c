//! Report generation module.
//!
//! Turns a [`PreprocessResult`](crate::types::PreprocessResult) into a
//! serializable [`ProcessingReport`] and writes it, together with the
//! processed table, to an output directory.
//!
//! # Example
//!
//! ```rust,ignore
//! use autoprep::reporting::ReportGenerator;
//! use std::path::PathBuf;
//!
//! let generator = ReportGenerator::new(PathBuf::from("outputs"), None);
//! let stem = generator.base_name("data/train.csv");
//! let csv_path = generator.write_processed_csv(&result.processed, &stem)?;
//!
//! let report = ReportGenerator::build_report(
//!     "data/train.csv",
//!     Some(&csv_path.to_string_lossy()),
//!     "heuristic",
//!     &original_df,
//!     &result,
//! );
//! println!("{}", serde_json::to_string_pretty(&report)?);
//! generator.write_report_to_file(&report, &stem)?;
//! ```

mod generator;

pub use generator::{ProcessingReport, ReportGenerator, ReportSummary};
