//! Run configuration and validation.
//!
//! The configuration is a plain value passed into the discovery, runner, and
//! report components rather than shared mutable state.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{LeicaError, Result};

/// Default cap on simultaneously parsing station triples.
pub const DEFAULT_MAX_WORKERS: usize = 16;

/// Default report file name within the output directory.
pub const DEFAULT_REPORT_NAME: &str = "survey_rounds.xlsx";

/// Name of the error log file written into the output directory.
pub const ERROR_LOG_NAME: &str = "error.log";

/// Configuration for one extraction run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractorConfig {
    /// Root directory containing the per-station export directories.
    pub input_path: PathBuf,

    /// Directory the report and error log are written into.
    pub output_dir: PathBuf,

    /// Maximum number of station triples parsed simultaneously.
    pub max_workers: usize,

    /// File name of the spreadsheet report.
    pub report_name: String,
}

impl ExtractorConfig {
    /// Create a configuration for the given input tree, with the output
    /// directory defaulting to `<input>/extracted`.
    pub fn new(input_path: PathBuf, output_dir: Option<PathBuf>) -> Self {
        let output_dir = output_dir.unwrap_or_else(|| input_path.join("extracted"));
        Self {
            input_path,
            output_dir,
            max_workers: DEFAULT_MAX_WORKERS,
            report_name: DEFAULT_REPORT_NAME.to_string(),
        }
    }

    /// Override the worker cap, keeping at least one worker.
    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers.max(1);
        self
    }

    /// Full path of the spreadsheet report.
    pub fn report_path(&self) -> PathBuf {
        self.output_dir.join(&self.report_name)
    }

    /// Validate the source-path precondition: the input must exist and be a
    /// directory. Checked before any processing starts.
    pub fn validate(&self) -> Result<()> {
        if !self.input_path.is_dir() {
            return Err(LeicaError::configuration(format!(
                "source path is not a directory: {}",
                self.input_path.display()
            )));
        }
        if self.max_workers == 0 {
            return Err(LeicaError::configuration(
                "max_workers must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Create the output directory if it does not exist yet.
    pub fn ensure_output_dir(&self) -> Result<()> {
        std::fs::create_dir_all(&self.output_dir)?;
        Ok(())
    }
}
