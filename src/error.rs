//! Error handling for Leica export processing.
//!
//! All fatal conditions funnel through these types up to the binary's
//! top-level handler, which logs and terminates. There is no partial-success
//! mode: either the full run completes and emits one report, or it emits none.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LeicaError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Invalid export format in file: {path} - {reason}")]
    InvalidFormat { path: PathBuf, reason: String },

    #[error("Data integrity error for station {station}: {reason}")]
    DataIntegrity { station: String, reason: String },

    #[error("Report writing failed: {reason}")]
    Report { reason: String },

    #[error("Worker task failed: {reason}")]
    WorkerFailed { reason: String },
}

impl LeicaError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn invalid_format(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::InvalidFormat {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn data_integrity(station: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::DataIntegrity {
            station: station.into(),
            reason: reason.into(),
        }
    }
}

impl From<rust_xlsxwriter::XlsxError> for LeicaError {
    fn from(error: rust_xlsxwriter::XlsxError) -> Self {
        Self::Report {
            reason: error.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, LeicaError>;
