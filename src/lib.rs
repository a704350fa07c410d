//! Leica Round Extractor
//!
//! A Rust library and CLI for extracting survey measurements from Leica
//! total-station round exports and merging them into a unified spreadsheet
//! report.
//!
//! Each station directory holds three paired text exports: a horizontal
//! angle file (`.TPT`), a zenith file (`.TZT`, same row format), and a
//! distance file (`.TXT`). This library provides tools for:
//! - Parsing both export layouts with their header/body/summary framing
//! - Merging the three row sets of a station by
//!   `[station, instrument height, round, target]`, degrading gracefully
//!   when a zenith or distance counterpart is missing
//! - Processing all discovered stations concurrently under a bounded
//!   admission limit, with a join-all barrier before global ordering
//! - Writing one formatted xlsx report ordered by observation timestamp

pub mod cli;
pub mod config;
pub mod error;
pub mod merge;
pub mod models;
pub mod parser;
pub mod processor;
pub mod report;

pub use config::ExtractorConfig;
pub use error::{LeicaError, Result};
pub use models::{
    AngleMeasurement, DistanceMeasurement, ExtractionStats, MergedRecord, StationBatch,
};
pub use processor::run_extraction;
