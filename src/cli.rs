//! Command-line interface and logging setup.

use std::path::{Path, PathBuf};

use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;

use crate::config::{DEFAULT_MAX_WORKERS, ERROR_LOG_NAME, ExtractorConfig};
use crate::error::Result;

/// CLI arguments for the Leica round extractor.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "leica-extractor",
    version,
    about = "Extract and merge Leica total-station round observations into a spreadsheet report",
    long_about = "Scans a directory tree for per-station Leica export triples (.TPT angle, \
                  .TZT zenith, .TXT distance files), merges the three row sets of each station \
                  by [station, instrument height, round, target], and writes one formatted \
                  xlsx report ordered by observation timestamp."
)]
pub struct Args {
    /// Root directory containing the per-station export directories
    #[arg(value_name = "SOURCE_DIR")]
    pub input_path: PathBuf,

    /// Output directory for the report and error log
    ///
    /// Defaults to <SOURCE_DIR>/extracted. Created if it does not exist.
    #[arg(short = 'o', long = "output", value_name = "PATH")]
    pub output_dir: Option<PathBuf>,

    /// Maximum number of station triples parsed simultaneously
    #[arg(long, value_name = "N", default_value_t = DEFAULT_MAX_WORKERS)]
    pub workers: usize,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Suppress non-error console output
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Args {
    /// Build the run configuration from the parsed arguments.
    pub fn to_config(&self) -> ExtractorConfig {
        ExtractorConfig::new(self.input_path.clone(), self.output_dir.clone())
            .with_max_workers(self.workers)
    }

    pub fn log_level(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else if self.quiet {
            "error"
        } else {
            "info"
        }
    }
}

/// Set up structured logging: a console layer on stderr plus an ERROR-only
/// file layer writing the rolling error log into the output directory.
///
/// The returned guard must stay alive for the duration of the run so
/// buffered log lines are flushed on exit.
pub fn setup_logging(args: &Args, output_dir: &Path) -> Result<WorkerGuard> {
    use tracing_subscriber::filter::LevelFilter;
    use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("leica_extractor={}", args.log_level())));

    let file_appender = tracing_appender::rolling::daily(output_dir, ERROR_LOG_NAME);
    let (error_log, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_timer(fmt::time::uptime())
                .with_writer(std::io::stderr),
        )
        .with(
            fmt::layer()
                .with_ansi(false)
                .with_writer(error_log)
                .with_filter(LevelFilter::ERROR),
        )
        .init();

    Ok(guard)
}
