use clap::Parser;
use leica_extractor::cli::{Args, setup_logging};
use leica_extractor::run_extraction;
use std::process;
use tracing::error;

fn main() {
    let args = Args::parse();
    let config = args.to_config();

    // The error log lives in the output directory, so the source-path
    // precondition has to hold before logging can start.
    if let Err(err) = config.validate() {
        eprintln!("Error: {:#}", err);
        process::exit(2);
    }
    if let Err(err) = config.ensure_output_dir() {
        eprintln!("Error: {:#}", err);
        process::exit(2);
    }

    // Keep the guard alive so buffered error-log lines flush on exit.
    let _guard = match setup_logging(&args, &config.output_dir) {
        Ok(guard) => guard,
        Err(err) => {
            eprintln!("Failed to initialize logging: {:#}", err);
            process::exit(2);
        }
    };

    let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
        eprintln!("Failed to create async runtime: {}", e);
        process::exit(1);
    });

    match runtime.block_on(run_extraction(&config)) {
        Ok(_stats) => {
            // Success - the summary has already been printed.
            process::exit(0);
        }
        Err(err) => {
            // Single log-then-terminate path for every fatal condition; no
            // partial output is left behind beyond the error log itself.
            error!("Extraction failed: {:#}", err);
            eprintln!("Error: {:#}", err);
            process::exit(1);
        }
    }
}
