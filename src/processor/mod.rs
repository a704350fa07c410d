//! Processing engine: per-station parse+merge and the concurrent runner.
//!
//! Orchestrates the complete extraction workflow: station discovery, bounded
//! concurrent parsing and merging of station triples, a join-all barrier,
//! global ordering by observation timestamp, and report output.

pub mod discovery;

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use chrono::NaiveDateTime;
use colored::*;
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::Semaphore;
use tokio::task;
use tracing::debug;

use crate::config::ExtractorConfig;
use crate::error::{LeicaError, Result};
use crate::merge::merge_rounds;
use crate::models::{ExtractionStats, StationBatch};
use crate::parser::{parse_angle_file, parse_distance_file};
use crate::report::write_report;

use discovery::{FileDiscovery, StationFiles};

/// Parse one station's file triple and merge the three row sets.
///
/// Any open or parse failure here is fatal to the whole run; there is no
/// per-station isolation.
pub fn process_station(
    station: &str,
    angle_path: &Path,
    zenith_path: &Path,
    distance_path: &Path,
) -> Result<StationBatch> {
    let angles = parse_angle_file(angle_path)?;
    let zeniths = parse_angle_file(zenith_path)?;
    let distances = parse_distance_file(distance_path)?;

    let records = merge_rounds(&angles, &zeniths, &distances);
    debug!(
        "Station {}: merged {} records from {}/{}/{} parsed rows",
        station,
        records.len(),
        angles.len(),
        zeniths.len(),
        distances.len()
    );

    Ok(StationBatch {
        station: station.to_string(),
        records,
    })
}

/// Statistics from one runner invocation.
#[derive(Debug, Default)]
pub struct RunnerStats {
    pub stations_processed: usize,
    pub stations_skipped: usize,
    /// Peak number of workers holding an admission slot at once; never
    /// exceeds the configured worker cap.
    pub max_in_flight: usize,
}

/// Fans [`process_station`] out across all complete station triples with
/// bounded concurrency and returns the batches in global timestamp order.
#[derive(Debug)]
pub struct ConcurrentBatchRunner {
    max_workers: usize,
}

impl ConcurrentBatchRunner {
    pub fn new(max_workers: usize) -> Self {
        Self {
            max_workers: max_workers.max(1),
        }
    }

    /// Process every complete triple; triples missing one of the three files
    /// are skipped silently.
    ///
    /// All workers run to completion before any error surfaces (join-all
    /// barrier); afterwards batches are sorted ascending by the timestamp of
    /// their first record. A batch with no records or an unparsable
    /// timestamp aborts the run.
    pub async fn run(
        &self,
        stations: BTreeMap<String, StationFiles>,
    ) -> Result<(Vec<StationBatch>, RunnerStats)> {
        let mut stats = RunnerStats::default();

        let mut triples = Vec::new();
        for (station, files) in stations {
            match files.complete() {
                Some(triple) => triples.push((station, triple)),
                None => {
                    debug!("Skipping station {}: incomplete file triple", station);
                    stats.stations_skipped += 1;
                }
            }
        }

        let progress = create_progress_bar(triples.len() as u64);
        let semaphore = Arc::new(Semaphore::new(self.max_workers));
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak_in_flight = Arc::new(AtomicUsize::new(0));

        // Every triple gets a future up front; the semaphore is the one
        // admission gate, so at most max_workers triples parse at a time.
        let worker_count = triples.len().max(1);
        let results: Vec<Result<StationBatch>> = stream::iter(triples)
            .map(|(station, (angle, zenith, distance))| {
                let semaphore = Arc::clone(&semaphore);
                let in_flight = Arc::clone(&in_flight);
                let peak_in_flight = Arc::clone(&peak_in_flight);
                let progress = progress.clone();
                async move {
                    let _permit = semaphore.acquire_owned().await.map_err(|e| {
                        LeicaError::WorkerFailed {
                            reason: format!("admission semaphore closed: {}", e),
                        }
                    })?;

                    let current = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                    peak_in_flight.fetch_max(current, Ordering::SeqCst);

                    let result = task::spawn_blocking(move || {
                        process_station(&station, &angle, &zenith, &distance)
                    })
                    .await
                    .map_err(|e| LeicaError::WorkerFailed {
                        reason: e.to_string(),
                    })?;

                    in_flight.fetch_sub(1, Ordering::SeqCst);
                    progress.inc(1);
                    result
                }
            })
            .buffer_unordered(worker_count)
            .collect()
            .await;

        progress.finish_with_message("All station triples processed");

        // The barrier has passed; only now surface the first failure.
        let batches: Vec<StationBatch> = results.into_iter().collect::<Result<_>>()?;

        stats.stations_processed = batches.len();
        stats.max_in_flight = peak_in_flight.load(Ordering::SeqCst);

        let batches = sort_by_first_timestamp(batches)?;
        Ok((batches, stats))
    }
}

/// Order batches ascending by the timestamp of their first record.
fn sort_by_first_timestamp(batches: Vec<StationBatch>) -> Result<Vec<StationBatch>> {
    let mut keyed: Vec<(NaiveDateTime, StationBatch)> = batches
        .into_iter()
        .map(|batch| Ok((batch.first_timestamp()?, batch)))
        .collect::<Result<_>>()?;
    keyed.sort_by_key(|(timestamp, _)| *timestamp);
    Ok(keyed.into_iter().map(|(_, batch)| batch).collect())
}

fn create_progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );
    pb.set_message("Processing station triples");
    pb
}

/// Run one complete extraction: discover, process, order, report.
pub async fn run_extraction(config: &ExtractorConfig) -> Result<ExtractionStats> {
    let start_time = Instant::now();

    config.validate()?;
    config.ensure_output_dir()?;

    println!(
        "{}",
        "Starting Leica round extraction".bright_green().bold()
    );
    println!(
        "  {} {}",
        "Source:".bright_cyan(),
        config.input_path.display()
    );
    println!(
        "  {} {}",
        "Output:".bright_cyan(),
        config.output_dir.display()
    );

    let stations = FileDiscovery::new(config.input_path.clone()).discover()?;
    let stations_discovered = stations.len();
    println!(
        "  {} {} station directories",
        "Found".bright_green(),
        stations_discovered.to_string().bright_white().bold()
    );

    let runner = ConcurrentBatchRunner::new(config.max_workers);
    let (batches, runner_stats) = runner.run(stations).await?;

    let records_merged = batches.iter().map(|b| b.records.len()).sum();
    let report_path = config.report_path();
    write_report(&report_path, &batches)?;

    let stats = ExtractionStats {
        stations_discovered,
        stations_processed: runner_stats.stations_processed,
        stations_skipped: runner_stats.stations_skipped,
        records_merged,
        max_in_flight: runner_stats.max_in_flight,
        processing_time: start_time.elapsed(),
        output_path: report_path,
    };

    println!("\n{}", "Extraction Summary".bright_green().bold());
    println!(
        "  {} {}",
        "Stations processed:".bright_cyan(),
        stats.stations_processed.to_string().bright_white()
    );
    if stats.stations_skipped > 0 {
        println!(
            "  {} {}",
            "Stations skipped:".bright_yellow(),
            stats.stations_skipped.to_string().bright_white()
        );
    }
    println!(
        "  {} {}",
        "Records merged:".bright_cyan(),
        stats.records_merged.to_string().bright_white().bold()
    );
    println!(
        "  {} {}",
        "Report:".bright_cyan(),
        stats.output_path.display()
    );
    println!(
        "  {} {:.2}s",
        "Time elapsed:".bright_cyan(),
        stats.processing_time.as_secs_f64()
    );

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    /// Write a complete station triple: two targets over one round, fully
    /// matched across the three files.
    fn write_station(root: &Path, name: &str, date: &str, time: &str) -> PathBuf {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();

        fs::write(
            dir.join("round.TPT"),
            format!(
                "{name},1,1,X,1.5500\n\
                 HDR,Date={date},Time={time}\n\
                 1\n\
                 T1,120.1111,300.1112\n\
                 T2,130.2222,310.2223\n\
                 END\n"
            ),
        )
        .unwrap();

        fs::write(
            dir.join("round.TZT"),
            format!(
                "{name},1,1,X,1.5500\n\
                 HDR,Date={date},Time={time}\n\
                 1\n\
                 T1,89.5000,270.5000,1.200\n\
                 T2,88.4000,271.6000,1.300\n\
                 END\n"
            ),
        )
        .unwrap();

        fs::write(
            dir.join("round.TXT"),
            format!(
                "{name},X,1.5500\n\
                 HDR,Date={date},Mode=IR,Time={time}\n\
                 Dist Start,1\n\
                 1,T1,25.1234\n\
                 1,T2,30.4567\n\
                 Dist End,1\n\
                 SUM\n"
            ),
        )
        .unwrap();

        dir
    }

    fn discover(root: &Path) -> BTreeMap<String, StationFiles> {
        FileDiscovery::new(root.to_path_buf()).discover().unwrap()
    }

    #[test]
    fn test_process_station_merges_triple() {
        let temp = TempDir::new().unwrap();
        let dir = write_station(temp.path(), "ST01", "2024-01-02", "10:00:00");

        let batch = process_station(
            "ST01",
            &dir.join("round.TPT"),
            &dir.join("round.TZT"),
            &dir.join("round.TXT"),
        )
        .unwrap();

        assert_eq!(batch.station, "ST01");
        assert_eq!(batch.records.len(), 2);
        let rec = &batch.records[0];
        assert_eq!(rec.target_name, "T1");
        assert_eq!(rec.target_height.as_deref(), Some("1.200"));
        assert_eq!(rec.zenith_left.as_deref(), Some("89.5000"));
        assert_eq!(rec.slope_distance.as_deref(), Some("25.1234"));
    }

    #[tokio::test]
    async fn test_batches_ordered_by_first_timestamp() {
        let temp = TempDir::new().unwrap();
        write_station(temp.path(), "A", "2024-01-02", "10:00:00");
        write_station(temp.path(), "B", "2024-01-01", "09:00:00");
        write_station(temp.path(), "C", "2024-01-03", "08:00:00");

        let runner = ConcurrentBatchRunner::new(4);
        let (batches, stats) = runner.run(discover(temp.path())).await.unwrap();

        let order: Vec<&str> = batches.iter().map(|b| b.station.as_str()).collect();
        assert_eq!(order, vec!["B", "A", "C"]);
        assert_eq!(stats.stations_processed, 3);
        assert_eq!(stats.stations_skipped, 0);
    }

    #[tokio::test]
    async fn test_incomplete_triples_are_skipped_without_error() {
        let temp = TempDir::new().unwrap();
        write_station(temp.path(), "FULL", "2024-01-01", "09:00:00");

        // A station with only angle and distance files.
        let partial = temp.path().join("PARTIAL");
        fs::create_dir_all(&partial).unwrap();
        fs::write(partial.join("round.TPT"), "x").unwrap();
        fs::write(partial.join("round.TXT"), "x").unwrap();

        let runner = ConcurrentBatchRunner::new(4);
        let (batches, stats) = runner.run(discover(temp.path())).await.unwrap();

        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].station, "FULL");
        assert_eq!(stats.stations_skipped, 1);
    }

    #[tokio::test]
    async fn test_admission_limit_is_never_exceeded() {
        let temp = TempDir::new().unwrap();
        for i in 0..6 {
            write_station(
                temp.path(),
                &format!("ST{:02}", i),
                "2024-01-01",
                &format!("09:0{}:00", i),
            );
        }

        let limit = 2;
        let runner = ConcurrentBatchRunner::new(limit);
        let (batches, stats) = runner.run(discover(temp.path())).await.unwrap();

        assert_eq!(batches.len(), 6);
        assert!(stats.max_in_flight >= 1);
        assert!(
            stats.max_in_flight <= limit,
            "{} workers held admission slots at once (limit {})",
            stats.max_in_flight,
            limit
        );
    }

    #[tokio::test]
    async fn test_unparsable_timestamp_aborts_run() {
        let temp = TempDir::new().unwrap();
        write_station(temp.path(), "BAD", "02/01/2024", "10:00:00");

        let runner = ConcurrentBatchRunner::new(4);
        let err = runner.run(discover(temp.path())).await.unwrap_err();
        assert!(matches!(err, LeicaError::DataIntegrity { .. }));
    }

    #[tokio::test]
    async fn test_corrupt_file_aborts_whole_run() {
        let temp = TempDir::new().unwrap();
        write_station(temp.path(), "GOOD", "2024-01-01", "09:00:00");

        let corrupt = temp.path().join("CORRUPT");
        fs::create_dir_all(&corrupt).unwrap();
        fs::write(corrupt.join("round.TPT"), "only one row\n").unwrap();
        fs::write(corrupt.join("round.TZT"), "only one row\n").unwrap();
        fs::write(corrupt.join("round.TXT"), "only one row\n").unwrap();

        let runner = ConcurrentBatchRunner::new(4);
        let err = runner.run(discover(temp.path())).await.unwrap_err();
        assert!(matches!(err, LeicaError::InvalidFormat { .. }));
    }

    #[tokio::test]
    async fn test_empty_station_map_yields_no_batches() {
        let runner = ConcurrentBatchRunner::new(4);
        let (batches, stats) = runner.run(BTreeMap::new()).await.unwrap();
        assert!(batches.is_empty());
        assert_eq!(stats.stations_processed, 0);
        assert_eq!(stats.max_in_flight, 0);
    }
}
