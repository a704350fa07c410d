//! Station file discovery.
//!
//! Walks the input tree and groups export files by their immediate parent
//! directory, keyed by uppercased extension. A station is processable only
//! when its directory holds all three export variants.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::debug;
use walkdir::WalkDir;

use crate::error::{LeicaError, Result};

/// The export files discovered for one station directory.
#[derive(Debug, Clone, Default)]
pub struct StationFiles {
    /// Horizontal-angle export (`.TPT`).
    pub angle: Option<PathBuf>,
    /// Zenith export (`.TZT`).
    pub zenith: Option<PathBuf>,
    /// Distance export (`.TXT`).
    pub distance: Option<PathBuf>,
}

impl StationFiles {
    /// Return the file triple when all three exports are present.
    pub fn complete(&self) -> Option<(PathBuf, PathBuf, PathBuf)> {
        match (&self.angle, &self.zenith, &self.distance) {
            (Some(a), Some(z), Some(d)) => Some((a.clone(), z.clone(), d.clone())),
            _ => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.angle.is_some() && self.zenith.is_some() && self.distance.is_some()
    }
}

/// File discovery over one input tree.
#[derive(Debug)]
pub struct FileDiscovery {
    root: PathBuf,
}

impl FileDiscovery {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Walk the tree and group recognized export files by station directory
    /// name.
    ///
    /// Extensions match case-insensitively; when a directory holds two files
    /// with the same extension, the later one visited replaces the earlier.
    /// Returns stations in sorted name order.
    pub fn discover(&self) -> Result<BTreeMap<String, StationFiles>> {
        if !self.root.is_dir() {
            return Err(LeicaError::configuration(format!(
                "source path is not a directory: {}",
                self.root.display()
            )));
        }

        let mut stations: BTreeMap<String, StationFiles> = BTreeMap::new();

        for entry in WalkDir::new(&self.root).follow_links(false) {
            let entry = entry.map_err(std::io::Error::from)?;
            let path = entry.path();
            if !entry.file_type().is_file() {
                continue;
            }
            let Some(extension) = path.extension().and_then(|e| e.to_str()) else {
                continue;
            };
            let Some(station) = station_name(path) else {
                continue;
            };

            let files = stations.entry(station).or_default();
            match extension.to_uppercase().as_str() {
                "TPT" => files.angle = Some(path.to_path_buf()),
                "TZT" => files.zenith = Some(path.to_path_buf()),
                "TXT" => files.distance = Some(path.to_path_buf()),
                _ => {}
            }
        }

        // A directory whose files all had unrecognized extensions leaves an
        // empty entry behind; drop those.
        stations.retain(|_, files| {
            files.angle.is_some() || files.zenith.is_some() || files.distance.is_some()
        });

        debug!(
            "Discovered {} station directories under {}",
            stations.len(),
            self.root.display()
        );

        Ok(stations)
    }
}

/// Station name of a file: its immediate parent directory name.
fn station_name(path: &Path) -> Option<String> {
    path.parent()
        .and_then(|p| p.file_name())
        .and_then(|n| n.to_str())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), "test data").unwrap();
    }

    #[test]
    fn test_discover_groups_by_directory() {
        let temp = TempDir::new().unwrap();
        let st1 = temp.path().join("ST01");
        let st2 = temp.path().join("ST02");
        fs::create_dir_all(&st1).unwrap();
        fs::create_dir_all(&st2).unwrap();
        touch(&st1, "round.TPT");
        touch(&st1, "round.TZT");
        touch(&st1, "round.TXT");
        touch(&st2, "round.TPT");
        touch(&st2, "round.TXT");

        let stations = FileDiscovery::new(temp.path().to_path_buf())
            .discover()
            .unwrap();

        assert_eq!(stations.len(), 2);
        assert!(stations["ST01"].is_complete());
        assert!(!stations["ST02"].is_complete());
        assert!(stations["ST02"].zenith.is_none());
    }

    #[test]
    fn test_extension_matching_is_case_insensitive() {
        let temp = TempDir::new().unwrap();
        let st = temp.path().join("ST01");
        fs::create_dir_all(&st).unwrap();
        touch(&st, "round.tpt");
        touch(&st, "round.Tzt");
        touch(&st, "round.txt");

        let stations = FileDiscovery::new(temp.path().to_path_buf())
            .discover()
            .unwrap();
        assert!(stations["ST01"].is_complete());
    }

    #[test]
    fn test_unrecognized_files_are_ignored() {
        let temp = TempDir::new().unwrap();
        let st = temp.path().join("ST01");
        fs::create_dir_all(&st).unwrap();
        touch(&st, "notes.pdf");
        touch(&st, "readme");

        let stations = FileDiscovery::new(temp.path().to_path_buf())
            .discover()
            .unwrap();
        assert!(stations.is_empty());
    }

    #[test]
    fn test_nested_station_directories_are_found() {
        let temp = TempDir::new().unwrap();
        let st = temp.path().join("2024").join("week1").join("ST05");
        fs::create_dir_all(&st).unwrap();
        touch(&st, "round.TPT");
        touch(&st, "round.TZT");
        touch(&st, "round.TXT");

        let stations = FileDiscovery::new(temp.path().to_path_buf())
            .discover()
            .unwrap();
        assert_eq!(stations.len(), 1);
        assert!(stations["ST05"].is_complete());
    }

    #[test]
    fn test_missing_root_is_configuration_error() {
        let err = FileDiscovery::new(PathBuf::from("/no/such/tree"))
            .discover()
            .unwrap_err();
        assert!(matches!(err, LeicaError::Configuration { .. }));
    }

    #[test]
    fn test_stations_are_sorted_by_name() {
        let temp = TempDir::new().unwrap();
        for name in ["ST09", "ST01", "ST05"] {
            let dir = temp.path().join(name);
            fs::create_dir_all(&dir).unwrap();
            touch(&dir, "round.TPT");
        }

        let stations = FileDiscovery::new(temp.path().to_path_buf())
            .discover()
            .unwrap();
        let names: Vec<&String> = stations.keys().collect();
        assert_eq!(names, vec!["ST01", "ST05", "ST09"]);
    }
}
