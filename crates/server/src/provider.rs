//! Historical readings loaded from a JSON file.

use forecast_facade::{ForecastError, HistoricalDataProvider, HistoricalDataset, Reading, Result};
use serde::Deserialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Deserialize)]
#[serde(untagged)]
enum DatasetFile {
    Readings(Vec<Reading>),
    Wrapped { data: Vec<Reading> },
}

/// Reads `[{"timestamp": ms, "value": v}, ...]` or `{"data": [...]}` from
/// disk on every load. A missing file is an empty dataset.
#[derive(Debug, Clone)]
pub struct JsonFileProvider {
    path: PathBuf,
}

impl JsonFileProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl HistoricalDataProvider for JsonFileProvider {
    fn name(&self) -> &str {
        "json-file"
    }

    fn load(&self) -> Result<HistoricalDataset> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(path = %self.path.display(), "Dataset file not found");
                return Ok(HistoricalDataset::default());
            }
            Err(e) => {
                return Err(ForecastError::InvalidData(format!(
                    "cannot read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        let readings = match serde_json::from_str::<DatasetFile>(&contents) {
            Ok(DatasetFile::Readings(readings)) | Ok(DatasetFile::Wrapped { data: readings }) => {
                readings
            }
            Err(e) => {
                return Err(ForecastError::InvalidData(format!(
                    "malformed dataset {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        let dataset = HistoricalDataset::from_readings(readings);
        debug!(
            path = %self.path.display(),
            points = dataset.total_points,
            days = dataset.days,
            "Dataset loaded"
        );
        Ok(dataset)
    }
}
