use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use serde_json::Value;

use crate::error::{PipelineError, Result};
use crate::models::City;

/// Persists each successful fetch as a timestamped, pretty-printed JSON
/// artifact. Artifacts are audit records: they are never overwritten or
/// deleted by the pipeline.
pub struct RawWriter {
    raw_dir: PathBuf,
}

impl RawWriter {
    pub fn new(raw_dir: &Path) -> Result<Self> {
        fs::create_dir_all(raw_dir)?;
        Ok(Self {
            raw_dir: raw_dir.to_path_buf(),
        })
    }

    /// Write the payload to `{city_lowercase}_raw_{YYYYMMDD_HHMMSS}.json`.
    ///
    /// Cities are fetched sequentially and the timestamp has second
    /// resolution, so names cannot collide within a run at this call
    /// volume.
    pub fn persist(&self, city: &City, payload: &Value) -> Result<PathBuf> {
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let path = self
            .raw_dir
            .join(format!("{}_raw_{}.json", city.file_stem(), timestamp));

        if path.exists() {
            return Err(PipelineError::Config(format!(
                "refusing to overwrite existing raw artifact {}",
                path.display()
            )));
        }

        fs::write(&path, serde_json::to_string_pretty(payload)?)?;
        Ok(path)
    }
}
