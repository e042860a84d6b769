use std::path::Path;

use chrono::NaiveDateTime;

use crate::error::{PipelineError, Result};
use crate::models::StagedRow;

/// Reads a staged CSV dataset into memory and normalises it for the
/// sink: timestamps are canonicalised to one string representation and
/// NaN readings become explicit nulls. The sink must receive nulls,
/// never the literal string "NaN".
pub struct StagedReader;

impl StagedReader {
    pub fn new() -> Self {
        Self
    }

    pub fn read(&self, path: &Path) -> Result<Vec<StagedRow>> {
        if !path.is_file() {
            return Err(PipelineError::MissingInput(format!(
                "staged dataset not found at {}",
                path.display()
            )));
        }

        let mut reader = csv::Reader::from_path(path)?;
        let mut rows = Vec::new();
        for record in reader.deserialize() {
            let mut row: StagedRow = record?;
            normalize_row(&mut row);
            rows.push(row);
        }

        if rows.is_empty() {
            return Err(PipelineError::MissingInput(format!(
                "staged dataset {} is empty",
                path.display()
            )));
        }

        Ok(rows)
    }
}

impl Default for StagedReader {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize_row(row: &mut StagedRow) {
    row.time = canonical_time(&row.time);

    for field in [
        &mut row.pm10,
        &mut row.pm2_5,
        &mut row.carbon_monoxide,
        &mut row.nitrogen_dioxide,
        &mut row.sulphur_dioxide,
        &mut row.ozone,
        &mut row.uv_index,
        &mut row.severity,
    ] {
        if field.is_some_and(f64::is_nan) {
            *field = None;
        }
    }
}

/// Canonical ISO-8601 string with seconds. Unparseable values are kept
/// verbatim rather than dropped; the sink rejects them per row.
fn canonical_time(raw: &str) -> String {
    let raw = raw.trim();
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(raw, format) {
            return parsed.format("%Y-%m-%dT%H:%M:%S").to_string();
        }
    }
    raw.to_string()
}
