use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime, Timelike};
use serde_json::Value;

use crate::error::{PipelineError, Result};
use crate::models::air_quality::severity_score;
use crate::models::{AqiCategory, City, HourlySeries, RiskFlag, StagedRow};
use crate::utils::constants::STAGED_PREFIX;
use crate::utils::latest_matching;

/// Stages the latest raw artifact of each city into one tabular CSV
/// dataset with derived fields (AQI category, severity, risk flag,
/// hour-of-day).
pub struct Transformer {
    raw_dir: PathBuf,
    staged_dir: PathBuf,
}

impl Transformer {
    pub fn new(raw_dir: &Path, staged_dir: &Path) -> Result<Self> {
        fs::create_dir_all(staged_dir)?;
        Ok(Self {
            raw_dir: raw_dir.to_path_buf(),
            staged_dir: staged_dir.to_path_buf(),
        })
    }

    /// Build staged rows from the latest raw artifact per city and write
    /// them to `air_quality_transformed_{timestamp}.csv`. Fails when no
    /// raw artifacts exist at all; a city without an artifact is skipped.
    pub fn transform_latest(&self, cities: &[City]) -> Result<PathBuf> {
        let mut rows = Vec::new();

        for city in cities {
            let prefix = format!("{}_raw_", city.file_stem());
            let Some(artifact) = latest_matching(&self.raw_dir, &prefix, ".json")? else {
                tracing::warn!(city = %city.name, "no raw artifact found, skipping");
                continue;
            };

            tracing::info!(city = %city.name, artifact = %artifact.display(), "staging raw artifact");
            let payload: Value = serde_json::from_str(&fs::read_to_string(&artifact)?)?;
            rows.extend(self.stage_city(city, &payload)?);
        }

        if rows.is_empty() {
            return Err(PipelineError::MissingInput(format!(
                "no raw artifacts found in {}; run extract first",
                self.raw_dir.display()
            )));
        }

        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let staged_path = self
            .staged_dir
            .join(format!("{}_{}.csv", STAGED_PREFIX, timestamp));

        let mut writer = csv::Writer::from_path(&staged_path)?;
        for row in &rows {
            writer.serialize(row)?;
        }
        writer.flush()?;

        tracing::info!(rows = rows.len(), path = %staged_path.display(), "staged dataset written");
        Ok(staged_path)
    }

    fn stage_city(&self, city: &City, payload: &Value) -> Result<Vec<StagedRow>> {
        let hourly = payload.get("hourly").cloned().unwrap_or(Value::Null);
        let series: HourlySeries = serde_json::from_value(hourly).unwrap_or_default();

        let mut rows = Vec::with_capacity(series.time.len());
        for (index, time) in series.time.iter().enumerate() {
            rows.push(build_row(city, time, &series, index)?);
        }

        Ok(rows)
    }
}

fn build_row(city: &City, time: &str, series: &HourlySeries, index: usize) -> Result<StagedRow> {
    let pm2_5 = series.pm2_5_at(index);
    let pm10 = series.pm10_at(index);
    let nitrogen_dioxide = series.nitrogen_dioxide_at(index);
    let ozone = series.ozone_at(index);

    let severity = severity_score(pm2_5, pm10, nitrogen_dioxide, ozone);

    Ok(StagedRow {
        city: city.name.clone(),
        time: time.to_string(),
        pm10,
        pm2_5,
        carbon_monoxide: series.carbon_monoxide_at(index),
        nitrogen_dioxide,
        sulphur_dioxide: series.sulphur_dioxide_at(index),
        ozone,
        uv_index: series.uv_index_at(index),
        aqi: AqiCategory::from_pm2_5(pm2_5).as_str().to_string(),
        severity: Some(severity),
        risk: RiskFlag::from_severity(severity).as_str().to_string(),
        hour: hour_of_day(time)?,
    })
}

/// Open-Meteo timestamps come as `2024-06-01T13:00` (no seconds).
fn hour_of_day(time: &str) -> Result<u32> {
    let parsed = NaiveDateTime::parse_from_str(time, "%Y-%m-%dT%H:%M")
        .or_else(|_| NaiveDateTime::parse_from_str(time, "%Y-%m-%dT%H:%M:%S"))?;
    Ok(parsed.hour())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn write_artifact(raw_dir: &Path, name: &str, payload: &Value) {
        fs::write(raw_dir.join(name), serde_json::to_string(payload).unwrap()).unwrap();
    }

    #[test]
    fn test_transform_latest_derives_fields() {
        let dir = TempDir::new().unwrap();
        let raw_dir = dir.path().join("raw");
        let staged_dir = dir.path().join("staged");
        fs::create_dir_all(&raw_dir).unwrap();

        let payload = json!({
            "hourly": {
                "time": ["2024-06-01T00:00", "2024-06-01T13:00"],
                "pm10": [40.0, null],
                "pm2_5": [20.0, 160.0],
                "carbon_monoxide": [250.0, 300.0],
                "nitrogen_dioxide": [10.0, 20.0],
                "sulphur_dioxide": [5.0, 6.0],
                "ozone": [60.0, 80.0],
                "uv_index": [0.0, 7.5]
            }
        });
        write_artifact(&raw_dir, "delhi_raw_20240601_120000.json", &payload);

        let transformer = Transformer::new(&raw_dir, &staged_dir).unwrap();
        let staged = transformer
            .transform_latest(&[City::new("Delhi", 28.7041, 77.1025)])
            .unwrap();

        let mut reader = csv::Reader::from_path(&staged).unwrap();
        let rows: Vec<StagedRow> = reader.deserialize().collect::<std::result::Result<_, _>>().unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].city, "Delhi");
        assert_eq!(rows[0].hour, 0);
        assert_eq!(rows[0].aqi, "Moderate");
        // 20/25 + 40/50 + 10/40 + 60/100 = 2.45
        assert_eq!(rows[0].severity, Some(2.45));
        assert_eq!(rows[0].risk, "Moderate");

        assert_eq!(rows[1].hour, 13);
        assert_eq!(rows[1].pm10, None);
        assert_eq!(rows[1].aqi, "Very Unhealthy");
        assert_eq!(rows[1].risk, "High");
    }

    #[test]
    fn test_transform_latest_uses_newest_artifact_per_city() {
        let dir = TempDir::new().unwrap();
        let raw_dir = dir.path().join("raw");
        let staged_dir = dir.path().join("staged");
        fs::create_dir_all(&raw_dir).unwrap();

        let stale = json!({"hourly": {"time": ["2024-05-01T00:00"], "pm2_5": [1.0]}});
        let fresh = json!({"hourly": {"time": ["2024-06-01T00:00"], "pm2_5": [2.0]}});
        write_artifact(&raw_dir, "delhi_raw_20240501_090000.json", &stale);
        write_artifact(&raw_dir, "delhi_raw_20240601_090000.json", &fresh);

        let transformer = Transformer::new(&raw_dir, &staged_dir).unwrap();
        let staged = transformer
            .transform_latest(&[City::new("Delhi", 28.7041, 77.1025)])
            .unwrap();

        let mut reader = csv::Reader::from_path(&staged).unwrap();
        let rows: Vec<StagedRow> = reader.deserialize().collect::<std::result::Result<_, _>>().unwrap();

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].time, "2024-06-01T00:00");
        assert_eq!(rows[0].pm2_5, Some(2.0));
    }

    #[test]
    fn test_transform_latest_fails_without_artifacts() {
        let dir = TempDir::new().unwrap();
        let raw_dir = dir.path().join("raw");
        let staged_dir = dir.path().join("staged");
        fs::create_dir_all(&raw_dir).unwrap();

        let transformer = Transformer::new(&raw_dir, &staged_dir).unwrap();
        let result = transformer.transform_latest(&[City::new("Delhi", 28.7041, 77.1025)]);

        assert!(matches!(result, Err(PipelineError::MissingInput(_))));
    }
}
