use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{PipelineError, Result};
use crate::load::sink::SinkClient;
use crate::models::SinkRecord;

/// Aggregate KPIs over the loaded rows.
#[derive(Debug, Clone, PartialEq)]
pub struct KpiSummary {
    pub highest_pm25_city: String,
    pub highest_pm25_value: f64,
    pub highest_severity_city: String,
    pub highest_severity_value: f64,
    pub worst_hour: u32,
    pub worst_hour_severity: f64,
}

impl KpiSummary {
    pub fn summary(&self) -> String {
        format!(
            "Highest PM2.5: {} ({:.2}); highest severity: {} ({:.2}); worst hour of day: {:02}:00 ({:.2})",
            self.highest_pm25_city,
            self.highest_pm25_value,
            self.highest_severity_city,
            self.highest_severity_value,
            self.worst_hour,
            self.worst_hour_severity,
        )
    }
}

/// Risk-flag distribution in percent, sorted by descending share.
pub type RiskDistribution = Vec<(String, f64)>;

/// Computes KPI metrics and trend datasets from the sink table and
/// writes them as CSV files into the processed directory.
pub struct Analyzer {
    processed_dir: PathBuf,
}

impl Analyzer {
    pub fn new(processed_dir: &Path) -> Result<Self> {
        fs::create_dir_all(processed_dir)?;
        Ok(Self {
            processed_dir: processed_dir.to_path_buf(),
        })
    }

    /// Fetch all loaded rows, compute KPIs and write
    /// `summary_metrics.csv`, `city_risk_distribution.csv` and
    /// `pollution_trends.csv`. An empty sink table is fatal.
    pub async fn analyze<S: SinkClient>(&self, sink: &S) -> Result<KpiSummary> {
        tracing::info!("fetching air quality data from sink");
        let records = sink.fetch_all().await?;

        if records.is_empty() {
            return Err(PipelineError::MissingInput(
                "no data found in sink table; run load first".to_string(),
            ));
        }

        let kpis = compute_kpis(&records)?;
        let risk = risk_distribution(&records);

        self.write_summary_metrics(&kpis)?;
        self.write_risk_distribution(&risk)?;
        self.write_pollution_trends(&records)?;

        tracing::info!(rows = records.len(), dir = %self.processed_dir.display(), "analysis outputs written");
        Ok(kpis)
    }

    fn write_summary_metrics(&self, kpis: &KpiSummary) -> Result<()> {
        let metrics = [
            ("City with highest PM2.5", kpis.highest_pm25_city.clone()),
            ("Highest PM2.5 value", format!("{:.2}", kpis.highest_pm25_value)),
            ("City with highest severity", kpis.highest_severity_city.clone()),
            (
                "Highest severity value",
                format!("{:.2}", kpis.highest_severity_value),
            ),
            ("Worst hour of day (severity)", kpis.worst_hour.to_string()),
            (
                "Worst hour severity value",
                format!("{:.2}", kpis.worst_hour_severity),
            ),
        ];

        let mut writer = csv::Writer::from_path(self.processed_dir.join("summary_metrics.csv"))?;
        writer.write_record(["metric", "value"])?;
        for (metric, value) in &metrics {
            writer.write_record([*metric, value.as_str()])?;
        }
        writer.flush()?;
        Ok(())
    }

    fn write_risk_distribution(&self, risk: &RiskDistribution) -> Result<()> {
        let mut writer =
            csv::Writer::from_path(self.processed_dir.join("city_risk_distribution.csv"))?;
        writer.write_record(["risk_flag", "percentage"])?;
        for (flag, percentage) in risk {
            let percentage = format!("{:.2}", percentage);
            writer.write_record([flag.as_str(), percentage.as_str()])?;
        }
        writer.flush()?;
        Ok(())
    }

    fn write_pollution_trends(&self, records: &[SinkRecord]) -> Result<()> {
        let mut trends: Vec<&SinkRecord> = records.iter().collect();
        trends.sort_by(|a, b| a.time.cmp(&b.time));

        let mut writer = csv::Writer::from_path(self.processed_dir.join("pollution_trends.csv"))?;
        writer.write_record(["city", "time", "pm2_5", "pm10", "ozone"])?;
        for record in trends {
            let pm2_5 = optional_cell(record.pm2_5);
            let pm10 = optional_cell(record.pm10);
            let ozone = optional_cell(record.ozone);
            writer.write_record([
                record.city.as_str(),
                record.time.as_str(),
                pm2_5.as_str(),
                pm10.as_str(),
                ozone.as_str(),
            ])?;
        }
        writer.flush()?;
        Ok(())
    }
}

fn optional_cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Mean of an optional metric grouped by key, returning the maximal
/// group. Rows without a reading do not contribute to their group mean.
fn max_group_mean<K, F, V>(records: &[SinkRecord], key: F, value: V) -> Option<(K, f64)>
where
    K: std::hash::Hash + Eq + Ord + Clone,
    F: Fn(&SinkRecord) -> K,
    V: Fn(&SinkRecord) -> Option<f64>,
{
    let mut groups: HashMap<K, (f64, usize)> = HashMap::new();
    for record in records {
        if let Some(v) = value(record) {
            let entry = groups.entry(key(record)).or_insert((0.0, 0));
            entry.0 += v;
            entry.1 += 1;
        }
    }

    groups
        .into_iter()
        .map(|(k, (sum, count))| (k, sum / count as f64))
        // Ties break on the key so the result is deterministic.
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal).then_with(|| b.0.cmp(&a.0)))
}

pub fn compute_kpis(records: &[SinkRecord]) -> Result<KpiSummary> {
    let (highest_pm25_city, highest_pm25_value) =
        max_group_mean(records, |r| r.city.clone(), |r| r.pm2_5).ok_or_else(|| {
            PipelineError::MissingInput("no pm2_5 readings to analyze".to_string())
        })?;

    let (highest_severity_city, highest_severity_value) =
        max_group_mean(records, |r| r.city.clone(), |r| r.severity_score).ok_or_else(|| {
            PipelineError::MissingInput("no severity scores to analyze".to_string())
        })?;

    let (worst_hour, worst_hour_severity) =
        max_group_mean(records, |r| r.hour, |r| r.severity_score).ok_or_else(|| {
            PipelineError::MissingInput("no severity scores to analyze".to_string())
        })?;

    Ok(KpiSummary {
        highest_pm25_city,
        highest_pm25_value,
        highest_severity_city,
        highest_severity_value,
        worst_hour,
        worst_hour_severity,
    })
}

pub fn risk_distribution(records: &[SinkRecord]) -> RiskDistribution {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for record in records {
        *counts.entry(record.risk_flag.clone()).or_insert(0) += 1;
    }

    let total = records.len() as f64;
    let mut distribution: RiskDistribution = counts
        .into_iter()
        .map(|(flag, count)| (flag, ((count as f64 / total) * 10000.0).round() / 100.0))
        .collect();

    distribution.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.0.cmp(&b.0))
    });
    distribution
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(city: &str, hour: u32, pm2_5: Option<f64>, severity: Option<f64>, risk: &str) -> SinkRecord {
        SinkRecord {
            city: city.to_string(),
            time: format!("2024-06-01T{:02}:00:00", hour),
            pm10: Some(40.0),
            pm2_5,
            carbon_monoxide: None,
            nitrogen_dioxide: Some(10.0),
            sulphur_dioxide: Some(5.0),
            ozone: Some(60.0),
            uv_index: Some(2.0),
            aqi_category: "Moderate".to_string(),
            severity_score: severity,
            risk_flag: risk.to_string(),
            hour,
        }
    }

    #[test]
    fn test_compute_kpis() {
        let records = vec![
            record("Delhi", 8, Some(80.0), Some(4.0), "High"),
            record("Delhi", 14, Some(120.0), Some(6.0), "High"),
            record("Mumbai", 8, Some(30.0), Some(1.0), "Low"),
            record("Mumbai", 14, Some(50.0), Some(2.0), "Moderate"),
        ];

        let kpis = compute_kpis(&records).unwrap();

        assert_eq!(kpis.highest_pm25_city, "Delhi");
        assert!((kpis.highest_pm25_value - 100.0).abs() < f64::EPSILON);
        assert_eq!(kpis.highest_severity_city, "Delhi");
        assert!((kpis.highest_severity_value - 5.0).abs() < f64::EPSILON);
        assert_eq!(kpis.worst_hour, 14);
        assert!((kpis.worst_hour_severity - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_compute_kpis_ignores_missing_readings() {
        let records = vec![
            record("Delhi", 8, None, Some(4.0), "High"),
            record("Mumbai", 9, Some(30.0), Some(1.0), "Low"),
        ];

        let kpis = compute_kpis(&records).unwrap();
        assert_eq!(kpis.highest_pm25_city, "Mumbai");
        assert_eq!(kpis.highest_severity_city, "Delhi");
    }

    #[test]
    fn test_risk_distribution_percentages() {
        let records = vec![
            record("Delhi", 8, Some(80.0), Some(4.0), "High"),
            record("Delhi", 9, Some(80.0), Some(4.0), "High"),
            record("Mumbai", 8, Some(30.0), Some(1.0), "Low"),
            record("Mumbai", 9, Some(30.0), Some(1.0), "Moderate"),
        ];

        let distribution = risk_distribution(&records);

        assert_eq!(distribution[0], ("High".to_string(), 50.0));
        assert_eq!(distribution[1], ("Low".to_string(), 25.0));
        assert_eq!(distribution[2], ("Moderate".to_string(), 25.0));
    }

    #[tokio::test]
    async fn test_analyzer_writes_csv_outputs() {
        use crate::error::Result;
        use tempfile::TempDir;

        struct StaticSink(Vec<SinkRecord>);

        impl SinkClient for StaticSink {
            async fn insert_batch(&self, _rows: &[SinkRecord]) -> Result<()> {
                Ok(())
            }

            async fn fetch_all(&self) -> Result<Vec<SinkRecord>> {
                Ok(self.0.clone())
            }
        }

        let dir = TempDir::new().unwrap();
        let analyzer = Analyzer::new(dir.path()).unwrap();
        let sink = StaticSink(vec![
            record("Delhi", 8, Some(80.0), Some(4.0), "High"),
            record("Mumbai", 9, Some(30.0), Some(1.0), "Low"),
        ]);

        let kpis = analyzer.analyze(&sink).await.unwrap();
        assert_eq!(kpis.highest_pm25_city, "Delhi");

        for name in [
            "summary_metrics.csv",
            "city_risk_distribution.csv",
            "pollution_trends.csv",
        ] {
            assert!(dir.path().join(name).exists(), "{} should exist", name);
        }

        let trends = fs::read_to_string(dir.path().join("pollution_trends.csv")).unwrap();
        let mut lines = trends.lines();
        assert_eq!(lines.next(), Some("city,time,pm2_5,pm10,ozone"));
        assert!(lines.next().unwrap().starts_with("Delhi,2024-06-01T08"));
    }

    #[tokio::test]
    async fn test_analyzer_empty_sink_is_fatal() {
        use crate::error::Result;
        use tempfile::TempDir;

        struct EmptySink;

        impl SinkClient for EmptySink {
            async fn insert_batch(&self, _rows: &[SinkRecord]) -> Result<()> {
                Ok(())
            }

            async fn fetch_all(&self) -> Result<Vec<SinkRecord>> {
                Ok(vec![])
            }
        }

        let dir = TempDir::new().unwrap();
        let analyzer = Analyzer::new(dir.path()).unwrap();

        let result = analyzer.analyze(&EmptySink).await;
        assert!(matches!(result, Err(PipelineError::MissingInput(_))));
    }
}
