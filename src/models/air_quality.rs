use serde::{Deserialize, Serialize};

/// Hourly time series as returned under the `hourly` key of the
/// Open-Meteo air-quality API. Metric vectors are aligned to `time`;
/// individual readings may be null.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HourlySeries {
    #[serde(default)]
    pub time: Vec<String>,
    #[serde(default)]
    pub pm10: Vec<Option<f64>>,
    #[serde(default)]
    pub pm2_5: Vec<Option<f64>>,
    #[serde(default)]
    pub carbon_monoxide: Vec<Option<f64>>,
    #[serde(default)]
    pub nitrogen_dioxide: Vec<Option<f64>>,
    #[serde(default)]
    pub sulphur_dioxide: Vec<Option<f64>>,
    #[serde(default)]
    pub ozone: Vec<Option<f64>>,
    #[serde(default)]
    pub uv_index: Vec<Option<f64>>,
}

impl HourlySeries {
    fn metric_at(series: &[Option<f64>], index: usize) -> Option<f64> {
        series.get(index).copied().flatten()
    }

    pub fn pm10_at(&self, index: usize) -> Option<f64> {
        Self::metric_at(&self.pm10, index)
    }

    pub fn pm2_5_at(&self, index: usize) -> Option<f64> {
        Self::metric_at(&self.pm2_5, index)
    }

    pub fn carbon_monoxide_at(&self, index: usize) -> Option<f64> {
        Self::metric_at(&self.carbon_monoxide, index)
    }

    pub fn nitrogen_dioxide_at(&self, index: usize) -> Option<f64> {
        Self::metric_at(&self.nitrogen_dioxide, index)
    }

    pub fn sulphur_dioxide_at(&self, index: usize) -> Option<f64> {
        Self::metric_at(&self.sulphur_dioxide, index)
    }

    pub fn ozone_at(&self, index: usize) -> Option<f64> {
        Self::metric_at(&self.ozone, index)
    }

    pub fn uv_index_at(&self, index: usize) -> Option<f64> {
        Self::metric_at(&self.uv_index, index)
    }
}

/// AQI category derived from the pm2.5 concentration using the US EPA
/// breakpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AqiCategory {
    Good,
    Moderate,
    UnhealthyForSensitiveGroups,
    Unhealthy,
    VeryUnhealthy,
    Hazardous,
    Unknown,
}

impl AqiCategory {
    pub fn from_pm2_5(pm2_5: Option<f64>) -> Self {
        match pm2_5 {
            None => AqiCategory::Unknown,
            Some(v) if v <= 12.0 => AqiCategory::Good,
            Some(v) if v <= 35.4 => AqiCategory::Moderate,
            Some(v) if v <= 55.4 => AqiCategory::UnhealthyForSensitiveGroups,
            Some(v) if v <= 150.4 => AqiCategory::Unhealthy,
            Some(v) if v <= 250.4 => AqiCategory::VeryUnhealthy,
            Some(_) => AqiCategory::Hazardous,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AqiCategory::Good => "Good",
            AqiCategory::Moderate => "Moderate",
            AqiCategory::UnhealthyForSensitiveGroups => "Unhealthy for Sensitive Groups",
            AqiCategory::Unhealthy => "Unhealthy",
            AqiCategory::VeryUnhealthy => "Very Unhealthy",
            AqiCategory::Hazardous => "Hazardous",
            AqiCategory::Unknown => "Unknown",
        }
    }
}

/// Risk flag derived from the severity score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskFlag {
    Low,
    Moderate,
    High,
}

impl RiskFlag {
    pub fn from_severity(severity: f64) -> Self {
        if severity >= 3.0 {
            RiskFlag::High
        } else if severity >= 1.5 {
            RiskFlag::Moderate
        } else {
            RiskFlag::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskFlag::Low => "Low",
            RiskFlag::Moderate => "Moderate",
            RiskFlag::High => "High",
        }
    }
}

/// Composite severity score over the main pollutants, each normalised by
/// its moderate-level threshold. Missing readings contribute nothing.
pub fn severity_score(
    pm2_5: Option<f64>,
    pm10: Option<f64>,
    nitrogen_dioxide: Option<f64>,
    ozone: Option<f64>,
) -> f64 {
    let score = pm2_5.unwrap_or(0.0) / 25.0
        + pm10.unwrap_or(0.0) / 50.0
        + nitrogen_dioxide.unwrap_or(0.0) / 40.0
        + ozone.unwrap_or(0.0) / 100.0;

    (score * 100.0).round() / 100.0
}

/// One staged row per (city, hour), as written to and read from the
/// staged CSV dataset. Column headers `AQI`, `severity` and `risk` match
/// the transform-stage naming and are renamed for the sink schema by
/// [`SinkRecord::from`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StagedRow {
    pub city: String,
    pub time: String,
    pub pm10: Option<f64>,
    pub pm2_5: Option<f64>,
    pub carbon_monoxide: Option<f64>,
    pub nitrogen_dioxide: Option<f64>,
    pub sulphur_dioxide: Option<f64>,
    pub ozone: Option<f64>,
    pub uv_index: Option<f64>,
    #[serde(rename = "AQI")]
    pub aqi: String,
    pub severity: Option<f64>,
    pub risk: String,
    pub hour: u32,
}

/// One row in the sink table, with transform-stage columns renamed to
/// the sink schema. `Option` fields serialise as explicit JSON nulls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SinkRecord {
    pub city: String,
    pub time: String,
    pub pm10: Option<f64>,
    pub pm2_5: Option<f64>,
    pub carbon_monoxide: Option<f64>,
    pub nitrogen_dioxide: Option<f64>,
    pub sulphur_dioxide: Option<f64>,
    pub ozone: Option<f64>,
    pub uv_index: Option<f64>,
    pub aqi_category: String,
    pub severity_score: Option<f64>,
    pub risk_flag: String,
    pub hour: u32,
}

impl From<StagedRow> for SinkRecord {
    fn from(row: StagedRow) -> Self {
        Self {
            city: row.city,
            time: row.time,
            pm10: row.pm10,
            pm2_5: row.pm2_5,
            carbon_monoxide: row.carbon_monoxide,
            nitrogen_dioxide: row.nitrogen_dioxide,
            sulphur_dioxide: row.sulphur_dioxide,
            ozone: row.ozone,
            uv_index: row.uv_index,
            aqi_category: row.aqi,
            severity_score: row.severity,
            risk_flag: row.risk,
            hour: row.hour,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aqi_category_breakpoints() {
        assert_eq!(AqiCategory::from_pm2_5(Some(5.0)), AqiCategory::Good);
        assert_eq!(AqiCategory::from_pm2_5(Some(12.0)), AqiCategory::Good);
        assert_eq!(AqiCategory::from_pm2_5(Some(20.0)), AqiCategory::Moderate);
        assert_eq!(
            AqiCategory::from_pm2_5(Some(40.0)),
            AqiCategory::UnhealthyForSensitiveGroups
        );
        assert_eq!(AqiCategory::from_pm2_5(Some(100.0)), AqiCategory::Unhealthy);
        assert_eq!(
            AqiCategory::from_pm2_5(Some(200.0)),
            AqiCategory::VeryUnhealthy
        );
        assert_eq!(AqiCategory::from_pm2_5(Some(300.0)), AqiCategory::Hazardous);
        assert_eq!(AqiCategory::from_pm2_5(None), AqiCategory::Unknown);
    }

    #[test]
    fn test_risk_flag_thresholds() {
        assert_eq!(RiskFlag::from_severity(0.4), RiskFlag::Low);
        assert_eq!(RiskFlag::from_severity(1.5), RiskFlag::Moderate);
        assert_eq!(RiskFlag::from_severity(3.0), RiskFlag::High);
    }

    #[test]
    fn test_severity_score_handles_missing_terms() {
        let full = severity_score(Some(25.0), Some(50.0), Some(40.0), Some(100.0));
        assert!((full - 4.0).abs() < f64::EPSILON);

        let sparse = severity_score(Some(50.0), None, None, None);
        assert!((sparse - 2.0).abs() < f64::EPSILON);

        assert_eq!(severity_score(None, None, None, None), 0.0);
    }

    #[test]
    fn test_sink_record_renames_columns() {
        let row = StagedRow {
            city: "Delhi".to_string(),
            time: "2024-06-01T14:00:00".to_string(),
            pm10: Some(80.0),
            pm2_5: Some(42.0),
            carbon_monoxide: None,
            nitrogen_dioxide: Some(31.0),
            sulphur_dioxide: Some(8.0),
            ozone: Some(55.0),
            uv_index: Some(6.5),
            aqi: "Unhealthy for Sensitive Groups".to_string(),
            severity: Some(2.6),
            risk: "Moderate".to_string(),
            hour: 14,
        };

        let record = SinkRecord::from(row);
        assert_eq!(record.aqi_category, "Unhealthy for Sensitive Groups");
        assert_eq!(record.severity_score, Some(2.6));
        assert_eq!(record.risk_flag, "Moderate");
        assert_eq!(record.carbon_monoxide, None);

        let json = serde_json::to_value(&record).unwrap();
        assert!(json["carbon_monoxide"].is_null());
    }

    #[test]
    fn test_hourly_series_ragged_vectors() {
        let series = HourlySeries {
            time: vec!["2024-06-01T00:00".to_string(), "2024-06-01T01:00".to_string()],
            pm2_5: vec![Some(10.0)],
            ..Default::default()
        };

        assert_eq!(series.pm2_5_at(0), Some(10.0));
        assert_eq!(series.pm2_5_at(1), None);
        assert_eq!(series.pm10_at(0), None);
    }
}
