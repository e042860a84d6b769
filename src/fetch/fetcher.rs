use std::path::PathBuf;
use std::time::Duration;

use serde_json::Value;

use crate::fetch::client::AirQualityApi;
use crate::fetch::raw_writer::RawWriter;
use crate::models::City;
use crate::utils::constants::{DEFAULT_MAX_ATTEMPTS, FETCH_RETRY_DELAY};

/// Retrying fetch loop for the air-quality API.
///
/// Transport and HTTP-status errors are retried with a fixed delay; a
/// 200 response without hourly data is terminal for that city after a
/// single attempt, since retrying cannot repopulate an empty payload.
pub struct Fetcher {
    max_attempts: u32,
    retry_delay: Duration,
}

impl Fetcher {
    pub fn new() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay: FETCH_RETRY_DELAY,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Fetch the hourly payload for one city, retrying transport errors
    /// up to `max_attempts`. Returns `None` on terminal failure; the
    /// caller decides what a missing city means for the run.
    pub async fn fetch_city<C: AirQualityApi>(&self, api: &C, city: &City) -> Option<Value> {
        for attempt in 1..=self.max_attempts {
            tracing::info!(
                city = %city.name,
                attempt,
                max_attempts = self.max_attempts,
                "requesting air quality data"
            );

            match api.hourly_air_quality(city).await {
                Ok(payload) => {
                    if has_hourly_series(&payload) {
                        return Some(payload);
                    }
                    // The server answered 200 with no data; the retry
                    // budget does not help here.
                    tracing::warn!(city = %city.name, "no hourly data found, empty response");
                    return None;
                }
                Err(e) => {
                    tracing::error!(city = %city.name, attempt, error = %e, "error fetching data");
                    if attempt < self.max_attempts {
                        tracing::info!(city = %city.name, delay = ?self.retry_delay, "retrying");
                        tokio::time::sleep(self.retry_delay).await;
                    } else {
                        tracing::error!(
                            city = %city.name,
                            attempts = self.max_attempts,
                            "failed to fetch data after all attempts"
                        );
                    }
                }
            }
        }

        None
    }

    /// Fetch and persist every configured city in order. A city whose
    /// fetch or write fails is simply absent from the returned paths;
    /// one city's outage never blocks collection for the others.
    pub async fn extract_cities<C: AirQualityApi>(
        &self,
        api: &C,
        cities: &[City],
        writer: &RawWriter,
    ) -> Vec<PathBuf> {
        let mut saved_files = Vec::new();

        for city in cities {
            let Some(payload) = self.fetch_city(api, city).await else {
                continue;
            };

            match writer.persist(city, &payload) {
                Ok(path) => {
                    tracing::info!(city = %city.name, path = %path.display(), "saved raw artifact");
                    saved_files.push(path);
                }
                Err(e) => {
                    tracing::error!(city = %city.name, error = %e, "failed to save raw artifact");
                }
            }
        }

        saved_files
    }
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::new()
    }
}

/// Mirror of the original truthiness check: the `hourly` key must be
/// present, non-null and a non-empty object.
fn has_hourly_series(payload: &Value) -> bool {
    payload
        .get("hourly")
        .and_then(Value::as_object)
        .map(|hourly| !hourly.is_empty())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_has_hourly_series() {
        assert!(has_hourly_series(&json!({
            "hourly": {"time": ["2024-06-01T00:00"], "pm2_5": [10.0]}
        })));
        assert!(!has_hourly_series(&json!({"hourly": {}})));
        assert!(!has_hourly_series(&json!({"hourly": null})));
        assert!(!has_hourly_series(&json!({"latitude": 28.7})));
    }
}
