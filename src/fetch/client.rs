use reqwest::Client;
use serde_json::Value;

use crate::error::{PipelineError, Result};
use crate::models::City;
use crate::utils::constants::{HOURLY_METRICS, OPEN_METEO_URL};

/// Source of hourly air-quality payloads.
///
/// The production implementation talks to Open-Meteo; tests substitute a
/// fake. The client owns its HTTP handle and is passed into the fetcher
/// explicitly rather than held as ambient state.
pub trait AirQualityApi {
    fn hourly_air_quality(
        &self,
        city: &City,
    ) -> impl std::future::Future<Output = Result<Value>> + Send;
}

#[derive(Debug, Clone)]
pub struct OpenMeteoClient {
    client: Client,
    base_url: String,
}

impl OpenMeteoClient {
    pub fn new(client: Client) -> Self {
        Self::with_base_url(client, OPEN_METEO_URL)
    }

    pub fn with_base_url(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.to_string(),
        }
    }
}

impl AirQualityApi for OpenMeteoClient {
    async fn hourly_air_quality(&self, city: &City) -> Result<Value> {
        tracing::debug!(city = %city.name, url = %self.base_url, "making air quality request");

        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("latitude", city.latitude.to_string()),
                ("longitude", city.longitude.to_string()),
                ("hourly", HOURLY_METRICS.to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PipelineError::Transport(format!(
                "unexpected status {} from {}",
                status, self.base_url
            )));
        }

        Ok(response.json::<Value>().await?)
    }
}
