use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde_json::Value;

use crate::config::SinkCredentials;
use crate::error::{PipelineError, Result};
use crate::models::SinkRecord;
use crate::utils::constants::AIR_QUALITY_TABLE;

/// Destination table for staged rows.
///
/// The production implementation is PostgREST over HTTP (Supabase);
/// tests substitute a fake. The client is constructed explicitly and
/// injected into the loader and analyzer.
pub trait SinkClient {
    fn insert_batch(
        &self,
        rows: &[SinkRecord],
    ) -> impl std::future::Future<Output = Result<()>> + Send;

    fn fetch_all(&self) -> impl std::future::Future<Output = Result<Vec<SinkRecord>>> + Send;
}

#[derive(Debug, Clone)]
pub struct SupabaseSink {
    client: Client,
    table_url: String,
    api_key: String,
}

impl SupabaseSink {
    pub fn new(client: Client, credentials: &SinkCredentials) -> Self {
        Self::with_table(client, credentials, AIR_QUALITY_TABLE)
    }

    pub fn with_table(client: Client, credentials: &SinkCredentials, table: &str) -> Self {
        Self {
            client,
            table_url: format!("{}/rest/v1/{}", credentials.url.trim_end_matches('/'), table),
            api_key: credentials.key.clone(),
        }
    }

    fn headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        let key = HeaderValue::from_str(&self.api_key)
            .map_err(|_| PipelineError::Config("sink API key contains invalid characters".to_string()))?;
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.api_key))
            .map_err(|_| PipelineError::Config("sink API key contains invalid characters".to_string()))?;

        headers.insert("apikey", key);
        headers.insert(AUTHORIZATION, bearer);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }
}

impl SinkClient for SupabaseSink {
    async fn insert_batch(&self, rows: &[SinkRecord]) -> Result<()> {
        let response = self
            .client
            .post(&self.table_url)
            .headers(self.headers()?)
            .header("Prefer", "return=minimal")
            .json(rows)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(PipelineError::Sink(format!(
                "insert rejected with status {}: {}",
                status,
                body.trim()
            )));
        }

        // PostgREST can answer 2xx and still carry an error object when
        // a proxy or RPC layer intervenes; treat that as a failure too.
        if let Some(message) = inline_error(&body) {
            return Err(PipelineError::Sink(format!("insert error: {}", message)));
        }

        Ok(())
    }

    async fn fetch_all(&self) -> Result<Vec<SinkRecord>> {
        let response = self
            .client
            .get(&self.table_url)
            .headers(self.headers()?)
            .query(&[("select", "*")])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::Sink(format!(
                "select rejected with status {}: {}",
                status,
                body.trim()
            )));
        }

        Ok(response.json::<Vec<SinkRecord>>().await?)
    }
}

fn inline_error(body: &str) -> Option<String> {
    if body.trim().is_empty() {
        return None;
    }

    let value: Value = serde_json::from_str(body).ok()?;
    let error = value.get("error")?;
    if error.is_null() {
        return None;
    }

    match error.get("message").and_then(Value::as_str) {
        Some(message) => Some(message.to_string()),
        None => Some(error.to_string()),
    }
}
