use std::time::Duration;

/// Open-Meteo air-quality API endpoint.
pub const OPEN_METEO_URL: &str = "https://air-quality-api.open-meteo.com/v1/air-quality";

/// Comma-joined metric list requested from the API.
pub const HOURLY_METRICS: &str =
    "pm10,pm2_5,carbon_monoxide,nitrogen_dioxide,ozone,sulphur_dioxide,uv_index";

/// Sink table holding the loaded rows.
pub const AIR_QUALITY_TABLE: &str = "air_quality_data";

/// Filename prefix of staged datasets.
pub const STAGED_PREFIX: &str = "air_quality_transformed";

/// HTTP attempts per city before reporting fetch failure.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Fixed wait between fetch attempts.
pub const FETCH_RETRY_DELAY: Duration = Duration::from_secs(2);

/// Maximum rows per insert batch.
pub const DEFAULT_BATCH_SIZE: usize = 200;

/// Additional attempts per batch after the initial insert fails.
pub const BATCH_MAX_RETRIES: u32 = 2;

/// Fixed wait between batch insert attempts.
pub const BATCH_RETRY_DELAY: Duration = Duration::from_secs(3);

/// Bound on any single HTTP request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
