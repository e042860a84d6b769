use std::env;
use std::path::{Path, PathBuf};

use validator::Validate;

use crate::error::{PipelineError, Result};
use crate::models::City;

/// Runtime settings shared by the pipeline stages.
///
/// Directory layout follows the original data lake convention:
/// `data/raw` for fetched artifacts, `data/staged` for transformed CSV
/// datasets and `data/processed` for analysis outputs.
#[derive(Debug, Clone)]
pub struct Settings {
    pub raw_dir: PathBuf,
    pub staged_dir: PathBuf,
    pub processed_dir: PathBuf,
    pub cities: Vec<City>,
}

impl Settings {
    pub fn new(data_dir: &Path) -> Result<Self> {
        Self::with_cities(data_dir, City::default_cities())
    }

    pub fn with_cities(data_dir: &Path, cities: Vec<City>) -> Result<Self> {
        for city in &cities {
            city.validate()?;
        }

        Ok(Self {
            raw_dir: data_dir.join("raw"),
            staged_dir: data_dir.join("staged"),
            processed_dir: data_dir.join("processed"),
            cities,
        })
    }
}

/// Credentials for the Supabase sink, read from the environment.
///
/// Absence of either value is a fatal configuration error, never a
/// retryable condition.
#[derive(Debug, Clone)]
pub struct SinkCredentials {
    pub url: String,
    pub key: String,
}

impl SinkCredentials {
    pub const URL_VAR: &'static str = "SUPABASE_URL";
    pub const KEY_VAR: &'static str = "SUPABASE_KEY";

    pub fn from_env() -> Result<Self> {
        let url = Self::required(Self::URL_VAR)?;
        let key = Self::required(Self::KEY_VAR)?;
        Ok(Self { url, key })
    }

    fn required(name: &str) -> Result<String> {
        match env::var(name) {
            Ok(value) if !value.trim().is_empty() => Ok(value),
            _ => Err(PipelineError::Config(format!(
                "{} is not set; add it to the environment before running",
                name
            ))),
        }
    }
}
