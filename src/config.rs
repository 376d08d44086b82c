use std::fs;
use log::LevelFilter;
use serde::Deserialize;
use thiserror::Error;
use crate::manager_weather::Units;

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct General {
    pub log_path: Option<String>,
    pub log_level: LevelFilter,
    pub log_to_stdout: bool,
}

impl Default for General {
    fn default() -> Self {
        Self {
            log_path: None,
            log_level: LevelFilter::Info,
            log_to_stdout: true,
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct WeatherParameters {
    pub api_key: String,
    pub base_url: String,
    pub units: Units,
    pub timeout_secs: u64,
    pub max_response_bytes: usize,
    pub cities: Vec<String>,
}

impl Default for WeatherParameters {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "http://api.openweathermap.org/data/2.5".to_string(),
            units: Units::Metric,
            timeout_secs: 30,
            max_response_bytes: 1024 * 1024,
            cities: ["Lagos", "Abuja", "Ohio", "Georgia", "Houston"]
                .iter()
                .map(|c| c.to_string())
                .collect(),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct StorageParameters {
    pub bucket_name: String,
    pub region: String,
    pub key_prefix: String,
    pub endpoint_url: Option<String>,
    pub timeout_secs: u64,
}

impl Default for StorageParameters {
    fn default() -> Self {
        Self {
            bucket_name: String::new(),
            region: "us-east-1".to_string(),
            key_prefix: "weather-data".to_string(),
            endpoint_url: None,
            timeout_secs: 30,
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub general: General,
    pub weather: WeatherParameters,
    pub storage: StorageParameters,
}

/// Loads the configuration and returns a struct with all configuration items.
/// Values from the environment (and a `.env` file, if present) take precedence over the file.
///
/// # Arguments
///
/// * 'config_path' - optional path to a TOML configuration file
pub fn load_config(config_path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = match config_path {
        Some(path) => {
            let toml = fs::read_to_string(path)
                .map_err(|e| ConfigError::ReadError(format!("{}: {}", path, e)))?;
            parse_config(&toml)?
        },
        None => Config::default(),
    };

    let _ = dotenvy::dotenv();
    apply_env(&mut config, |key| std::env::var(key).ok());
    validate(&config)?;

    Ok(config)
}

/// Parses a TOML document into a configuration, missing items get their defaults
///
/// # Arguments
///
/// * 'toml' - the TOML document
fn parse_config(toml: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml).map_err(|e| ConfigError::ParseError(e.to_string()))
}

/// Overlays settings found through the lookup function onto the configuration.
/// Both the short names and the provider specific names are recognized, short names win.
///
/// # Arguments
///
/// * 'config' - configuration to update
/// * 'lookup' - function returning the value of a variable, if set
fn apply_env<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let first = |keys: &[&str]| keys.iter()
        .filter_map(|&k| lookup(k))
        .find(|v| !v.trim().is_empty());

    if let Some(v) = first(&["API_KEY", "OPENWEATHER_API_KEY"]) {
        config.weather.api_key = v;
    }
    if let Some(v) = first(&["BUCKET_NAME", "AWS_BUCKET_NAME"]) {
        config.storage.bucket_name = v;
    }
    if let Some(v) = first(&["REGION", "AWS_REGION"]) {
        config.storage.region = v;
    }
}

/// Checks that everything required for a run is present
///
/// # Arguments
///
/// * 'config' - configuration to check
fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.weather.api_key.trim().is_empty() {
        return Err(ConfigError::MissingSetting("API_KEY"));
    }
    if config.storage.bucket_name.trim().is_empty() {
        return Err(ConfigError::MissingSetting("BUCKET_NAME"));
    }
    if config.weather.cities.is_empty() {
        return Err(ConfigError::NoCities);
    }
    if config.weather.timeout_secs == 0 || config.storage.timeout_secs == 0 {
        return Err(ConfigError::Invalid("timeouts must be greater than zero".to_string()));
    }
    if config.weather.max_response_bytes == 0 {
        return Err(ConfigError::Invalid("max_response_bytes must be greater than zero".to_string()));
    }

    Ok(())
}

/// Error depicting errors that occur while loading the configuration
///
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("ReadError: {0}")]
    ReadError(String),
    #[error("ParseError: {0}")]
    ParseError(String),
    #[error("missing required setting: {0}")]
    MissingSetting(&'static str),
    #[error("no cities configured")]
    NoCities,
    #[error("invalid setting: {0}")]
    Invalid(String),
}
