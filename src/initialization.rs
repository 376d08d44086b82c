use std::env;
use log::info;
use thiserror::Error;
use crate::config::{load_config, Config, ConfigError};
use crate::logging::{setup_logger, LoggerError};
use crate::manager_storage::errors::StoreError;
use crate::manager_storage::Storage;
use crate::manager_weather::errors::WeatherError;
use crate::manager_weather::Weather;

pub struct Mgr {
    pub weather: Weather,
    pub storage: Storage,
}

/// Initializes and returns configuration and a Mgr struct holding the initialized managers
///
pub fn init() -> Result<(Config, Mgr), InitializationError> {
    let args: Vec<String> = env::args().collect();
    let config_path = args.iter()
        .find_map(|p| p.strip_prefix("--config="));

    // Load configuration
    let config = load_config(config_path)?;

    // Setup logging
    let _ = setup_logger(config.general.log_path.as_deref(), config.general.log_level, config.general.log_to_stdout)?;

    // Print version
    info!("starting weather collector version: {}", env!("CARGO_PKG_VERSION"));

    // Instantiate structs
    let weather = Weather::new(&config.weather)?;
    let storage = Storage::new(&config.storage)?;

    let mgr = Mgr {
        weather,
        storage,
    };

    Ok((config, mgr))
}

/// Error depicting errors that occur while initializing the collector
///
#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("ConfigurationError: {0}")]
    ConfigurationError(#[from] ConfigError),
    #[error("SetupLoggerError: {0}")]
    SetupLoggerError(#[from] LoggerError),
    #[error("WeatherSetupError: {0}")]
    WeatherSetupError(#[from] WeatherError),
    #[error("StorageSetupError: {0}")]
    StorageSetupError(#[from] StoreError),
}
