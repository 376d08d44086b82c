use log::{info, warn};
use thiserror::Error;
use crate::initialization::Mgr;
use crate::manager_weather::DataKind;
use crate::manager_weather::models::WeatherRecord;

/// Number of forecast entries shown per city
const FORECAST_ENTRIES: usize = 3;

/// Outcome of a collection run
#[derive(Debug, Default, PartialEq)]
pub struct RunReport {
    pub saved: usize,
    pub failed: usize,
    pub unavailable: Vec<(String, DataKind)>,
}

impl RunReport {
    fn record_save(&mut self, saved: bool) {
        if saved {
            self.saved += 1;
        } else {
            self.failed += 1;
        }
    }
}

/// Runs a collection: makes sure the bucket exists, then fetches, shows and saves current
/// weather and forecast for each city in turn. A failure for one city or data kind does not
/// stop the run.
///
/// # Arguments
///
/// * 'cities' - the cities to collect weather for, in order
/// * 'mgr' - struct with configured managers
///
/// An empty city list is refused here as well, for callers that do not go through config validation.
pub fn run(cities: &[String], mgr: &Mgr) -> Result<RunReport, WorkerError> {
    if cities.is_empty() {
        return Err(WorkerError::NoCities);
    }

    mgr.storage.ensure_bucket_exists();

    let mut report = RunReport::default();
    for city in cities {
        collect_current(city, mgr, &mut report);
        collect_forecast(city, mgr, &mut report);
    }

    info!("Run complete: {} saved, {} failed, {} unavailable", report.saved, report.failed, report.unavailable.len());

    Ok(report)
}

/// Fetches, logs and saves current weather for a city
///
/// # Arguments
///
/// * 'city' - the city
/// * 'mgr' - struct with configured managers
/// * 'report' - report to update
fn collect_current(city: &str, mgr: &Mgr, report: &mut RunReport) {
    info!("Fetching current weather for {}...", city);

    let Some(current) = mgr.weather.fetch(city, DataKind::Current) else {
        warn!("Current weather for '{}' could not be fetched", city);
        report.unavailable.push((city.to_string(), DataKind::Current));
        return;
    };

    show_current(city, &current, mgr.weather.units().temperature_label());
    report.record_save(mgr.storage.save_to_storage(Some(&current), city, DataKind::Current));
}

/// Fetches, logs and saves the forecast for a city
///
/// # Arguments
///
/// * 'city' - the city
/// * 'mgr' - struct with configured managers
/// * 'report' - report to update
fn collect_forecast(city: &str, mgr: &Mgr, report: &mut RunReport) {
    info!("Weather forecast for {}:", city);

    let Some(forecast) = mgr.weather.fetch(city, DataKind::Forecast) else {
        warn!("Weather data for '{}' could not be fetched", city);
        report.unavailable.push((city.to_string(), DataKind::Forecast));
        return;
    };

    show_forecast(city, &forecast, mgr.weather.units().temperature_label());
    report.record_save(mgr.storage.save_to_storage(Some(&forecast), city, DataKind::Forecast));
}

fn show_current(city: &str, record: &WeatherRecord, label: &str) {
    match record.current_summary() {
        Ok(s) => info!(
            "Temperature: {}{label}, Feels like: {}{label}, Humidity: {}%, Conditions: {}",
            s.temp, s.feels_like, s.humidity, s.description
        ),
        Err(e) => warn!("Current weather for '{}' is incomplete: {}", city, e),
    }
}

fn show_forecast(city: &str, record: &WeatherRecord, label: &str) {
    match record.forecast_entries(FORECAST_ENTRIES) {
        Ok(entries) => entries.iter().for_each(|f| info!(
            "Forecast time: {}, Forecast temperature: {}{label}, Forecast conditions: {}",
            f.time, f.temp, f.description
        )),
        Err(e) => warn!("Forecast for '{}' is incomplete: {}", city, e),
    }
}

/// Error depicting errors that stop a collection run
///
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("no cities to collect weather for")]
    NoCities,
}
