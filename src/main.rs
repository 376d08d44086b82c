use anyhow::Result;
use log::{error, warn};
use crate::initialization::init;
use crate::worker::run;

mod config;
mod initialization;
mod logging;
mod manager_storage;
mod manager_weather;
mod worker;

fn main() -> Result<()> {
    // Load config and set up all managers. If initialization fails, there is nothing to collect
    // with and logging may not even be in place, so the error is returned to the process.
    let (config, mgr) = init()?;

    match run(&config.weather.cities, &mgr) {
        Ok(report) if report.failed > 0 => {
            warn!("{} of {} writes failed", report.failed, report.saved + report.failed);
        },
        Ok(_) => {},
        Err(e) => {
            error!("critical: run failed: {}", e);
        }
    }

    Ok(())
}
