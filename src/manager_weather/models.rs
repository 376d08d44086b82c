use serde::Deserialize;
use serde_json::Value;
use crate::manager_weather::errors::WeatherError;

/// A weather API payload as received, kept opaque apart from the few fields used for display
#[derive(Debug, Clone, PartialEq)]
pub struct WeatherRecord(Value);

impl WeatherRecord {
    /// Wraps a parsed payload as received, no shape is imposed on it
    ///
    /// # Arguments
    ///
    /// * 'value' - parsed JSON document
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    pub fn value(&self) -> &Value {
        &self.0
    }

    /// Null and empty objects, arrays and strings carry no data
    pub fn is_empty(&self) -> bool {
        match &self.0 {
            Value::Null => true,
            Value::Object(m) => m.is_empty(),
            Value::Array(a) => a.is_empty(),
            Value::String(s) => s.is_empty(),
            _ => false,
        }
    }

    pub fn is_object(&self) -> bool {
        self.0.is_object()
    }

    /// Returns a new record carrying all fields of this one plus a `timestamp` field.
    /// Anything but an object is returned unchanged.
    ///
    /// # Arguments
    ///
    /// * 'timestamp' - capture timestamp to add
    pub fn stamped(&self, timestamp: &str) -> WeatherRecord {
        let mut value = self.0.clone();
        if let Some(map) = value.as_object_mut() {
            map.insert("timestamp".to_string(), Value::String(timestamp.to_string()));
        }
        WeatherRecord(value)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.0)
    }

    /// Extracts the fields shown for current weather
    pub fn current_summary(&self) -> Result<CurrentSummary, WeatherError> {
        let doc = CurrentDocument::deserialize(&self.0)?;
        let description = first_description(&doc.weather)?;

        Ok(CurrentSummary {
            temp: doc.main.temp,
            feels_like: doc.main.feels_like,
            humidity: doc.main.humidity,
            description,
        })
    }

    /// Extracts at most `max` leading entries of a forecast
    ///
    /// # Arguments
    ///
    /// * 'max' - maximum number of entries to return
    pub fn forecast_entries(&self, max: usize) -> Result<Vec<ForecastEntry>, WeatherError> {
        let doc = ForecastDocument::deserialize(&self.0)?;

        doc.list
            .iter()
            .take(max)
            .map(|item| -> Result<ForecastEntry, WeatherError> {
                Ok(ForecastEntry {
                    time: item.dt_txt.clone(),
                    temp: item.main.temp,
                    description: first_description(&item.weather)?,
                })
            })
            .collect()
    }
}

fn first_description(conditions: &[Condition]) -> Result<String, WeatherError> {
    conditions
        .first()
        .map(|c| c.description.clone())
        .ok_or(WeatherError::Document("weather conditions missing".to_string()))
}

#[derive(Debug, Clone, PartialEq)]
pub struct CurrentSummary {
    pub temp: f64,
    pub feels_like: f64,
    pub humidity: f64,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ForecastEntry {
    pub time: String,
    pub temp: f64,
    pub description: String,
}

#[derive(Deserialize)]
struct Condition {
    description: String,
}

#[derive(Deserialize)]
struct CurrentMain {
    temp: f64,
    feels_like: f64,
    humidity: f64,
}

#[derive(Deserialize)]
struct CurrentDocument {
    main: CurrentMain,
    weather: Vec<Condition>,
}

#[derive(Deserialize)]
struct ForecastMain {
    temp: f64,
}

#[derive(Deserialize)]
struct ForecastItem {
    dt_txt: String,
    main: ForecastMain,
    weather: Vec<Condition>,
}

#[derive(Deserialize)]
struct ForecastDocument {
    list: Vec<ForecastItem>,
}
