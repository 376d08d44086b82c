pub mod errors;
pub mod models;
pub mod transport;

use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use log::{error, info};
use serde::Deserialize;
use serde_json::Value;
use crate::config::WeatherParameters;
use crate::manager_weather::errors::WeatherError;
use crate::manager_weather::models::WeatherRecord;
use crate::manager_weather::transport::{HttpTransport, Transport};

/// The kinds of data the weather API is asked for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataKind {
    Current,
    Forecast,
}

impl DataKind {
    /// Path segment of the API endpoint serving this kind of data
    pub fn endpoint(&self) -> &'static str {
        match self {
            DataKind::Current => "weather",
            DataKind::Forecast => "forecast",
        }
    }
}

impl FromStr for DataKind {
    type Err = WeatherError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "current" => Ok(DataKind::Current),
            "forecast" => Ok(DataKind::Forecast),
            other => Err(WeatherError::InvalidDataType(other.to_string())),
        }
    }
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DataKind::Current => write!(f, "current"),
            DataKind::Forecast => write!(f, "forecast"),
        }
    }
}

/// Unit system requested from the API, each with the matching temperature label
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    Metric,
    Imperial,
}

impl Units {
    pub fn query_value(&self) -> &'static str {
        match self {
            Units::Metric => "metric",
            Units::Imperial => "imperial",
        }
    }

    pub fn temperature_label(&self) -> &'static str {
        match self {
            Units::Metric => "°C",
            Units::Imperial => "°F",
        }
    }
}

/// Struct for fetching current weather and forecasts for cities
pub struct Weather {
    transport: Box<dyn Transport>,
    api_key: String,
    base_url: String,
    units: Units,
}

impl Weather {
    /// Returns a Weather struct using a blocking HTTP client
    ///
    /// # Arguments
    ///
    /// * 'config' - weather API configuration
    pub fn new(config: &WeatherParameters) -> Result<Weather, WeatherError> {
        let transport = HttpTransport::new(Duration::from_secs(config.timeout_secs), config.max_response_bytes)?;

        Ok(Weather::with_transport(config, Box::new(transport)))
    }

    /// Returns a Weather struct using the given transport
    ///
    /// # Arguments
    ///
    /// * 'config' - weather API configuration
    /// * 'transport' - transport to send requests through
    pub fn with_transport(config: &WeatherParameters, transport: Box<dyn Transport>) -> Weather {
        Weather {
            transport,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            units: config.units,
        }
    }

    pub fn units(&self) -> Units {
        self.units
    }

    /// Fetches weather data for a city, where the data type is given by name.
    /// Unknown data types are logged and yield None without any request being made.
    ///
    /// # Arguments
    ///
    /// * 'city' - name of the city
    /// * 'data_type' - either 'current' or 'forecast'
    pub fn fetch_weather(&self, city: &str, data_type: &str) -> Option<WeatherRecord> {
        match data_type.parse::<DataKind>() {
            Ok(kind) => self.fetch(city, kind),
            Err(e) => {
                info!("{}", e);
                None
            }
        }
    }

    /// Fetches weather data for a city. Failures are logged and yield None.
    ///
    /// # Arguments
    ///
    /// * 'city' - name of the city
    /// * 'kind' - kind of data to fetch
    pub fn fetch(&self, city: &str, kind: DataKind) -> Option<WeatherRecord> {
        match self.try_fetch(city, kind) {
            Ok(record) => {
                info!("weather data for '{}' fetched successfully", city);
                Some(record)
            },
            Err(e) => {
                error!("{}", e);
                None
            }
        }
    }

    /// Requests and parses weather data, errors carry the city name
    ///
    /// # Arguments
    ///
    /// * 'city' - name of the city
    /// * 'kind' - kind of data to fetch
    fn try_fetch(&self, city: &str, kind: DataKind) -> Result<WeatherRecord, WeatherError> {
        let url = format!("{}/{}", self.base_url, kind.endpoint());
        let query = [
            ("q", city),
            ("appid", self.api_key.as_str()),
            ("units", self.units.query_value()),
        ];

        let fetched = self.transport
            .get(&url, &query)
            .and_then(|body| serde_json::from_str::<Value>(&body).map_err(WeatherError::from))
            .map(WeatherRecord::new);

        fetched.map_err(|e| WeatherError::Fetch { city: city.to_string(), source: Box::new(e) })
    }
}

#[cfg(test)]
pub mod tests {
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::rc::Rc;
    use serde_json::json;
    use super::*;

    pub const API_KEY: &str = "mock_api_key";

    #[derive(Debug, Clone, PartialEq)]
    pub struct Call {
        pub url: String,
        pub query: Vec<(String, String)>,
    }

    /// Transport answering from a table of url suffixes, recording every call
    #[derive(Clone, Default)]
    pub struct FakeTransport {
        responses: Rc<RefCell<HashMap<String, Result<String, String>>>>,
        pub calls: Rc<RefCell<Vec<Call>>>,
    }

    impl FakeTransport {
        pub fn respond(&self, endpoint: &str, response: Result<String, String>) -> &Self {
            self.responses.borrow_mut().insert(endpoint.to_string(), response);
            self
        }
    }

    impl Transport for FakeTransport {
        fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<String, WeatherError> {
            self.calls.borrow_mut().push(Call {
                url: url.to_string(),
                query: query.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect(),
            });

            let endpoint = url.rsplit('/').next().unwrap_or_default();
            match self.responses.borrow().get(endpoint) {
                Some(Ok(body)) => Ok(body.clone()),
                Some(Err(e)) => Err(WeatherError::Network(e.clone())),
                None => Err(WeatherError::Status(404)),
            }
        }
    }

    pub fn weather_config() -> WeatherParameters {
        WeatherParameters {
            api_key: API_KEY.to_string(),
            ..WeatherParameters::default()
        }
    }

    fn expected_query(city: &str) -> Vec<(String, String)> {
        vec![
            ("q".to_string(), city.to_string()),
            ("appid".to_string(), API_KEY.to_string()),
            ("units".to_string(), "metric".to_string()),
        ]
    }

    #[test]
    fn invalid_data_type_makes_no_request() {
        let transport = FakeTransport::default();
        let weather = Weather::with_transport(&weather_config(), Box::new(transport.clone()));

        for city in ["Lagos", "Abuja"] {
            for data_type in ["invalid", "Current", "forecasts", ""] {
                assert_eq!(weather.fetch_weather(city, data_type), None);
            }
        }

        assert!(transport.calls.borrow().is_empty());
    }

    #[test]
    fn invalid_data_type_message() {
        let e = "invalid".parse::<DataKind>().unwrap_err();

        assert_eq!(e.to_string(), "Invalid data type 'invalid', must be 'current' or 'forecast'");
    }

    #[test]
    fn fetch_current_returns_body_unmodified() {
        let body = json!({"weather": [{"description": "clear sky"}], "main": {"temp": 30}});
        let transport = FakeTransport::default();
        transport.respond("weather", Ok(body.to_string()));
        let weather = Weather::with_transport(&weather_config(), Box::new(transport.clone()));

        let record = weather.fetch_weather("Lagos", "current").unwrap();

        assert_eq!(record.value(), &body);
        assert_eq!(*transport.calls.borrow(), vec![Call {
            url: "http://api.openweathermap.org/data/2.5/weather".to_string(),
            query: expected_query("Lagos"),
        }]);
    }

    #[test]
    fn fetch_forecast_uses_forecast_endpoint() {
        let body = json!({"list": [{"main": {"temp": 29}}, {"main": {"temp": 28}}]});
        let transport = FakeTransport::default();
        transport.respond("forecast", Ok(body.to_string()));
        let weather = Weather::with_transport(&weather_config(), Box::new(transport.clone()));

        let record = weather.fetch("Lagos", DataKind::Forecast).unwrap();

        assert_eq!(record.value(), &body);
        let calls = transport.calls.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].url, "http://api.openweathermap.org/data/2.5/forecast");
        assert_eq!(calls[0].query, expected_query("Lagos"));
    }

    #[test]
    fn transport_failure_yields_none() {
        let transport = FakeTransport::default();
        transport.respond("weather", Err("API error".to_string()));
        let weather = Weather::with_transport(&weather_config(), Box::new(transport.clone()));

        assert_eq!(weather.fetch_weather("Lagos", "current"), None);
        assert_eq!(transport.calls.borrow().len(), 1);
    }

    #[test]
    fn failure_message_names_city_and_cause() {
        let transport = FakeTransport::default();
        transport.respond("weather", Err("API error".to_string()));
        let weather = Weather::with_transport(&weather_config(), Box::new(transport));

        let e = weather.try_fetch("Lagos", DataKind::Current).unwrap_err();

        assert!(e.to_string().starts_with("Error fetching weather data for 'Lagos': "));
        assert!(e.to_string().contains("API error"));
    }

    #[test]
    fn array_body_is_returned_verbatim() {
        let transport = FakeTransport::default();
        transport.respond("weather", Ok("[{\"main\":{\"temp\":30}}]".to_string()));
        let weather = Weather::with_transport(&weather_config(), Box::new(transport));

        let record = weather.fetch("Lagos", DataKind::Current).unwrap();

        assert_eq!(record.value(), &json!([{"main": {"temp": 30}}]));
    }

    #[test]
    fn unparsable_body_yields_none() {
        let transport = FakeTransport::default();
        transport.respond("weather", Ok("<html>oops</html>".to_string()));
        let weather = Weather::with_transport(&weather_config(), Box::new(transport));

        assert_eq!(weather.fetch("Lagos", DataKind::Current), None);
    }

    #[test]
    fn imperial_units_are_requested_and_labelled() {
        let transport = FakeTransport::default();
        transport.respond("weather", Ok("{}".to_string()));
        let config = WeatherParameters { units: Units::Imperial, ..weather_config() };
        let weather = Weather::with_transport(&config, Box::new(transport.clone()));

        let _ = weather.fetch("Houston", DataKind::Current);

        assert_eq!(transport.calls.borrow()[0].query[2], ("units".to_string(), "imperial".to_string()));
        assert_eq!(weather.units().temperature_label(), "°F");
        assert_eq!(Units::Metric.temperature_label(), "°C");
    }

    #[test]
    fn base_url_trailing_slash_is_ignored() {
        let transport = FakeTransport::default();
        let config = WeatherParameters { base_url: "http://localhost:8080/".to_string(), ..weather_config() };
        let weather = Weather::with_transport(&config, Box::new(transport.clone()));

        let _ = weather.fetch("Lagos", DataKind::Forecast);

        assert_eq!(transport.calls.borrow()[0].url, "http://localhost:8080/forecast");
    }
}
