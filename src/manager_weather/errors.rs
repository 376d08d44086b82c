use thiserror::Error;

#[derive(Error, Debug)]
pub enum WeatherError {
    #[error("Invalid data type '{0}', must be 'current' or 'forecast'")]
    InvalidDataType(String),
    #[error("NetworkError: {0}")]
    Network(String),
    #[error("HTTP status {0}")]
    Status(u16),
    #[error("response body of at least {size} bytes exceeds limit of {limit} bytes")]
    TooLarge { size: usize, limit: usize },
    #[error("DocumentError: {0}")]
    Document(String),
    #[error("Error fetching weather data for '{city}': {source}")]
    Fetch { city: String, source: Box<WeatherError> },
}

// The request url carries the API key, so it is stripped before the error is turned into text
impl From<reqwest::Error> for WeatherError {
    fn from(e: reqwest::Error) -> Self {
        match e.status() {
            Some(status) => WeatherError::Status(status.as_u16()),
            None => WeatherError::Network(e.without_url().to_string()),
        }
    }
}

impl From<serde_json::Error> for WeatherError {
    fn from(e: serde_json::Error) -> Self {
        WeatherError::Document(e.to_string())
    }
}
