use std::io::{self, Read};
use std::time::Duration;
use reqwest::blocking::Client;
use crate::manager_weather::errors::WeatherError;

/// Issues GET requests against the weather API and returns the response body
pub trait Transport {
    fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<String, WeatherError>;
}

/// Blocking reqwest based transport with a request timeout and a response size limit
pub struct HttpTransport {
    client: Client,
    max_response_bytes: usize,
}

impl HttpTransport {
    /// Returns a transport ready for use
    ///
    /// # Arguments
    ///
    /// * 'timeout' - timeout for a complete request
    /// * 'max_response_bytes' - largest response body accepted
    pub fn new(timeout: Duration, max_response_bytes: usize) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()?;

        Ok(Self { client, max_response_bytes })
    }
}

impl Transport for HttpTransport {
    fn get(&self, url: &str, query: &[(&str, &str)]) -> Result<String, WeatherError> {
        let mut response = self.client
            .get(url)
            .query(query)
            .send()?
            .error_for_status()?;

        if let Some(length) = response.content_length() {
            check_size(usize::try_from(length).unwrap_or(usize::MAX), self.max_response_bytes)?;
        }

        // Never buffer more than one byte past the limit, whatever the server claims
        let mut body = Vec::new();
        (&mut response)
            .take(self.max_response_bytes as u64 + 1)
            .read_to_end(&mut body)
            .map_err(read_error)?;
        check_size(body.len(), self.max_response_bytes)?;

        String::from_utf8(body)
            .map_err(|e| WeatherError::Document(format!("response is not UTF-8: {}", e)))
    }
}

fn check_size(size: usize, limit: usize) -> Result<(), WeatherError> {
    if size > limit {
        Err(WeatherError::TooLarge { size, limit })
    } else {
        Ok(())
    }
}

/// Maps a failed body read, unwrapping the reqwest error so its url is dropped as well
///
/// # Arguments
///
/// * 'e' - the io error from reading the response body
fn read_error(e: io::Error) -> WeatherError {
    let kind = e.kind();
    match e.into_inner().map(|inner| inner.downcast::<reqwest::Error>()) {
        Some(Ok(re)) => WeatherError::from(*re),
        Some(Err(other)) => WeatherError::Network(other.to_string()),
        None => WeatherError::Network(format!("error reading response body: {}", kind)),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::net::{TcpListener, TcpStream};
    use std::thread::{self, JoinHandle};
    use super::*;

    const LIMIT: usize = 1024;
    const SECRET: &str = "SECRETKEY123";

    /// Serves a single connection with the given responder and hands back the request head
    fn serve_once<F>(respond: F) -> (String, JoinHandle<String>)
    where
        F: FnOnce(&mut TcpStream) + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/weather", listener.local_addr().unwrap());

        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut head = Vec::new();
            let mut buf = [0u8; 512];
            while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                match stream.read(&mut buf) {
                    Ok(0) | Err(_) => break,
                    Ok(n) => head.extend_from_slice(&buf[..n]),
                }
            }
            respond(&mut stream);
            String::from_utf8_lossy(&head).to_string()
        });

        (url, handle)
    }

    fn transport() -> HttpTransport {
        HttpTransport::new(Duration::from_secs(5), LIMIT).unwrap()
    }

    fn query() -> [(&'static str, &'static str); 3] {
        [("q", "Lagos"), ("appid", SECRET), ("units", "metric")]
    }

    #[test]
    fn size_limit_is_inclusive() {
        assert!(check_size(LIMIT, LIMIT).is_ok());
        assert!(matches!(check_size(LIMIT + 1, LIMIT), Err(WeatherError::TooLarge { size: 1025, limit: 1024 })));
    }

    #[test]
    fn body_is_returned_and_query_sent() {
        let (url, handle) = serve_once(|s| {
            let _ = s.write_all(b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 17\r\n\r\n{\"main\":{\"t\":1}}\n");
        });

        let body = transport().get(&url, &query()).unwrap();

        assert_eq!(body, "{\"main\":{\"t\":1}}\n");
        let head = handle.join().unwrap();
        assert!(head.starts_with("GET /weather?q=Lagos&appid=SECRETKEY123&units=metric HTTP/1.1"), "{}", head);
    }

    #[test]
    fn not_found_maps_to_status() {
        let (url, handle) = serve_once(|s| {
            let _ = s.write_all(b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\n\r\n");
        });

        let result = transport().get(&url, &query());

        assert!(matches!(result, Err(WeatherError::Status(404))));
        handle.join().unwrap();
    }

    #[test]
    fn declared_length_over_limit_is_rejected() {
        let (url, handle) = serve_once(|s| {
            let _ = s.write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 2048\r\n\r\n");
            let _ = s.write_all(&[b'x'; 2048]);
        });

        let result = transport().get(&url, &query());

        assert!(matches!(result, Err(WeatherError::TooLarge { size: 2048, limit: LIMIT })));
        handle.join().unwrap();
    }

    #[test]
    fn chunked_body_over_limit_stops_at_limit() {
        let (url, handle) = serve_once(|s| {
            let _ = s.write_all(b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n");
            let chunk = [b'x'; 1024];
            for _ in 0..1024 {
                if s.write_all(b"400\r\n").and_then(|_| s.write_all(&chunk)).and_then(|_| s.write_all(b"\r\n")).is_err() {
                    return;
                }
            }
            let _ = s.write_all(b"0\r\n\r\n");
        });

        let result = transport().get(&url, &query());

        assert!(matches!(result, Err(WeatherError::TooLarge { size: 1025, limit: LIMIT })));
        handle.join().unwrap();
    }

    #[test]
    fn connection_failure_does_not_leak_api_key() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/weather", listener.local_addr().unwrap());
        drop(listener);

        let e = transport().get(&url, &query()).unwrap_err();
        let wrapped = WeatherError::Fetch { city: "Lagos".to_string(), source: Box::new(e) };

        assert!(matches!(&wrapped, WeatherError::Fetch { source, .. } if matches!(**source, WeatherError::Network(_))));
        assert!(!wrapped.to_string().contains(SECRET), "{}", wrapped);
        assert!(!wrapped.to_string().contains("appid"), "{}", wrapped);
    }
}
