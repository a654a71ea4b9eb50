//! External data sources: the airplanes.live point query and the local room
//! temperature service, both wrapped in bounded retry with backoff.

use std::thread;
use std::time::Duration;

use serde_json::Value;
use thiserror::Error;

use crate::config::Config;

const AIRCRAFT_RETRY: RetryPolicy = RetryPolicy {
    max_attempts: 3,
    base_delay: Duration::from_secs(1),
    max_delay: Duration::from_secs(10),
};

const TEMPERATURE_RETRY: RetryPolicy = RetryPolicy {
    max_attempts: 3,
    base_delay: Duration::ZERO,
    max_delay: Duration::ZERO,
};

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP status {0} from {1}")]
    Status(u16, String),
    #[error("transport error: {0}")]
    Transport(Box<ureq::Error>),
    #[error("error reading response body: {0}")]
    Body(#[from] std::io::Error),
    #[error("malformed response payload: {0}")]
    Payload(String),
}

/// Transport failures, body read failures and server errors are worth
/// retrying; client errors and malformed payloads are not.
fn is_retryable(error: &FetchError) -> bool {
    match error {
        FetchError::Transport(_) | FetchError::Body(_) => true,
        FetchError::Status(code, _) => *code >= 500,
        FetchError::Payload(_) => false,
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Delay before the retry following the given 1-based attempt number,
    /// doubling from `base_delay` up to `max_delay`.
    fn backoff(&self, attempt: u32) -> Duration {
        let doublings = attempt.saturating_sub(1).min(16);
        self.base_delay
            .saturating_mul(1u32 << doublings)
            .min(self.max_delay)
    }
}

/// Runs `op` until it succeeds, the error is not retryable, or the attempt
/// budget is spent. The last error is returned as-is.
pub fn with_retry<T>(
    policy: RetryPolicy,
    retryable: impl Fn(&FetchError) -> bool,
    mut op: impl FnMut() -> Result<T, FetchError>,
) -> Result<T, FetchError> {
    let mut attempt = 1;
    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(error) if attempt < policy.max_attempts && retryable(&error) => {
                let delay = policy.backoff(attempt);
                log::warn!(
                    "attempt {}/{} failed ({}), retrying in {:?}",
                    attempt,
                    policy.max_attempts,
                    error,
                    delay
                );
                thread::sleep(delay);
                attempt += 1;
            }
            Err(error) => return Err(error),
        }
    }
}

/// Fetches the raw aircraft records within the configured radius of the
/// observer. The endpoint wraps them in an `ac` array.
pub fn fetch_aircraft_within_radius(config: &Config) -> Result<Vec<Value>, FetchError> {
    let url = format!(
        "{}/{}/{}/{}",
        config.aircraft_url.trim_end_matches('/'),
        config.latitude,
        config.longitude,
        config.radius_km
    );
    with_retry(AIRCRAFT_RETRY, is_retryable, || {
        let body = get_json(&url)?;
        body.get("ac")
            .and_then(Value::as_array)
            .cloned()
            .ok_or_else(|| FetchError::Payload(String::from("missing \"ac\" array")))
    })
}

/// Fetches the latest room temperature reading in Celsius.
pub fn fetch_room_temperature(config: &Config) -> Result<f64, FetchError> {
    with_retry(TEMPERATURE_RETRY, is_retryable, || {
        let body = get_json(&config.temperature_url)?;
        body.get("temperature_c")
            .and_then(Value::as_f64)
            .ok_or_else(|| FetchError::Payload(String::from("missing \"temperature_c\" value")))
    })
}

fn get_json(url: &str) -> Result<Value, FetchError> {
    let response = ureq::get(url).call().map_err(|error| match error {
        ureq::Error::Status(code, _) => FetchError::Status(code, url.to_owned()),
        transport => FetchError::Transport(Box::new(transport)),
    })?;
    Ok(response.into_json()?)
}
