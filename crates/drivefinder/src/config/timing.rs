//! Timing configuration for model requests

use lazy_static::lazy_static;
use std::env;
use std::time::Duration;

/// Timeouts applied to every call against the model endpoint
#[derive(Debug, Clone)]
pub struct RequestTimingConfig {
    /// Upper bound on a whole request, in seconds
    pub request_timeout: f64,
    /// Upper bound on establishing the connection, in seconds
    pub connect_timeout: f64,
}

impl Default for RequestTimingConfig {
    fn default() -> Self {
        Self {
            request_timeout: parse_timeout(env::var("DRIVEFINDER_REQUEST_TIMEOUT").ok(), 120.0),
            connect_timeout: parse_timeout(env::var("DRIVEFINDER_CONNECT_TIMEOUT").ok(), 10.0),
        }
    }
}

/// Parse a timeout in seconds, falling back when it is not a usable `Duration`
fn parse_timeout(raw: Option<String>, default: f64) -> f64 {
    raw.and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| *v > 0.0 && Duration::try_from_secs_f64(*v).is_ok())
        .unwrap_or(default)
}

impl RequestTimingConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.request_timeout)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.connect_timeout)
    }
}

/// Master timing configuration
#[derive(Debug, Clone, Default)]
pub struct TimingConfig {
    pub request: RequestTimingConfig,
}

lazy_static! {
    /// Global timing configuration instance
    pub static ref TIMING_CONFIG: TimingConfig = TimingConfig::default();
}
