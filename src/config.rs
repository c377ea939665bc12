//! Application configuration loaded from environment variables.
//!
//! All variables are optional:
//! - `WALLETPULSE_FIAT_ISO` - fiat currency balances are valued in
//! - `WALLETPULSE_WORKER_THREADS` - tokio worker threads for subscriptions
//! - `WALLETPULSE_IMAGE_TIMEOUT_SECS` - timeout for notification image fetches
//! - `WALLETPULSE_EXPERIMENTS` - path to a JSON experiments file

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Default fiat currency.
const DEFAULT_FIAT_ISO: &str = "USD";

/// Default number of runtime worker threads.
const DEFAULT_WORKER_THREADS: usize = 2;

/// Default image fetch timeout in seconds.
const DEFAULT_IMAGE_TIMEOUT_SECS: u64 = 10;

/// Top-level application configuration.
#[derive(Debug)]
pub struct AppConfig {
    pub fiat_iso: String,
    pub runtime: RuntimeConfig,
    pub image_timeout: Duration,
    pub experiments_path: Option<PathBuf>,
}

/// Settings for the tokio runtime subscriptions run on.
#[derive(Debug)]
pub struct RuntimeConfig {
    pub worker_threads: usize,
}

/// Loads the application configuration from environment variables.
///
/// # Errors
///
/// Returns [`PulseError::Config`](crate::PulseError::Config) if a numeric
/// variable is not a positive integer.
pub fn fetch_config() -> crate::Result<AppConfig> {
    let fiat_iso =
        non_empty_var("WALLETPULSE_FIAT_ISO").unwrap_or_else(|| DEFAULT_FIAT_ISO.to_string());

    let worker_threads =
        positive_var("WALLETPULSE_WORKER_THREADS")?.unwrap_or(DEFAULT_WORKER_THREADS);
    let image_timeout_secs =
        positive_var("WALLETPULSE_IMAGE_TIMEOUT_SECS")?.unwrap_or(DEFAULT_IMAGE_TIMEOUT_SECS);

    let experiments_path = non_empty_var("WALLETPULSE_EXPERIMENTS").map(PathBuf::from);

    Ok(AppConfig {
        fiat_iso,
        runtime: RuntimeConfig { worker_threads },
        image_timeout: Duration::from_secs(image_timeout_secs),
        experiments_path,
    })
}

/// Returns the value of an environment variable if it exists and is non-empty.
fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

/// Parses an optional environment variable as a positive integer.
fn positive_var<T>(name: &str) -> crate::Result<Option<T>>
where
    T: FromStr + PartialOrd + Default,
{
    let Some(raw) = non_empty_var(name) else {
        return Ok(None);
    };
    match raw.parse::<T>() {
        Ok(value) if value > T::default() => Ok(Some(value)),
        _ => Err(crate::PulseError::Config(format!(
            "{name} must be a positive integer, got {raw:?}"
        ))),
    }
}
