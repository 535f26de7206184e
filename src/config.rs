use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_DATA_DIR: &str = "./plant_data";
const DEFAULT_DEVICE_NAME_FILTER: &str = "Plant";
const DEFAULT_SCAN_TIMEOUT_SECONDS: u64 = 10;
const DEFAULT_CONNECT_TIMEOUT_SECONDS: u64 = 10;
const DEFAULT_CHECK_INTERVAL_SECONDS: u64 = 60;
const DEFAULT_GROQ_MODEL: &str = "llama3-8b-8192";

/// Configuration for the monitor daemon
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding plant record files
    pub data_dir: PathBuf,
    /// Substring of the advertised device name to look for
    pub device_name_filter: String,
    /// How long to scan for a matching sensor before giving up
    pub scan_timeout: Duration,
    /// How long to wait for connect plus service discovery
    pub connect_timeout: Duration,
    /// How often to run the monitoring cycle
    pub check_interval: Duration,
    /// LINE Messaging API channel access token
    pub channel_access_token: String,
    /// Groq API key for advice generation
    pub groq_api_key: String,
    /// Groq model used for advice generation
    pub groq_model: String,
}

impl Config {
    /// Create a new Config instance from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let data_dir = std::env::var("PLANT_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_DIR));

        let device_name_filter = std::env::var("DEVICE_NAME_FILTER")
            .unwrap_or_else(|_| DEFAULT_DEVICE_NAME_FILTER.to_string());

        let scan_timeout = seconds_or("SCAN_TIMEOUT_SECONDS", DEFAULT_SCAN_TIMEOUT_SECONDS)?;
        let connect_timeout =
            seconds_or("CONNECT_TIMEOUT_SECONDS", DEFAULT_CONNECT_TIMEOUT_SECONDS)?;
        let check_interval = seconds_or("CHECK_INTERVAL_SECONDS", DEFAULT_CHECK_INTERVAL_SECONDS)?;

        let channel_access_token = required("CHANNEL_ACCESS_TOKEN")?;
        let groq_api_key = required("GROQ_API_KEY")?;

        let groq_model =
            std::env::var("GROQ_MODEL").unwrap_or_else(|_| DEFAULT_GROQ_MODEL.to_string());

        Ok(Config {
            data_dir,
            device_name_filter,
            scan_timeout,
            connect_timeout,
            check_interval,
            channel_access_token,
            groq_api_key,
            groq_model,
        })
    }
}

fn required(var: &str) -> Result<String, ConfigError> {
    std::env::var(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
}

/// Read a positive duration in whole seconds, falling back to a default
fn seconds_or(var: &str, default_seconds: u64) -> Result<Duration, ConfigError> {
    let raw = match std::env::var(var) {
        Ok(raw) => raw,
        Err(_) => return Ok(Duration::from_secs(default_seconds)),
    };

    let seconds: u64 = raw.parse().map_err(|_| ConfigError::InvalidValue {
        var: var.to_string(),
        value: raw.clone(),
    })?;

    // Zero would stall the scanner or the tick timer
    if seconds == 0 {
        return Err(ConfigError::InvalidValue {
            var: var.to_string(),
            value: raw,
        });
    }

    Ok(Duration::from_secs(seconds))
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {var}: {value}")]
    InvalidValue { var: String, value: String },
}
