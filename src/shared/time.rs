use chrono::{DateTime, Utc};

/// Clock trait for abstracting time operations
/// Provides methods for getting current time in different formats
pub trait Clock: Send + Sync {
    /// Get current time as a UTC datetime (for interval arithmetic)
    fn now_utc(&self) -> DateTime<Utc>;

    /// Get current time as RFC3339 string (for timestamps in logs and alerts)
    /// Format: "2024-01-15T10:30:00Z"
    fn now_rfc3339(&self) -> String;

    /// Get current time as epoch seconds
    /// Returns seconds since Unix epoch (1970-01-01 00:00:00 UTC)
    fn now_epoch_seconds(&self) -> i64;
}

/// Production implementation of Clock using system time
#[derive(Debug, Clone, Default)]
pub struct SystemClock;

impl SystemClock {
    pub fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn now_rfc3339(&self) -> String {
        Utc::now().to_rfc3339()
    }

    fn now_epoch_seconds(&self) -> i64 {
        Utc::now().timestamp()
    }
}

/// Test implementation of Clock with fixed/controllable time
/// Useful for deterministic testing
#[derive(Debug, Clone)]
pub struct FixedClock {
    timestamp: DateTime<Utc>,
}

impl FixedClock {
    /// Create a new FixedClock with the given timestamp
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        Self { timestamp }
    }

    /// Create a FixedClock from RFC3339 string
    pub fn from_rfc3339(timestamp_str: &str) -> Result<Self, chrono::ParseError> {
        let timestamp = DateTime::parse_from_rfc3339(timestamp_str)?.with_timezone(&Utc);
        Ok(Self { timestamp })
    }

    /// Create a FixedClock from epoch seconds
    pub fn from_epoch_seconds(seconds: i64) -> Self {
        let timestamp = DateTime::from_timestamp(seconds, 0).expect("Invalid timestamp");
        Self { timestamp }
    }

    /// Update the fixed time
    pub fn set_time(&mut self, timestamp: DateTime<Utc>) {
        self.timestamp = timestamp;
    }

    /// Advance time by the given number of seconds
    pub fn advance_seconds(&mut self, seconds: i64) {
        self.timestamp += chrono::Duration::seconds(seconds);
    }

    /// Advance time by the given number of minutes
    pub fn advance_minutes(&mut self, minutes: i64) {
        self.timestamp += chrono::Duration::minutes(minutes);
    }
}

impl Clock for FixedClock {
    fn now_utc(&self) -> DateTime<Utc> {
        self.timestamp
    }

    fn now_rfc3339(&self) -> String {
        self.timestamp.to_rfc3339()
    }

    fn now_epoch_seconds(&self) -> i64 {
        self.timestamp.timestamp()
    }
}
