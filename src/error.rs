use std::time::Duration;

/// Errors raised by the monitor daemon
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("No device advertising a name containing {filter:?} found within {timeout:?}")]
    DeviceNotFound { filter: String, timeout: Duration },

    #[error("Bluetooth link error: {0}")]
    Link(#[from] btleplug::Error),

    #[error("Failed to release device during shutdown: {0}")]
    ShutdownRelease(#[source] btleplug::Error),
}
