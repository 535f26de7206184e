use std::time::Duration;

use btleplug::api::{Central as _, Peripheral as _, ScanFilter};
use btleplug::platform::{Adapter, Peripheral};
use tokio::time::{sleep, Instant};
use tracing::{info, warn};

use crate::error::MonitorError;

const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Scan until a peripheral advertising a matching name shows up
///
/// The scan is stopped before returning, whether or not a device was found.
pub async fn discover(
    adapter: &Adapter,
    name_filter: &str,
    timeout: Duration,
) -> Result<Peripheral, MonitorError> {
    info!("Scanning for devices with name containing {:?}", name_filter);
    adapter.start_scan(ScanFilter::default()).await?;

    let deadline = Instant::now() + timeout;
    let found = poll_for_match(adapter, name_filter, deadline).await;

    if let Err(e) = adapter.stop_scan().await {
        warn!("Failed to stop scan: {}", e);
    }

    match found? {
        Some(peripheral) => Ok(peripheral),
        None => Err(MonitorError::DeviceNotFound {
            filter: name_filter.to_string(),
            timeout,
        }),
    }
}

async fn poll_for_match(
    adapter: &Adapter,
    name_filter: &str,
    deadline: Instant,
) -> Result<Option<Peripheral>, MonitorError> {
    loop {
        for peripheral in adapter.peripherals().await? {
            // A failed property read just skips this device for the sweep
            let name = peripheral
                .properties()
                .await
                .ok()
                .flatten()
                .and_then(|props| props.local_name);

            if advertised_name_matches(name.as_deref(), name_filter) {
                info!(
                    "Found device {:?} ({:?})",
                    name.as_deref().unwrap_or(""),
                    peripheral.id()
                );
                return Ok(Some(peripheral));
            }
        }

        if Instant::now() >= deadline {
            return Ok(None);
        }

        sleep(POLL_INTERVAL).await;
    }
}

/// Case-sensitive containment check on the advertised device name
pub fn advertised_name_matches(advertised: Option<&str>, filter: &str) -> bool {
    advertised.is_some_and(|name| name.contains(filter))
}
