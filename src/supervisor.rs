use std::time::Duration;

use btleplug::api::{Central as _, CentralEvent, Peripheral as _};
use btleplug::platform::{Adapter, Peripheral};
use futures::StreamExt;
use tokio::sync::watch;
use tokio::time::{interval_at, sleep, timeout, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};
use uuid::Uuid;

use plantita_monitor::advice::AdviceGenerator;
use plantita_monitor::aggregator::process_tick;
use plantita_monitor::decode::{decode_sample, metric_for_characteristic};
use plantita_monitor::domain::Snapshot;
use plantita_monitor::error::error_codes;
use plantita_monitor::id_generator::{IdGenerator, RandomIdGenerator};
use plantita_monitor::notify::NotificationSink;
use plantita_monitor::store::PlantStore;
use plantita_monitor::time::{Clock, SystemClock};

use crate::config::Config;
use crate::error::MonitorError;
use crate::scanner;

/// Delay before rescanning after a failed discovery
const SCAN_RETRY_DELAY: Duration = Duration::from_secs(10);

/// Delay before starting over after a session was established and lost
const SESSION_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Lifecycle state of the supervisor loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Idle,
    Scanning,
    Connecting,
    Subscribing,
    Monitoring,
    Backoff,
}

impl SupervisorState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SupervisorState::Idle => "idle",
            SupervisorState::Scanning => "scanning",
            SupervisorState::Connecting => "connecting",
            SupervisorState::Subscribing => "subscribing",
            SupervisorState::Monitoring => "monitoring",
            SupervisorState::Backoff => "backoff",
        }
    }
}

/// Why a monitoring session ended
#[derive(Debug, PartialEq, Eq)]
enum SessionEnd {
    Stopped,
    Lost,
}

/// Backoff delay for a failure in the given state
///
/// Scan misses retry on the short delay. Failures after a device was
/// acquired use the long one.
fn retry_delay(state: SupervisorState) -> Duration {
    match state {
        SupervisorState::Scanning => SCAN_RETRY_DELAY,
        _ => SESSION_RETRY_DELAY,
    }
}

/// Owns the device connection and drives the monitoring loop
///
/// The supervisor scans, connects, subscribes, then alternates between
/// collecting notification samples and running the periodic cycle. Any
/// link failure tears the session down and starts over from the scan.
/// Collected samples survive reconnects.
pub struct ConnectionSupervisor<S, G> {
    adapter: Adapter,
    config: Config,
    store: PlantStore,
    clock: Box<dyn Clock>,
    ids: Box<dyn IdGenerator>,
    sink: S,
    advice: G,
    stop: watch::Receiver<bool>,
    state: SupervisorState,
    snapshot: Snapshot,
}

impl<S, G> ConnectionSupervisor<S, G>
where
    S: NotificationSink,
    G: AdviceGenerator,
{
    pub fn new(
        adapter: Adapter,
        config: Config,
        store: PlantStore,
        sink: S,
        advice: G,
        stop: watch::Receiver<bool>,
    ) -> Self {
        Self {
            adapter,
            config,
            store,
            clock: Box::new(SystemClock),
            ids: Box::new(RandomIdGenerator),
            sink,
            advice,
            stop,
            state: SupervisorState::Idle,
            snapshot: Snapshot::new(),
        }
    }

    /// Run until a stop is requested
    ///
    /// Only a failure to release the device during shutdown is returned as
    /// an error. Everything else is retried.
    pub async fn run(mut self) -> Result<(), MonitorError> {
        info!("Connection supervisor started");

        loop {
            if *self.stop.borrow() {
                info!("Stop requested, supervisor exiting");
                return Ok(());
            }

            self.transition(SupervisorState::Scanning);
            let peripheral = match scanner::discover(
                &self.adapter,
                &self.config.device_name_filter,
                self.config.scan_timeout,
            )
            .await
            {
                Ok(peripheral) => peripheral,
                Err(e) => {
                    let code = match &e {
                        MonitorError::DeviceNotFound { .. } => error_codes::DEVICE_NOT_FOUND,
                        _ => error_codes::CONNECTION_ERROR,
                    };
                    warn!(error_code = code, "Discovery failed: {}", e);

                    if self.backoff(retry_delay(self.state)).await {
                        return Ok(());
                    }
                    continue;
                }
            };

            self.transition(SupervisorState::Connecting);
            if let Err(e) = self.establish(&peripheral).await {
                warn!(
                    error_code = error_codes::CONNECTION_ERROR,
                    "Failed to establish session: {}", e
                );
                release_quietly(&peripheral).await;

                if self.backoff(retry_delay(self.state)).await {
                    return Ok(());
                }
                continue;
            }

            self.transition(SupervisorState::Subscribing);
            if subscribe_to_sensors(&peripheral).await == 0 {
                warn!("No sensor characteristics subscribed, readings may never arrive");
            }

            match self.run_session(&peripheral).await {
                Ok(SessionEnd::Stopped) => {
                    info!("Stop requested, releasing device");
                    peripheral
                        .disconnect()
                        .await
                        .map_err(MonitorError::ShutdownRelease)?;
                    return Ok(());
                }
                Ok(SessionEnd::Lost) => {
                    release_quietly(&peripheral).await;
                    if self.backoff(retry_delay(self.state)).await {
                        return Ok(());
                    }
                }
                Err(e) => {
                    warn!(
                        error_code = error_codes::CONNECTION_ERROR,
                        "Session setup failed: {}", e
                    );
                    release_quietly(&peripheral).await;
                    if self.backoff(retry_delay(self.state)).await {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Connect and discover services inside the configured timeout
    async fn establish(&self, peripheral: &Peripheral) -> Result<(), MonitorError> {
        let connect = async {
            peripheral.connect().await?;
            peripheral.discover_services().await?;
            Ok::<(), btleplug::Error>(())
        };

        match timeout(self.config.connect_timeout, connect).await {
            Ok(result) => result.map_err(MonitorError::Link),
            Err(_) => Err(MonitorError::Link(btleplug::Error::TimedOut(
                self.config.connect_timeout,
            ))),
        }
    }

    /// Collect samples and run cycles until the session ends
    async fn run_session(&mut self, peripheral: &Peripheral) -> Result<SessionEnd, MonitorError> {
        let mut notifications = peripheral.notifications().await?;
        let mut events = self.adapter.events().await?;
        let device_id = peripheral.id();
        let mut stop = self.stop.clone();

        let mut ticker = interval_at(
            Instant::now() + self.config.check_interval,
            self.config.check_interval,
        );
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        self.transition(SupervisorState::Monitoring);
        info!("Monitoring session established");

        loop {
            tokio::select! {
                _ = stop.wait_for(|stopped| *stopped) => {
                    // A closed stop channel also ends the session
                    return Ok(SessionEnd::Stopped);
                }
                notification = notifications.next() => {
                    match notification {
                        Some(notification) => {
                            self.merge_sample(notification.uuid, &notification.value);
                        }
                        None => {
                            warn!("Notification stream closed");
                            return Ok(SessionEnd::Lost);
                        }
                    }
                }
                event = events.next() => {
                    match event {
                        Some(CentralEvent::DeviceDisconnected(id)) if id == device_id => {
                            warn!("Device disconnected");
                            return Ok(SessionEnd::Lost);
                        }
                        Some(_) => {}
                        None => {
                            warn!("Adapter event stream closed");
                            return Ok(SessionEnd::Lost);
                        }
                    }
                }
                _ = ticker.tick() => {
                    if !matches!(peripheral.is_connected().await, Ok(true)) {
                        warn!("Connection check failed");
                        return Ok(SessionEnd::Lost);
                    }

                    process_tick(
                        &self.store,
                        &self.snapshot,
                        self.clock.as_ref(),
                        self.ids.as_ref(),
                        &self.sink,
                        &self.advice,
                    )
                    .await;
                }
            }
        }
    }

    /// Decode one notification payload into the running snapshot
    fn merge_sample(&mut self, characteristic: Uuid, payload: &[u8]) {
        match decode_sample(characteristic, payload) {
            Ok(Some((metric, value))) => {
                debug!("Received {} = {}", metric.as_str(), value);
                self.snapshot.insert(metric, value);
            }
            Ok(None) => {}
            Err(e) => {
                warn!(
                    error_code = error_codes::DECODE_ERROR,
                    "Discarding sample: {}", e
                );
            }
        }
    }

    /// Sleep out a backoff period unless a stop request arrives first
    ///
    /// Returns true when the supervisor should exit.
    async fn backoff(&mut self, delay: Duration) -> bool {
        self.transition(SupervisorState::Backoff);
        info!("Retrying in {:?}", delay);

        let mut stop = self.stop.clone();
        tokio::select! {
            _ = sleep(delay) => false,
            _ = stop.wait_for(|stopped| *stopped) => true,
        }
    }

    fn transition(&mut self, next: SupervisorState) {
        if self.state != next {
            info!(
                from = self.state.as_str(),
                to = next.as_str(),
                "Supervisor state changed"
            );
            self.state = next;
        }
    }
}

/// Subscribe to every known sensor characteristic, counting successes
///
/// A failed subscription is logged and skipped. The session proceeds with
/// whatever characteristics accepted the subscription.
async fn subscribe_to_sensors(peripheral: &Peripheral) -> usize {
    let mut subscribed = 0;

    for characteristic in peripheral.characteristics() {
        let Some(metric) = metric_for_characteristic(characteristic.uuid) else {
            continue;
        };

        match peripheral.subscribe(&characteristic).await {
            Ok(()) => {
                info!("Subscribed to {} notifications", metric.as_str());
                subscribed += 1;
            }
            Err(e) => {
                warn!(
                    "Failed to subscribe to {} notifications: {}",
                    metric.as_str(),
                    e
                );
            }
        }
    }

    subscribed
}

/// Disconnect without letting a failure change the retry path
async fn release_quietly(peripheral: &Peripheral) {
    if let Err(e) = peripheral.disconnect().await {
        warn!("Failed to disconnect cleanly: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_delay_by_state() {
        assert_eq!(retry_delay(SupervisorState::Scanning), SCAN_RETRY_DELAY);
        assert_eq!(retry_delay(SupervisorState::Connecting), SESSION_RETRY_DELAY);
        assert_eq!(retry_delay(SupervisorState::Subscribing), SESSION_RETRY_DELAY);
        assert_eq!(retry_delay(SupervisorState::Monitoring), SESSION_RETRY_DELAY);
    }

    #[test]
    fn test_supervisor_state_as_str() {
        assert_eq!(SupervisorState::Idle.as_str(), "idle");
        assert_eq!(SupervisorState::Scanning.as_str(), "scanning");
        assert_eq!(SupervisorState::Connecting.as_str(), "connecting");
        assert_eq!(SupervisorState::Subscribing.as_str(), "subscribing");
        assert_eq!(SupervisorState::Monitoring.as_str(), "monitoring");
        assert_eq!(SupervisorState::Backoff.as_str(), "backoff");
    }
}
