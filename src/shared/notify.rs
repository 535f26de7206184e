use std::future::Future;

use crate::error::DeliveryError;

/// Abstraction over the channel that delivers messages to subjects.
///
/// Implemented by the LINE push client in the monitor binary and by
/// recording fakes in tests. All methods return `Send` futures so the
/// trait can be used from multi-threaded async runtimes.
pub trait NotificationSink: Send + Sync {
    /// Push a text message to one subject
    ///
    /// Delivery is best effort from the caller's perspective: a failed push
    /// is reported but must not abort the monitoring cycle.
    fn push(
        &self,
        subject_id: &str,
        text: &str,
    ) -> impl Future<Output = Result<(), DeliveryError>> + Send;
}
