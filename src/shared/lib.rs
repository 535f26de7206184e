// Declare modules at the root level
pub mod advice;
pub mod aggregator;
pub mod alerting;
pub mod decode;
pub mod domain;
pub mod error;
pub mod id_generator;
pub mod notify;
pub mod store;
pub mod thresholds;
pub mod time;
pub mod validators;

// Test utilities module (available in test and integration test builds)
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-export everything under a shared namespace for external access
pub mod shared {
    pub use super::advice;
    pub use super::aggregator;
    pub use super::alerting;
    pub use super::decode;
    pub use super::domain;
    pub use super::error;
    pub use super::id_generator;
    pub use super::notify;
    pub use super::store;
    pub use super::thresholds;
    pub use super::time;
    pub use super::validators;
}

// Also re-export at root for convenience
pub use advice::*;
pub use aggregator::*;
pub use alerting::*;
pub use decode::*;
pub use domain::*;
pub use error::*;
pub use id_generator::*;
pub use notify::*;
pub use store::*;
pub use thresholds::*;
pub use time::*;
pub use validators::*;
