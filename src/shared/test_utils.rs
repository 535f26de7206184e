//! Test utilities for property-based testing
//!
//! This module provides proptest generators for domain types (metrics,
//! snapshots, threshold ranges, readings, plant records, subject ids) and
//! fake collaborators for the notification and advice seams.

pub mod generators {
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    use crate::domain::{Metric, PlantRecord, Reading, Snapshot, ThresholdRange};
    use chrono::{DateTime, Utc};

    /// Generate one of the four sensor metrics
    pub fn metric() -> impl Strategy<Value = Metric> {
        prop::sample::select(Metric::ALL.to_vec())
    }

    /// Generate a sensor value with one decimal place
    /// Range covers every metric (temperatures through pressures)
    pub fn metric_value() -> impl Strategy<Value = f64> {
        (-400i32..=11_000i32).prop_map(|tenths| tenths as f64 / 10.0)
    }

    /// Generate a non-empty snapshot of decoded sensor values
    pub fn snapshot() -> impl Strategy<Value = Snapshot> {
        prop::collection::btree_map(metric(), metric_value(), 1..=4)
    }

    /// Generate a well-formed threshold range (finite, min <= max)
    pub fn threshold_range() -> impl Strategy<Value = ThresholdRange> {
        (metric_value(), metric_value()).prop_map(|(a, b)| {
            if a <= b {
                ThresholdRange { min: a, max: b }
            } else {
                ThresholdRange { min: b, max: a }
            }
        })
    }

    /// Generate a threshold map keyed by metric record keys
    pub fn thresholds_map() -> impl Strategy<Value = BTreeMap<String, ThresholdRange>> {
        prop::collection::btree_map(
            metric().prop_map(|m| m.as_str().to_string()),
            threshold_range(),
            0..=4,
        )
    }

    /// Generate a valid subject id (`U` + 32 lowercase hex digits)
    pub fn subject_id() -> impl Strategy<Value = String> {
        prop::string::string_regex("U[0-9a-f]{32}").expect("Valid regex for subject_id")
    }

    /// Generate a timestamp between 2020-01-01 and 2030-12-31
    pub fn timestamp() -> impl Strategy<Value = DateTime<Utc>> {
        (1_577_836_800i64..1_924_991_999i64)
            .prop_map(|seconds| DateTime::from_timestamp(seconds, 0).expect("Invalid timestamp"))
    }

    /// Generate a timestamped reading
    pub fn reading() -> impl Strategy<Value = Reading> {
        (timestamp(), snapshot()).prop_map(|(timestamp, values)| Reading { timestamp, values })
    }

    /// Generate a complete plant record that passes validation
    pub fn plant_record() -> impl Strategy<Value = PlantRecord> {
        (
            prop::string::string_regex("[A-Z][a-z]{3,10} [a-z]{3,12}")
                .expect("Valid regex for scientific_name"),
            prop::string::string_regex("[A-Za-z]{3,10}").expect("Valid regex for nickname"),
            thresholds_map(),
            1u32..=1440,
            prop::collection::vec(reading(), 0..5),
        )
            .prop_map(
                |(scientific_name, nickname, thresholds, monitoring_frequency, reading_history)| {
                    PlantRecord {
                        scientific_name,
                        nickname,
                        description: String::new(),
                        thresholds,
                        monitoring_frequency,
                        reading_history,
                        last_check_time: DateTime::<Utc>::UNIX_EPOCH,
                        last_alert_time: None,
                        latest_reading: None,
                    }
                },
            )
    }
}

pub mod fakes {
    use std::sync::Mutex;

    use crate::advice::AdviceGenerator;
    use crate::domain::{Alert, PlantRecord};
    use crate::error::DeliveryError;
    use crate::notify::NotificationSink;

    /// Sink that records every push for later assertions
    #[derive(Debug, Default)]
    pub struct RecordingSink {
        pushes: Mutex<Vec<(String, String)>>,
    }

    impl RecordingSink {
        pub fn new() -> Self {
            Self::default()
        }

        /// Snapshot of (subject_id, text) pairs pushed so far
        pub fn pushes(&self) -> Vec<(String, String)> {
            self.pushes.lock().unwrap().clone()
        }
    }

    impl NotificationSink for RecordingSink {
        async fn push(&self, subject_id: &str, text: &str) -> Result<(), DeliveryError> {
            self.pushes
                .lock()
                .unwrap()
                .push((subject_id.to_string(), text.to_string()));
            Ok(())
        }
    }

    /// Sink that rejects every push, for delivery-failure paths
    #[derive(Debug, Default)]
    pub struct FailingSink;

    impl NotificationSink for FailingSink {
        async fn push(&self, _subject_id: &str, _text: &str) -> Result<(), DeliveryError> {
            Err(DeliveryError::Transport("sink unavailable".to_string()))
        }
    }

    /// Advice generator returning canned texts
    #[derive(Debug, Clone)]
    pub struct CannedAdvice {
        pub alert_text: String,
        pub status_text: String,
    }

    impl CannedAdvice {
        pub fn new(alert_text: &str, status_text: &str) -> Self {
            Self {
                alert_text: alert_text.to_string(),
                status_text: status_text.to_string(),
            }
        }
    }

    impl Default for CannedAdvice {
        fn default() -> Self {
            Self::new("canned alert", "canned status")
        }
    }

    impl AdviceGenerator for CannedAdvice {
        async fn render_alert(&self, _record: &PlantRecord, _alert: &Alert) -> String {
            self.alert_text.clone()
        }

        async fn render_status(&self, _record: &PlantRecord) -> String {
            self.status_text.clone()
        }
    }
}

pub mod helpers {
    use chrono::{DateTime, Utc};

    /// Parse an RFC3339 timestamp for fixture data
    pub fn ts(timestamp: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(timestamp)
            .expect("Valid RFC3339 timestamp")
            .with_timezone(&Utc)
    }

    /// Check that a sequence of timestamps never decreases
    pub fn is_sorted_ascending(timestamps: &[DateTime<Utc>]) -> bool {
        timestamps.windows(2).all(|pair| pair[0] <= pair[1])
    }
}
