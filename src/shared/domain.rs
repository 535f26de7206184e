use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::validators::{
    validate_monitoring_frequency, validate_threshold_range, ValidationError,
};

/// Days of reading history kept in a plant record
pub const HISTORY_RETENTION_DAYS: i64 = 7;

// ============================================================================
// Metric Models
// ============================================================================

/// Metric measured by the plant sensor
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Temperature,
    Humidity,
    // Stored records and threshold maps use the short key
    #[serde(rename = "moisture")]
    SoilMoisture,
    Pressure,
}

impl Metric {
    pub const ALL: [Metric; 4] = [
        Metric::Temperature,
        Metric::Humidity,
        Metric::SoilMoisture,
        Metric::Pressure,
    ];

    /// Key used in stored records and threshold maps
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Temperature => "temperature",
            Metric::Humidity => "humidity",
            Metric::SoilMoisture => "moisture",
            Metric::Pressure => "pressure",
        }
    }

    /// Look up a metric by its record key
    pub fn from_key(key: &str) -> Option<Metric> {
        Metric::ALL.iter().find(|m| m.as_str() == key).copied()
    }

    /// Unit suffix for human-readable messages
    pub fn unit(&self) -> &'static str {
        match self {
            Metric::Temperature => "°C",
            Metric::Humidity => "%",
            Metric::SoilMoisture => "%",
            Metric::Pressure => "hPa",
        }
    }
}

/// Latest decoded value per metric, as accumulated from sensor notifications
pub type Snapshot = BTreeMap<Metric, f64>;

// ============================================================================
// Reading Models
// ============================================================================

/// A timestamped snapshot appended to a subject's reading history
/// Metric values sit alongside the timestamp in the stored JSON
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Reading {
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub values: BTreeMap<Metric, f64>,
}

impl Reading {
    /// Stamp a snapshot with the time it was recorded
    pub fn from_snapshot(timestamp: DateTime<Utc>, snapshot: &Snapshot) -> Self {
        Self {
            timestamp,
            values: snapshot.clone(),
        }
    }
}

// ============================================================================
// Threshold Models
// ============================================================================

/// Acceptable range for a metric
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ThresholdRange {
    pub min: f64,
    pub max: f64,
}

impl ThresholdRange {
    /// Check a value against the range
    /// Returns the direction and violated bound, or None when in range
    pub fn check(&self, value: f64) -> Option<(BreachDirection, f64)> {
        if value < self.min {
            Some((BreachDirection::Low, self.min))
        } else if value > self.max {
            Some((BreachDirection::High, self.max))
        } else {
            None
        }
    }
}

/// Which side of the range a value fell on
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BreachDirection {
    Low,
    High,
}

impl BreachDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            BreachDirection::Low => "low",
            BreachDirection::High => "high",
        }
    }
}

// ============================================================================
// Alert Models
// ============================================================================

/// A single out-of-range metric within an alert
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Breach {
    pub metric: Metric,
    pub value: f64,
    pub bound: f64,
    pub direction: BreachDirection,
}

/// One alert covering every breached metric of a single check
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Alert {
    pub alert_id: String,
    pub subject_id: String,
    pub timestamp: DateTime<Utc>,
    pub breaches: Vec<Breach>,
}

// ============================================================================
// Plant Record
// ============================================================================

/// Stored state for one monitored plant, one JSON file per subject
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlantRecord {
    pub scientific_name: String,
    pub nickname: String,
    #[serde(default)]
    pub description: String,
    pub thresholds: BTreeMap<String, ThresholdRange>,
    /// Minutes between checks, also the alert rate-limit window
    pub monitoring_frequency: u32,
    #[serde(default)]
    pub reading_history: Vec<Reading>,
    /// Defaults to the epoch so a fresh record is due immediately
    #[serde(default = "unix_epoch")]
    pub last_check_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_alert_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub latest_reading: Option<Reading>,
}

fn unix_epoch() -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH
}

impl PlantRecord {
    /// Whether the subject's monitoring interval has elapsed
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        now - self.last_check_time >= Duration::minutes(self.monitoring_frequency as i64)
    }

    /// Drop history entries older than the retention window
    /// Keeps entries strictly newer than the cutoff
    pub fn prune_history(&mut self, now: DateTime<Utc>) {
        let cutoff = now - Duration::days(HISTORY_RETENTION_DAYS);
        self.reading_history.retain(|r| r.timestamp > cutoff);
    }

    /// Validate record contents (threshold ranges and frequency)
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (metric, range) in &self.thresholds {
            validate_threshold_range(metric, range.min, range.max)?;
        }
        validate_monitoring_frequency(self.monitoring_frequency)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record() -> PlantRecord {
        let mut thresholds = BTreeMap::new();
        thresholds.insert(
            "temperature".to_string(),
            ThresholdRange {
                min: 15.0,
                max: 30.0,
            },
        );
        thresholds.insert(
            "moisture".to_string(),
            ThresholdRange {
                min: 20.0,
                max: 80.0,
            },
        );

        PlantRecord {
            scientific_name: "Monstera deliciosa".to_string(),
            nickname: "Monty".to_string(),
            description: "Lives by the window".to_string(),
            thresholds,
            monitoring_frequency: 60,
            reading_history: Vec::new(),
            last_check_time: unix_epoch(),
            last_alert_time: None,
            latest_reading: None,
        }
    }

    #[test]
    fn test_metric_keys() {
        assert_eq!(Metric::Temperature.as_str(), "temperature");
        assert_eq!(Metric::Humidity.as_str(), "humidity");
        assert_eq!(Metric::SoilMoisture.as_str(), "moisture");
        assert_eq!(Metric::Pressure.as_str(), "pressure");
    }

    #[test]
    fn test_metric_from_key() {
        assert_eq!(Metric::from_key("moisture"), Some(Metric::SoilMoisture));
        assert_eq!(Metric::from_key("pressure"), Some(Metric::Pressure));
        assert_eq!(Metric::from_key("light"), None);
        assert_eq!(Metric::from_key("soil_moisture"), None);
    }

    #[test]
    fn test_metric_serde_matches_as_str() {
        for metric in Metric::ALL {
            let json = serde_json::to_string(&metric).unwrap();
            assert_eq!(json, format!("\"{}\"", metric.as_str()));

            let back: Metric = serde_json::from_str(&json).unwrap();
            assert_eq!(back, metric);
        }
    }

    #[test]
    fn test_threshold_check() {
        let range = ThresholdRange {
            min: 15.0,
            max: 30.0,
        };

        // In range, boundaries included
        assert_eq!(range.check(20.0), None);
        assert_eq!(range.check(15.0), None);
        assert_eq!(range.check(30.0), None);

        // Out of range
        assert_eq!(range.check(14.9), Some((BreachDirection::Low, 15.0)));
        assert_eq!(range.check(30.1), Some((BreachDirection::High, 30.0)));
    }

    #[test]
    fn test_reading_serializes_values_inline() {
        let mut values = BTreeMap::new();
        values.insert(Metric::Temperature, 22.5);
        values.insert(Metric::SoilMoisture, 45.0);

        let reading = Reading {
            timestamp: DateTime::parse_from_rfc3339("2024-01-15T10:30:00Z")
                .unwrap()
                .with_timezone(&Utc),
            values,
        };

        let json: serde_json::Value = serde_json::to_value(&reading).unwrap();
        assert!(json.get("timestamp").is_some());
        assert_eq!(json.get("temperature").and_then(|v| v.as_f64()), Some(22.5));
        assert_eq!(json.get("moisture").and_then(|v| v.as_f64()), Some(45.0));
        assert!(json.get("values").is_none());

        let back: Reading = serde_json::from_value(json).unwrap();
        assert_eq!(back, reading);
    }

    #[test]
    fn test_reading_rejects_unknown_metric() {
        let result = serde_json::from_str::<Reading>(
            r#"{"timestamp": "2024-01-15T10:30:00Z", "temperature": 22.5, "light": 300.0}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_record_accepts_unknown_threshold_keys() {
        // Threshold maps may carry metrics the sensor never reports
        let json = r#"{
            "scientific_name": "Monstera deliciosa",
            "nickname": "Monty",
            "thresholds": {
                "temperature": {"min": 15.0, "max": 30.0},
                "light": {"min": 100.0, "max": 800.0}
            },
            "monitoring_frequency": 60
        }"#;

        let record: PlantRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.thresholds.len(), 2);
        assert!(record.thresholds.contains_key("light"));
    }

    #[test]
    fn test_record_defaults_on_fresh_registration() {
        // A record written at registration time has no monitor-managed fields yet
        let json = r#"{
            "scientific_name": "Ficus lyrata",
            "nickname": "Fig",
            "thresholds": {"moisture": {"min": 30.0, "max": 70.0}},
            "monitoring_frequency": 120
        }"#;

        let record: PlantRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.description, "");
        assert!(record.reading_history.is_empty());
        assert_eq!(record.last_check_time, unix_epoch());
        assert_eq!(record.last_alert_time, None);
        assert_eq!(record.latest_reading, None);

        // Epoch default means the first cycle finds it due
        let now = DateTime::parse_from_rfc3339("2024-01-15T10:30:00Z")
            .unwrap()
            .with_timezone(&Utc);
        assert!(record.is_due(now));
    }

    #[test]
    fn test_record_skips_absent_optionals() {
        let record = sample_record();
        let json: serde_json::Value = serde_json::to_value(&record).unwrap();

        assert!(json.get("last_alert_time").is_none());
        assert!(json.get("latest_reading").is_none());
        assert!(json.get("last_check_time").is_some());
    }

    #[test]
    fn test_is_due_boundary() {
        let mut record = sample_record();
        let checked_at = DateTime::parse_from_rfc3339("2024-01-15T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        record.last_check_time = checked_at;

        // Just before the interval elapses
        assert!(!record.is_due(checked_at + Duration::minutes(59)));
        // Exactly at the interval
        assert!(record.is_due(checked_at + Duration::minutes(60)));
        // Well past
        assert!(record.is_due(checked_at + Duration::hours(3)));
    }

    #[test]
    fn test_zero_frequency_always_due() {
        let mut record = sample_record();
        record.monitoring_frequency = 0;
        record.last_check_time = DateTime::parse_from_rfc3339("2024-01-15T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);

        assert!(record.is_due(record.last_check_time));
    }

    #[test]
    fn test_prune_history_cutoff() {
        let now = DateTime::parse_from_rfc3339("2024-01-15T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let cutoff = now - Duration::days(HISTORY_RETENTION_DAYS);

        let mut record = sample_record();
        let reading_at = |ts: DateTime<Utc>| Reading {
            timestamp: ts,
            values: BTreeMap::new(),
        };
        record.reading_history = vec![
            reading_at(cutoff - Duration::seconds(1)), // too old
            reading_at(cutoff),                        // exactly at cutoff, dropped
            reading_at(cutoff + Duration::seconds(1)), // kept
            reading_at(now),                           // kept
        ];

        record.prune_history(now);

        assert_eq!(record.reading_history.len(), 2);
        assert!(record
            .reading_history
            .iter()
            .all(|r| r.timestamp > cutoff));
    }

    #[test]
    fn test_validate_rejects_inverted_threshold() {
        let mut record = sample_record();
        record.thresholds.insert(
            "humidity".to_string(),
            ThresholdRange {
                min: 80.0,
                max: 20.0,
            },
        );

        let err = record.validate().unwrap_err();
        assert_eq!(err.field, "thresholds.humidity");
    }

    #[test]
    fn test_validate_accepts_sample_record() {
        assert!(sample_record().validate().is_ok());
    }

    #[test]
    fn test_alert_serde_shape() {
        let alert = Alert {
            alert_id: "550e8400-e29b-41d4-a716-446655440000".to_string(),
            subject_id: "U4af4980629a2c4cbf1833e4d40ed7d1b".to_string(),
            timestamp: DateTime::parse_from_rfc3339("2024-01-15T10:30:00Z")
                .unwrap()
                .with_timezone(&Utc),
            breaches: vec![Breach {
                metric: Metric::SoilMoisture,
                value: 12.3,
                bound: 20.0,
                direction: BreachDirection::Low,
            }],
        };

        let json: serde_json::Value = serde_json::to_value(&alert).unwrap();
        assert_eq!(
            json["breaches"][0]["metric"].as_str(),
            Some("moisture")
        );
        assert_eq!(json["breaches"][0]["direction"].as_str(), Some("low"));
    }
}
