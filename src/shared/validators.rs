use regex::Regex;
use std::sync::OnceLock;

/// Validation error type
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Validation error for field '{}': {}",
            self.field, self.message
        )
    }
}

impl std::error::Error for ValidationError {}

/// Validate subject ID format (LINE user ID: `U` followed by 32 lowercase hex digits)
pub fn validate_subject_id(subject_id: &str) -> Result<(), ValidationError> {
    static SUBJECT_ID_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = SUBJECT_ID_REGEX.get_or_init(|| Regex::new(r"^U[0-9a-f]{32}$").unwrap());

    if regex.is_match(subject_id) {
        Ok(())
    } else {
        Err(ValidationError::new(
            "subject_id",
            "Subject ID must be 'U' followed by 32 lowercase hexadecimal digits",
        ))
    }
}

/// Validate a single threshold range for a metric
/// Bounds must be finite and ordered (min <= max)
pub fn validate_threshold_range(metric: &str, min: f64, max: f64) -> Result<(), ValidationError> {
    if !min.is_finite() || !max.is_finite() {
        return Err(ValidationError::new(
            format!("thresholds.{}", metric),
            "Threshold bounds must be finite numbers",
        ));
    }

    if min > max {
        return Err(ValidationError::new(
            format!("thresholds.{}", metric),
            format!("Threshold min {} exceeds max {}", min, max),
        ));
    }

    Ok(())
}

/// Validate monitoring frequency in minutes
/// Zero is allowed (the subject is due on every cycle)
pub fn validate_monitoring_frequency(minutes: u32) -> Result<(), ValidationError> {
    // One year in minutes. Anything beyond that means a mangled record.
    const MAX_FREQUENCY_MINUTES: u32 = 525_600;

    if minutes > MAX_FREQUENCY_MINUTES {
        return Err(ValidationError::new(
            "monitoring_frequency",
            format!(
                "Monitoring frequency {} exceeds maximum of {} minutes",
                minutes, MAX_FREQUENCY_MINUTES
            ),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_subject_id() {
        // Valid subject IDs
        assert!(validate_subject_id("U4af4980629a2c4cbf1833e4d40ed7d1b").is_ok());
        assert!(validate_subject_id("U0000000000000000000000000000000f").is_ok());
        assert!(validate_subject_id(&format!("U{}", "a".repeat(32))).is_ok());

        // Invalid subject IDs
        assert!(validate_subject_id("").is_err()); // empty
        assert!(validate_subject_id("4af4980629a2c4cbf1833e4d40ed7d1b").is_err()); // missing prefix
        assert!(validate_subject_id("u4af4980629a2c4cbf1833e4d40ed7d1b").is_err()); // lowercase prefix
        assert!(validate_subject_id("U4AF4980629A2C4CBF1833E4D40ED7D1B").is_err()); // uppercase hex
        assert!(validate_subject_id("U4af4980629a2c4cbf1833e4d40ed7d1").is_err()); // too short
        assert!(validate_subject_id("U4af4980629a2c4cbf1833e4d40ed7d1bc").is_err()); // too long
        assert!(validate_subject_id("U4af4980629a2c4cbf1833e4d40ed7d1g").is_err()); // invalid hex
    }

    #[test]
    fn test_validate_threshold_range() {
        // Valid ranges
        assert!(validate_threshold_range("temperature", 15.0, 30.0).is_ok());
        assert!(validate_threshold_range("moisture", 0.0, 100.0).is_ok());
        assert!(validate_threshold_range("humidity", 50.0, 50.0).is_ok()); // min == max

        // Invalid ranges
        assert!(validate_threshold_range("temperature", 30.0, 15.0).is_err()); // inverted
        assert!(validate_threshold_range("temperature", f64::NAN, 30.0).is_err());
        assert!(validate_threshold_range("temperature", 15.0, f64::INFINITY).is_err());
        assert!(validate_threshold_range("temperature", f64::NEG_INFINITY, 30.0).is_err());
    }

    #[test]
    fn test_validate_threshold_range_error_names_metric() {
        let err = validate_threshold_range("moisture", 80.0, 20.0).unwrap_err();
        assert_eq!(err.field, "thresholds.moisture");
    }

    #[test]
    fn test_validate_monitoring_frequency() {
        assert!(validate_monitoring_frequency(0).is_ok()); // due every cycle
        assert!(validate_monitoring_frequency(60).is_ok());
        assert!(validate_monitoring_frequency(525_600).is_ok()); // exactly one year

        assert!(validate_monitoring_frequency(525_601).is_err());
        assert!(validate_monitoring_frequency(u32::MAX).is_err());
    }
}
