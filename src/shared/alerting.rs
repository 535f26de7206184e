use chrono::{DateTime, Duration, Utc};

/// Outcome of the alert rate-limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertDecision {
    Emit,
    Suppress,
}

impl AlertDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertDecision::Emit => "emit",
            AlertDecision::Suppress => "suppress",
        }
    }
}

/// Decide whether a breach batch may be dispatched
/// Suppressed while the previous alert is younger than the subject's window
pub fn admit(
    last_alert_time: Option<DateTime<Utc>>,
    window_minutes: u32,
    now: DateTime<Utc>,
) -> AlertDecision {
    match last_alert_time {
        Some(last) if now - last < Duration::minutes(window_minutes as i64) => {
            AlertDecision::Suppress
        }
        _ => AlertDecision::Emit,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(timestamp: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(timestamp)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_no_previous_alert_emits() {
        assert_eq!(admit(None, 60, at("2024-01-15T10:00:00Z")), AlertDecision::Emit);
    }

    #[test]
    fn test_recent_alert_suppresses() {
        let last = at("2024-01-15T10:00:00Z");

        assert_eq!(
            admit(Some(last), 60, at("2024-01-15T10:00:01Z")),
            AlertDecision::Suppress
        );
        assert_eq!(
            admit(Some(last), 60, at("2024-01-15T10:59:59Z")),
            AlertDecision::Suppress
        );
    }

    #[test]
    fn test_window_boundary_emits() {
        let last = at("2024-01-15T10:00:00Z");

        // Exactly the window length means the window has elapsed
        assert_eq!(
            admit(Some(last), 60, at("2024-01-15T11:00:00Z")),
            AlertDecision::Emit
        );
        assert_eq!(
            admit(Some(last), 60, at("2024-01-15T12:30:00Z")),
            AlertDecision::Emit
        );
    }

    #[test]
    fn test_zero_window_always_emits() {
        let last = at("2024-01-15T10:00:00Z");
        assert_eq!(admit(Some(last), 0, last), AlertDecision::Emit);
    }

    #[test]
    fn test_future_last_alert_suppresses() {
        // A last-alert timestamp ahead of the clock stays inside the window
        let last = at("2024-01-15T12:00:00Z");
        assert_eq!(
            admit(Some(last), 60, at("2024-01-15T10:00:00Z")),
            AlertDecision::Suppress
        );
    }

    #[test]
    fn test_decision_as_str() {
        assert_eq!(AlertDecision::Emit.as_str(), "emit");
        assert_eq!(AlertDecision::Suppress.as_str(), "suppress");
    }
}
