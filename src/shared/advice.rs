use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::future::Future;

use crate::domain::{Alert, Breach, BreachDirection, Metric, PlantRecord, Reading, ThresholdRange};

/// Sent in place of generated advice when alert rendering fails
pub const FALLBACK_ALERT_TEXT: &str =
    "I noticed some unusual readings from your plant. Please check on it!";

/// Sent in place of a generated status update when rendering fails
pub const FALLBACK_STATUS_TEXT: &str =
    "Sorry, I'm having trouble checking your plant right now!";

/// Renders the natural-language texts pushed to subjects.
///
/// Implemented by the Groq chat client in the monitor binary and by canned
/// fakes in tests. Rendering never fails: implementations fall back to the
/// stock texts when generation is unavailable.
pub trait AdviceGenerator: Send + Sync {
    /// Render the outbound text for a breach alert
    fn render_alert(
        &self,
        record: &PlantRecord,
        alert: &Alert,
    ) -> impl Future<Output = String> + Send;

    /// Render an on-demand status update
    fn render_status(&self, record: &PlantRecord) -> impl Future<Output = String> + Send;
}

/// Build the alert prompt for the advice model
pub fn alert_prompt(record: &PlantRecord, alert: &Alert) -> String {
    let mut prompt = String::new();
    let _ = writeln!(
        prompt,
        "You are Plantita, a caring plant expert. Create a friendly but urgent alert message \
         about these concerning conditions for {} ({}):",
        record.nickname, record.scientific_name
    );
    let _ = writeln!(prompt, "Current readings: {}", format_latest(record));
    let _ = writeln!(prompt, "Alerts: {}", format_breaches(&alert.breaches));
    let _ = writeln!(prompt, "Ideal ranges: {}", format_thresholds(&record.thresholds));
    prompt.push_str("Make it sound caring but emphasize the importance of addressing these issues.");
    prompt
}

/// Build the status-update prompt for the advice model
pub fn status_prompt(record: &PlantRecord) -> String {
    let mut prompt = String::new();
    let _ = writeln!(
        prompt,
        "You are Plantita, a caring plant expert. Create a friendly status update for {} ({}):",
        record.nickname, record.scientific_name
    );
    let _ = writeln!(prompt, "Current readings: {}", format_latest(record));
    let _ = writeln!(prompt, "Ideal ranges: {}", format_thresholds(&record.thresholds));
    prompt.push_str("Include both the current status and any care suggestions if needed.");
    prompt
}

fn format_latest(record: &PlantRecord) -> String {
    match &record.latest_reading {
        Some(reading) => format_reading(reading),
        None => "none recorded yet".to_string(),
    }
}

fn format_reading(reading: &Reading) -> String {
    if reading.values.is_empty() {
        return "none recorded yet".to_string();
    }

    reading
        .values
        .iter()
        .map(|(metric, value)| format!("{}: {}{}", metric.as_str(), value, metric.unit()))
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_breaches(breaches: &[Breach]) -> String {
    breaches
        .iter()
        .map(|breach| {
            let side = match breach.direction {
                BreachDirection::Low => "below",
                BreachDirection::High => "above",
            };
            format!(
                "{}: {}{} ({} {}{})",
                breach.metric.as_str(),
                breach.value,
                breach.metric.unit(),
                side,
                breach.bound,
                breach.metric.unit()
            )
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn format_thresholds(thresholds: &BTreeMap<String, ThresholdRange>) -> String {
    if thresholds.is_empty() {
        return "none configured".to_string();
    }

    thresholds
        .iter()
        .map(|(key, range)| {
            let unit = Metric::from_key(key).map(|m| m.unit()).unwrap_or("");
            format!("{}: {}{} to {}{}", key, range.min, unit, range.max, unit)
        })
        .collect::<Vec<_>>()
        .join(", ")
}
