use std::collections::BTreeMap;

use crate::domain::{Breach, Reading, ThresholdRange};

/// Compare a reading against a subject's configured thresholds
/// Only metrics present in both the reading and the threshold map are checked,
/// and every breached metric lands in one batch
pub fn evaluate(
    reading: &Reading,
    thresholds: &BTreeMap<String, ThresholdRange>,
) -> Option<Vec<Breach>> {
    let mut breaches = Vec::new();

    for (metric, value) in &reading.values {
        if let Some(range) = thresholds.get(metric.as_str()) {
            if let Some((direction, bound)) = range.check(*value) {
                breaches.push(Breach {
                    metric: *metric,
                    value: *value,
                    bound,
                    direction,
                });
            }
        }
    }

    if breaches.is_empty() {
        None
    } else {
        Some(breaches)
    }
}
