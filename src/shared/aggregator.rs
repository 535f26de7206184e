use tracing::{error, info, warn};

use crate::advice::{AdviceGenerator, FALLBACK_STATUS_TEXT};
use crate::alerting::{admit, AlertDecision};
use crate::domain::{Alert, PlantRecord, Reading, Snapshot};
use crate::error::error_codes;
use crate::id_generator::IdGenerator;
use crate::notify::NotificationSink;
use crate::store::PlantStore;
use crate::thresholds::evaluate;
use crate::time::Clock;

/// Reply for a status query when the subject has no record
pub const NO_RECORD_TEXT: &str = "No plant registered yet!";

/// Reply for a status query before any reading has been recorded
pub const NO_READINGS_TEXT: &str = "No readings available yet!";

/// Outcome of a single subject update
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome {
    /// The record was due and has been updated
    Applied(Box<PlantRecord>),
    /// The monitoring interval has not elapsed yet
    NotDue,
    /// The subject has no record on disk
    NoRecord,
}

impl UpdateOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateOutcome::Applied(_) => "applied",
            UpdateOutcome::NotDue => "not_due",
            UpdateOutcome::NoRecord => "no_record",
        }
    }
}

/// Counters summarizing one monitoring cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    pub updated: usize,
    pub skipped: usize,
    pub errors: usize,
}

/// Apply the current sensor snapshot to one subject's record
///
/// Runs the full per-subject pipeline under the subject lock: due check,
/// history append and prune, persist, threshold evaluation, rate limit,
/// alert dispatch. A delivery failure is logged, never returned, since the
/// record is already persisted by the time dispatch runs.
pub async fn update_subject<S, G>(
    store: &PlantStore,
    subject_id: &str,
    snapshot: &Snapshot,
    clock: &dyn Clock,
    ids: &dyn IdGenerator,
    sink: &S,
    advice: &G,
) -> Result<UpdateOutcome, crate::error::StoreError>
where
    S: NotificationSink,
    G: AdviceGenerator,
{
    let _guard = store.lock_subject(subject_id).await;

    let mut record = match store.load(subject_id).await? {
        Some(record) => record,
        None => return Ok(UpdateOutcome::NoRecord),
    };

    let now = clock.now_utc();
    if !record.is_due(now) {
        return Ok(UpdateOutcome::NotDue);
    }

    let reading = Reading::from_snapshot(now, snapshot);
    record.reading_history.push(reading.clone());
    record.prune_history(now);
    record.latest_reading = Some(reading.clone());
    record.last_check_time = now;

    store.save(subject_id, &record).await?;

    // The history update stands even when evaluation is skipped
    if let Err(validation) = record.validate() {
        warn!(
            subject_id = %subject_id,
            error_code = error_codes::CONFIGURATION_ERROR,
            "Skipping threshold evaluation: {}",
            validation
        );
        return Ok(UpdateOutcome::Applied(Box::new(record)));
    }

    let breaches = match evaluate(&reading, &record.thresholds) {
        Some(breaches) => breaches,
        None => return Ok(UpdateOutcome::Applied(Box::new(record))),
    };

    match admit(record.last_alert_time, record.monitoring_frequency, now) {
        AlertDecision::Suppress => {
            info!(
                subject_id = %subject_id,
                breaches = breaches.len(),
                "Alert suppressed by rate limit"
            );
        }
        AlertDecision::Emit => {
            let alert = Alert {
                alert_id: ids.uuid_v4(),
                subject_id: subject_id.to_string(),
                timestamp: now,
                breaches,
            };

            // The rate-limit window opens before dispatch is attempted
            record.last_alert_time = Some(now);
            store.save(subject_id, &record).await?;

            let text = advice.render_alert(&record, &alert).await;
            match sink.push(subject_id, &text).await {
                Ok(()) => info!(
                    subject_id = %subject_id,
                    alert_id = %alert.alert_id,
                    breaches = alert.breaches.len(),
                    "Alert dispatched"
                ),
                Err(err) => error!(
                    subject_id = %subject_id,
                    alert_id = %alert.alert_id,
                    error_code = error_codes::DELIVERY_ERROR,
                    "Failed to deliver alert: {}",
                    err
                ),
            }
        }
    }

    Ok(UpdateOutcome::Applied(Box::new(record)))
}

/// Run one monitoring cycle over every registered subject
///
/// Subjects are processed independently: one failing record never stops
/// the rest of the cycle.
pub async fn process_tick<S, G>(
    store: &PlantStore,
    snapshot: &Snapshot,
    clock: &dyn Clock,
    ids: &dyn IdGenerator,
    sink: &S,
    advice: &G,
) -> TickSummary
where
    S: NotificationSink,
    G: AdviceGenerator,
{
    if snapshot.is_empty() {
        info!("No decoded samples yet, skipping cycle");
        return TickSummary::default();
    }

    let subjects = match store.list_subjects().await {
        Ok(subjects) => subjects,
        Err(err) => {
            error!(
                error_code = err.error_code(),
                "Failed to list subjects: {}", err
            );
            return TickSummary {
                updated: 0,
                skipped: 0,
                errors: 1,
            };
        }
    };

    let mut summary = TickSummary::default();
    for subject_id in subjects {
        match update_subject(store, &subject_id, snapshot, clock, ids, sink, advice).await {
            Ok(UpdateOutcome::Applied(_)) => summary.updated += 1,
            Ok(outcome) => {
                summary.skipped += 1;
                info!(
                    subject_id = %subject_id,
                    outcome = outcome.as_str(),
                    "Subject skipped"
                );
            }
            Err(err) => {
                summary.errors += 1;
                error!(
                    subject_id = %subject_id,
                    error_code = err.error_code(),
                    "Error updating subject: {}",
                    err
                );
                // Continue with the remaining subjects
            }
        }
    }

    info!(
        "Cycle complete: {} updated, {} skipped, {} errors",
        summary.updated, summary.skipped, summary.errors
    );

    summary
}

/// Render the on-demand status reply for one subject
pub async fn status_text<G>(store: &PlantStore, subject_id: &str, advice: &G) -> String
where
    G: AdviceGenerator,
{
    let _guard = store.lock_subject(subject_id).await;

    let record = match store.load(subject_id).await {
        Ok(Some(record)) => record,
        Ok(None) => return NO_RECORD_TEXT.to_string(),
        Err(err) => {
            error!(
                subject_id = %subject_id,
                error_code = err.error_code(),
                "Failed to load record for status: {}",
                err
            );
            return FALLBACK_STATUS_TEXT.to_string();
        }
    };

    if record.latest_reading.is_none() {
        return NO_READINGS_TEXT.to_string();
    }

    advice.render_status(&record).await
}
