//! Pregnancy outcome recording.
//!
//! This module holds the single transition function that closes a pregnancy episode.
//! Status is never mutated ad hoc elsewhere: every terminal state and every
//! parity/abortion counter change goes through [`record_outcome`], which keeps the
//! terminal-state invariants in one place.
//!
//! The function is pure: it takes the current record and a reference date, and returns an
//! updated copy plus a confirmation message. Persistence (and its atomicity) is the
//! calling service's job.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{RecordError, RecordResult};
use crate::pregnancy::{elapsed_weeks, PregnancyStatus, PARITY_WEEK_THRESHOLD};
use crate::repositories::trackings::PregnancyTracking;

/// Delivery details supplied with a completed-delivery outcome.
///
/// All fields are mandatory; the caller validates presence before constructing this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryDetails {
    pub outcome_sex: String,
    pub outcome_weight: String,
    pub place_of_delivery: String,
    pub date_delivery: NaiveDate,
    pub phic: bool,
}

/// The two kinds of outcome event that can close a pregnancy episode.
#[derive(Debug, Clone, PartialEq)]
pub enum PregnancyOutcome {
    /// Pregnancy loss (miscarriage or abortion).
    Miscarriage,
    /// Completed delivery with its mandatory detail fields.
    Delivery(DeliveryDetails),
}

/// Result of recording an outcome: the updated record and a human-readable
/// confirmation for the operator.
#[derive(Debug, Clone)]
pub struct OutcomeUpdate {
    pub record: PregnancyTracking,
    pub message: String,
}

/// Closes a pregnancy episode, updating parity/abortion counters and setting the
/// terminal status.
///
/// Invoked exactly once per episode while the record is still open. The rules:
///
/// **Miscarriage** at more than 20 weeks since LMP counts toward parity (fetal loss after
/// 20 weeks is a delivery for counting purposes); at 20 weeks or earlier it counts toward
/// abortion. Either way the record closes with status `miscarriage_abortion`.
///
/// **Delivery** at more than 20 weeks adds one to parity, unless the record's status was
/// already `miscarriage_abortion` (a previously mis-recorded loss being superseded by a
/// real delivery), in which case parity is left unchanged. A delivery at 20 weeks or
/// earlier is treated as a reclassification of an earlier-counted abortion: abortion is
/// decremented, floored at zero. The record closes with status `completed`, the
/// antenatal-care-given flag is set, and the delivery detail fields are stored.
///
/// Counters are unsigned, so the "coerce to zero if invalid" rule of the paper process is
/// enforced by the type; no negative value can be stored.
///
/// # Arguments
///
/// * `record` - The tracking record to close.
/// * `outcome` - The outcome event.
/// * `today` - Reference date for the gestational-week computation.
///
/// # Errors
///
/// - [`RecordError::InvalidState`] if the record is already closed (`is_done == true`).
/// - [`RecordError::MissingLmp`] if the record has no LMP date; callers are expected to
///   block outcome recording on such records before getting here.
pub fn record_outcome(
    record: &PregnancyTracking,
    outcome: PregnancyOutcome,
    today: NaiveDate,
) -> RecordResult<OutcomeUpdate> {
    if record.is_done {
        return Err(RecordError::InvalidState);
    }
    let lmp = record.lmp.ok_or(RecordError::MissingLmp)?;
    let weeks_since_lmp = elapsed_weeks(lmp, today);

    let mut updated = record.clone();

    let message = match outcome {
        PregnancyOutcome::Miscarriage => {
            if weeks_since_lmp > PARITY_WEEK_THRESHOLD {
                updated.parity += 1;
                updated.pregnancy_status = Some(PregnancyStatus::MiscarriageAbortion);
                updated.is_done = true;
                "Miscarriage/abortion happened more than 20 weeks after LMP. Parity is updated."
            } else {
                updated.abortion += 1;
                updated.pregnancy_status = Some(PregnancyStatus::MiscarriageAbortion);
                updated.is_done = true;
                "Miscarriage/abortion happened less than 20 weeks after LMP. Abortion is updated."
            }
        }
        PregnancyOutcome::Delivery(details) => {
            let was_miscarriage_before =
                record.pregnancy_status == Some(PregnancyStatus::MiscarriageAbortion);

            if weeks_since_lmp > PARITY_WEEK_THRESHOLD {
                if !was_miscarriage_before {
                    updated.parity += 1;
                }
                // was_miscarriage_before: the earlier loss already counted; parity
                // stays as-is and can never go below zero.
            } else {
                updated.abortion = updated.abortion.saturating_sub(1);
            }

            updated.pregnancy_status = Some(PregnancyStatus::Completed);
            updated.is_done = true;
            updated.anc_given = true;
            updated.phic = details.phic;
            updated.outcome_sex = Some(details.outcome_sex);
            updated.outcome_weight = Some(details.outcome_weight);
            updated.place_of_delivery = Some(details.place_of_delivery);
            updated.date_delivery = Some(details.date_delivery);

            "Pregnancy tracking updated successfully."
        }
    };

    Ok(OutcomeUpdate {
        record: updated,
        message: message.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uuid::RecordUuid;
    use chrono::{NaiveDate, Utc};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid test date")
    }

    fn open_record(lmp: Option<NaiveDate>) -> PregnancyTracking {
        PregnancyTracking {
            id: RecordUuid::new(),
            tracking_number: None,
            patient_id: RecordUuid::new(),
            fullname: "Maria Santos".to_string(),
            age: 27,
            birth_date: date(1998, 2, 14),
            lmp,
            gravidity: 2,
            parity: 1,
            abortion: 0,
            pregnancy_status: lmp.map(|d| crate::pregnancy::classify_status(d, d)),
            is_done: false,
            anc_given: false,
            phic: false,
            health_station: None,
            attending_physician: None,
            risk_codes: vec![],
            outcome_sex: None,
            outcome_weight: None,
            place_of_delivery: None,
            date_delivery: None,
            created_at: Utc::now(),
        }
    }

    fn delivery_details() -> DeliveryDetails {
        DeliveryDetails {
            outcome_sex: "female".to_string(),
            outcome_weight: "3.1".to_string(),
            place_of_delivery: "District Hospital".to_string(),
            date_delivery: date(2025, 10, 1),
            phic: true,
        }
    }

    fn reference_after_weeks(lmp: NaiveDate, weeks: i64) -> NaiveDate {
        lmp + chrono::Duration::weeks(weeks)
    }

    #[test]
    fn miscarriage_after_twenty_weeks_updates_parity() {
        let lmp = date(2025, 1, 6);
        let record = open_record(Some(lmp));

        let update = record_outcome(
            &record,
            PregnancyOutcome::Miscarriage,
            reference_after_weeks(lmp, 21),
        )
        .expect("outcome should be recorded");

        assert_eq!(update.record.parity, record.parity + 1);
        assert_eq!(update.record.abortion, record.abortion);
        assert_eq!(
            update.record.pregnancy_status,
            Some(PregnancyStatus::MiscarriageAbortion)
        );
        assert!(update.record.is_done);
        assert!(update.message.contains("more than 20 weeks"));
    }

    #[test]
    fn miscarriage_at_or_before_twenty_weeks_updates_abortion() {
        let lmp = date(2025, 1, 6);
        let record = open_record(Some(lmp));

        let update = record_outcome(
            &record,
            PregnancyOutcome::Miscarriage,
            reference_after_weeks(lmp, 19),
        )
        .expect("outcome should be recorded");

        assert_eq!(update.record.abortion, record.abortion + 1);
        assert_eq!(update.record.parity, record.parity);
        assert_eq!(
            update.record.pregnancy_status,
            Some(PregnancyStatus::MiscarriageAbortion)
        );
        assert!(update.record.is_done);
        assert!(update.message.contains("less than 20 weeks"));
    }

    #[test]
    fn delivery_after_twenty_weeks_increments_parity_and_sets_completed() {
        let lmp = date(2025, 1, 6);
        let record = open_record(Some(lmp));

        let update = record_outcome(
            &record,
            PregnancyOutcome::Delivery(delivery_details()),
            reference_after_weeks(lmp, 25),
        )
        .expect("outcome should be recorded");

        assert_eq!(update.record.parity, record.parity + 1);
        assert_eq!(
            update.record.pregnancy_status,
            Some(PregnancyStatus::Completed)
        );
        assert!(update.record.is_done);
        assert!(update.record.anc_given);
        assert_eq!(update.record.outcome_sex.as_deref(), Some("female"));
        assert_eq!(update.record.date_delivery, Some(date(2025, 10, 1)));
    }

    #[test]
    fn delivery_superseding_prior_miscarriage_leaves_parity_unchanged() {
        // Documented quirk carried over from the paper process: the earlier
        // loss's parity increment is not undone when a real delivery record
        // supersedes it. Parity stays exactly where it was, floored at zero.
        let lmp = date(2025, 1, 6);
        let mut record = open_record(Some(lmp));
        record.pregnancy_status = Some(PregnancyStatus::MiscarriageAbortion);
        record.parity = 0;

        let update = record_outcome(
            &record,
            PregnancyOutcome::Delivery(delivery_details()),
            reference_after_weeks(lmp, 25),
        )
        .expect("outcome should be recorded");

        assert_eq!(update.record.parity, 0, "parity must not go negative");
        assert_eq!(
            update.record.pregnancy_status,
            Some(PregnancyStatus::Completed)
        );
        assert!(update.record.is_done);
    }

    #[test]
    fn early_delivery_decrements_abortion_floored_at_zero() {
        let lmp = date(2025, 1, 6);
        let mut record = open_record(Some(lmp));
        record.abortion = 1;

        let update = record_outcome(
            &record,
            PregnancyOutcome::Delivery(delivery_details()),
            reference_after_weeks(lmp, 15),
        )
        .expect("outcome should be recorded");
        assert_eq!(update.record.abortion, 0);

        // At zero, the floor holds.
        let mut record = open_record(Some(lmp));
        record.abortion = 0;
        let update = record_outcome(
            &record,
            PregnancyOutcome::Delivery(delivery_details()),
            reference_after_weeks(lmp, 15),
        )
        .expect("outcome should be recorded");
        assert_eq!(update.record.abortion, 0, "abortion is floored at zero");
    }

    #[test]
    fn second_outcome_on_closed_record_fails_without_mutating() {
        let lmp = date(2025, 1, 6);
        let record = open_record(Some(lmp));

        let closed = record_outcome(
            &record,
            PregnancyOutcome::Miscarriage,
            reference_after_weeks(lmp, 21),
        )
        .expect("first outcome should be recorded")
        .record;

        let err = record_outcome(
            &closed,
            PregnancyOutcome::Miscarriage,
            reference_after_weeks(lmp, 22),
        )
        .expect_err("second outcome must be rejected");

        assert!(matches!(err, RecordError::InvalidState));
        // The closed record itself is untouched by the failed call.
        assert_eq!(closed.parity, record.parity + 1);
        assert_eq!(closed.abortion, record.abortion);
    }

    #[test]
    fn outcome_without_lmp_is_a_precondition_violation() {
        let record = open_record(None);
        let err = record_outcome(&record, PregnancyOutcome::Miscarriage, date(2025, 6, 1))
            .expect_err("records without LMP cannot record an outcome");
        assert!(matches!(err, RecordError::MissingLmp));
    }
}
