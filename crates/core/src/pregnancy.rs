//! Gestational-age computation and pregnancy status classification.
//!
//! Everything in this module is a pure function over calendar dates. The reference date
//! ("now") is always an explicit parameter so that callers control the clock; nothing here
//! reads ambient time.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::RecordError;

/// Last week of the first trimester (inclusive).
pub const FIRST_TRIMESTER_MAX_WEEKS: i64 = 12;

/// Last week of the second trimester (inclusive).
pub const SECOND_TRIMESTER_MAX_WEEKS: i64 = 27;

/// Last week of the third trimester (inclusive); beyond this is postpartum.
pub const THIRD_TRIMESTER_MAX_WEEKS: i64 = 40;

/// Gestational week boundary separating an abortion from a delivery for
/// parity counting. Losses after this many weeks count toward parity.
pub const PARITY_WEEK_THRESHOLD: i64 = 20;

/// The closed set of pregnancy statuses a tracking record can hold.
///
/// The four trimester/postpartum values are derived from the LMP date while the record is
/// open. The terminal values (`MiscarriageAbortion`, `Completed`) are set exactly once by
/// the outcome recorder. `Discontinued` and `Normal` are operator-set administrative
/// states. Status is never free-typed by users.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PregnancyStatus {
    FirstTrimester,
    SecondTrimester,
    ThirdTrimester,
    Postpartum,
    MiscarriageAbortion,
    Completed,
    Discontinued,
    Normal,
}

impl PregnancyStatus {
    /// Returns the wire/storage string for this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            PregnancyStatus::FirstTrimester => "first_trimester",
            PregnancyStatus::SecondTrimester => "second_trimester",
            PregnancyStatus::ThirdTrimester => "third_trimester",
            PregnancyStatus::Postpartum => "postpartum",
            PregnancyStatus::MiscarriageAbortion => "miscarriage_abortion",
            PregnancyStatus::Completed => "completed",
            PregnancyStatus::Discontinued => "discontinued",
            PregnancyStatus::Normal => "normal",
        }
    }

    /// True for statuses that end a pregnancy episode.
    ///
    /// A record with `is_done == true` always holds one of these.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            PregnancyStatus::MiscarriageAbortion | PregnancyStatus::Completed
        )
    }
}

impl fmt::Display for PregnancyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PregnancyStatus {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "first_trimester" => Ok(PregnancyStatus::FirstTrimester),
            "second_trimester" => Ok(PregnancyStatus::SecondTrimester),
            "third_trimester" => Ok(PregnancyStatus::ThirdTrimester),
            "postpartum" => Ok(PregnancyStatus::Postpartum),
            "miscarriage_abortion" => Ok(PregnancyStatus::MiscarriageAbortion),
            "completed" => Ok(PregnancyStatus::Completed),
            "discontinued" => Ok(PregnancyStatus::Discontinued),
            "normal" => Ok(PregnancyStatus::Normal),
            other => Err(RecordError::InvalidInput(format!(
                "unknown pregnancy status: '{}'",
                other
            ))),
        }
    }
}

/// Whole calendar days elapsed from `lmp` to `reference_date`.
pub fn elapsed_days(lmp: NaiveDate, reference_date: NaiveDate) -> i64 {
    reference_date.signed_duration_since(lmp).num_days()
}

/// Whole weeks elapsed from `lmp` to `reference_date` (integer division of
/// elapsed days by 7, no rounding).
pub fn elapsed_weeks(lmp: NaiveDate, reference_date: NaiveDate) -> i64 {
    elapsed_days(lmp, reference_date) / 7
}

/// Classifies the gestational status of an open pregnancy from its LMP date.
///
/// Decision table (first matching rule wins):
///
/// | weeks   | status            |
/// |---------|-------------------|
/// | <= 12   | first trimester   |
/// | 13..=27 | second trimester  |
/// | 28..=40 | third trimester   |
/// | > 40    | postpartum        |
///
/// `lmp` must not be later than `reference_date`; callers reject reversed inputs before
/// invoking this function, the classifier itself does not validate ordering.
pub fn classify_status(lmp: NaiveDate, reference_date: NaiveDate) -> PregnancyStatus {
    let weeks = elapsed_weeks(lmp, reference_date);

    if weeks <= FIRST_TRIMESTER_MAX_WEEKS {
        PregnancyStatus::FirstTrimester
    } else if weeks <= SECOND_TRIMESTER_MAX_WEEKS {
        PregnancyStatus::SecondTrimester
    } else if weeks <= THIRD_TRIMESTER_MAX_WEEKS {
        PregnancyStatus::ThirdTrimester
    } else {
        PregnancyStatus::Postpartum
    }
}

/// Renders the age of gestation as `"{weeks}w/{days}d"`.
///
/// The day remainder is always rendered, including `0d`.
///
/// Display-only: this never feeds back into the stored status.
pub fn format_aog(lmp: NaiveDate, reference_date: NaiveDate) -> String {
    let days_elapsed = elapsed_days(lmp, reference_date);
    let weeks = days_elapsed / 7;
    let days = days_elapsed % 7;
    format!("{}w/{}d", weeks, days)
}
