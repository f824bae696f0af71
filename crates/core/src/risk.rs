//! Risk-code derivation for pregnancy tracking records.
//!
//! Risk codes follow the paper register's legend: single letters (with optional
//! sub-items) flagging conditions that call for closer follow-up. Three of them are
//! derivable from demographics alone and are attached automatically:
//!
//! - `A` - age below 18
//! - `B` - age above 35 (mutually exclusive with `A`)
//! - `D` - grand multiparity (gravidity above 3)
//!
//! Auto-derived markers carry an explicit `auto` flag so the UI can lock them against
//! manual edits and so recomputation can replace only the automatic subset, leaving
//! manually entered codes untouched. Derivation is idempotent: running it twice with the
//! same inputs yields the same marker set.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Marker attached when the patient is younger than 18.
pub const MARKER_YOUNG_AGE: &str = "A";

/// Marker attached when the patient is older than 35.
pub const MARKER_ADVANCED_AGE: &str = "B";

/// Marker attached for grand multiparity (gravidity above 3).
pub const MARKER_GRAND_MULTIPARITY: &str = "D";

/// Gravidity above this value attaches the grand-multiparity marker.
pub const GRAND_MULTIPARITY_THRESHOLD: u32 = 3;

/// One risk code on a tracking record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskEntry {
    /// Legend code, e.g. `"A"`, `"E (b)"`, `"F (3)"`.
    pub code: String,
    /// When the condition was detected, if recorded.
    pub date_detected: Option<NaiveDate>,
    /// True for markers attached by [`derive_auto_markers`]; the UI blocks
    /// manual edits and removal of these.
    #[serde(default)]
    pub auto: bool,
}

impl RiskEntry {
    /// A manually entered risk code.
    pub fn manual(code: impl Into<String>, date_detected: Option<NaiveDate>) -> Self {
        Self {
            code: code.into(),
            date_detected,
            auto: false,
        }
    }
}

/// Completed years of age at `reference_date` for someone born on `birth_date`.
///
/// Ages are floored at zero if the reference date precedes the birth date.
pub fn age_on(birth_date: NaiveDate, reference_date: NaiveDate) -> u32 {
    let mut age = reference_date.year() - birth_date.year();
    if (reference_date.month(), reference_date.day()) < (birth_date.month(), birth_date.day()) {
        age -= 1;
    }
    age.max(0) as u32
}

/// Recomputes the auto-derived risk markers for the given demographics.
///
/// Manually entered codes pass through unchanged and in order. The automatic subset is
/// replaced wholesale:
///
/// - age below 18 attaches `A`; age above 35 attaches `B`; at most one of the two is
///   ever present (changing age swaps or removes them),
/// - gravidity above 3 attaches `D`; gravidity at or below 3 removes an auto `D`.
///
/// A marker that was already present keeps its original detection date; newly attached
/// markers are stamped with `detected_on`. Applying this function twice with the same
/// inputs yields the same marker set.
///
/// # Arguments
///
/// * `age` - Patient age in completed years (see [`age_on`]).
/// * `gravidity` - Total pregnancies including the current one.
/// * `codes` - The record's current risk-code list (manual and auto entries mixed).
/// * `detected_on` - Detection date stamped onto newly attached markers.
pub fn derive_auto_markers(
    age: u32,
    gravidity: u32,
    codes: &[RiskEntry],
    detected_on: NaiveDate,
) -> Vec<RiskEntry> {
    let kept_date = |code: &str| {
        codes
            .iter()
            .find(|entry| entry.auto && entry.code == code)
            .and_then(|entry| entry.date_detected)
            .or(Some(detected_on))
    };

    let mut derived: Vec<RiskEntry> = codes.iter().filter(|entry| !entry.auto).cloned().collect();

    if age < 18 {
        derived.push(RiskEntry {
            code: MARKER_YOUNG_AGE.to_string(),
            date_detected: kept_date(MARKER_YOUNG_AGE),
            auto: true,
        });
    } else if age > 35 {
        derived.push(RiskEntry {
            code: MARKER_ADVANCED_AGE.to_string(),
            date_detected: kept_date(MARKER_ADVANCED_AGE),
            auto: true,
        });
    }

    if gravidity > GRAND_MULTIPARITY_THRESHOLD {
        derived.push(RiskEntry {
            code: MARKER_GRAND_MULTIPARITY.to_string(),
            date_detected: kept_date(MARKER_GRAND_MULTIPARITY),
            auto: true,
        });
    }

    derived
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid test date")
    }

    fn codes_of(entries: &[RiskEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.code.as_str()).collect()
    }

    #[test]
    fn age_on_counts_completed_years() {
        let birth = date(2000, 6, 15);
        assert_eq!(age_on(birth, date(2025, 6, 14)), 24);
        assert_eq!(age_on(birth, date(2025, 6, 15)), 25);
        assert_eq!(age_on(birth, date(2025, 6, 16)), 25);
    }

    #[test]
    fn young_age_attaches_marker_a_only() {
        let derived = derive_auto_markers(17, 1, &[], date(2025, 5, 1));
        assert_eq!(codes_of(&derived), vec!["A"]);
        assert!(derived[0].auto);
    }

    #[test]
    fn advanced_age_attaches_marker_b_only() {
        let derived = derive_auto_markers(36, 1, &[], date(2025, 5, 1));
        assert_eq!(codes_of(&derived), vec!["B"]);
    }

    #[test]
    fn markers_a_and_b_are_mutually_exclusive() {
        for age in [17, 18, 35, 36] {
            let derived = derive_auto_markers(age, 1, &[], date(2025, 5, 1));
            let has_a = derived.iter().any(|e| e.code == MARKER_YOUNG_AGE);
            let has_b = derived.iter().any(|e| e.code == MARKER_ADVANCED_AGE);
            assert!(!(has_a && has_b), "A and B both present at age {}", age);
        }
    }

    #[test]
    fn turning_eighteen_removes_marker_a() {
        let before = derive_auto_markers(17, 1, &[], date(2025, 5, 1));
        assert_eq!(codes_of(&before), vec!["A"]);

        let after = derive_auto_markers(18, 1, &before, date(2025, 5, 2));
        assert!(after.is_empty(), "A must be removed at age 18");
    }

    #[test]
    fn grand_multiparity_attaches_and_detaches_marker_d() {
        let with_d = derive_auto_markers(25, 4, &[], date(2025, 5, 1));
        assert_eq!(codes_of(&with_d), vec!["D"]);

        let without_d = derive_auto_markers(25, 2, &with_d, date(2025, 5, 2));
        assert!(without_d.is_empty(), "D must be removed at gravidity 2");
    }

    #[test]
    fn manual_codes_survive_recomputation_untouched() {
        let manual = vec![
            RiskEntry::manual("E (b)", Some(date(2025, 1, 10))),
            RiskEntry::manual("F (3)", None),
        ];

        let derived = derive_auto_markers(36, 4, &manual, date(2025, 5, 1));
        assert_eq!(codes_of(&derived), vec!["E (b)", "F (3)", "B", "D"]);
        assert_eq!(derived[0].date_detected, Some(date(2025, 1, 10)));
        assert!(!derived[0].auto);
        assert!(derived[2].auto);
    }

    #[test]
    fn derivation_is_idempotent() {
        let manual = vec![RiskEntry::manual("C", None)];
        let once = derive_auto_markers(17, 4, &manual, date(2025, 5, 1));
        let twice = derive_auto_markers(17, 4, &once, date(2025, 5, 1));
        assert_eq!(once, twice);
    }

    #[test]
    fn existing_auto_marker_keeps_its_detection_date() {
        let first = derive_auto_markers(36, 1, &[], date(2025, 5, 1));
        assert_eq!(first[0].date_detected, Some(date(2025, 5, 1)));

        // Re-run on a later day; the marker's date does not drift.
        let second = derive_auto_markers(36, 1, &first, date(2025, 7, 20));
        assert_eq!(second[0].date_detected, Some(date(2025, 5, 1)));
    }
}
