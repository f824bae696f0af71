//! UUID and sharded-path utilities.
//!
//! MHR stores records under sharded directories derived from a UUID.
//!
//! To keep path derivation deterministic and consistent across the codebase, MHR uses a
//! *canonical* UUID representation for storage identifiers: **32 lowercase hexadecimal
//! characters** (no hyphens).
//!
//! ## Canonical UUID form
//! - Length: 32
//! - Characters: `0-9` and `a-f` only
//! - Example: `550e8400e29b41d4a716446655440000`
//!
//! Notes:
//! - This is the same value you would get from `Uuid::new_v4().simple().to_string()`.
//! - Canonical form is *required* for externally supplied identifiers (for example, from
//!   CLI/API inputs). Use [`RecordUuid::parse`] to validate an input string.
//! - Non-canonical values (uppercase, hyphenated, wrong length, non-hex) are rejected.
//!
//! ## Sharded directory layout
//! For a canonical UUID `u`, MHR stores data under:
//! `parent_dir/<u[0..2]>/<u[2..4]>/<u>/`
//!
//! Example:
//! `record_data/trackings/55/0e/550e8400e29b41d4a716446655440000/`
//!
//! This scheme prevents very large fan-out in a single directory.

use crate::error::{RecordError, RecordResult};
use std::path::{Path, PathBuf};
use std::{fmt, str::FromStr};

use ::uuid::Uuid;

/// MHR's canonical UUID representation (32 lowercase hex characters, no hyphens).
///
/// This wrapper type guarantees that once constructed, the contained UUID is in MHR's
/// canonical format. It provides type safety for UUID operations and ensures consistent
/// path derivation across the system.
///
/// # When to use this type
/// Use this wrapper whenever you are:
/// - Accepting a record identifier from *outside* the core (CLI input, API request, etc), or
/// - Deriving a sharded storage path for a record, or
/// - Generating new record identifiers.
///
/// # Construction
/// - [`RecordUuid::new`] generates a new canonical UUID (for new records).
/// - [`RecordUuid::parse`] validates an externally supplied identifier.
///
/// # Errors
/// [`RecordUuid::parse`] returns [`RecordError::InvalidInput`] if the input is not already
/// canonical.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct RecordUuid(Uuid);

impl RecordUuid {
    /// Generates a new UUID in MHR's canonical form.
    ///
    /// This is suitable for allocating a fresh identifier during record creation.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Validates and parses a UUID string that must already be in MHR's canonical form.
    ///
    /// This does **not** normalise other common UUID forms (for example, hyphenated or
    /// uppercase). Callers must provide the canonical representation.
    ///
    /// # Errors
    ///
    /// Returns [`RecordError::InvalidInput`] if `input` is not in canonical form.
    pub fn parse(input: &str) -> RecordResult<Self> {
        if Self::is_canonical(input) {
            // is_canonical guarantees valid hex, so parse_str will succeed
            let uuid = Uuid::parse_str(input).map_err(|e| {
                RecordError::InvalidInput(format!("UUID failed to parse: {}", e))
            })?;
            return Ok(Self(uuid));
        }
        Err(RecordError::InvalidInput(format!(
            "UUID must be 32 lowercase hex characters without hyphens, got: '{}'",
            input
        )))
    }

    /// Returns the underlying `uuid::Uuid`.
    pub fn uuid(&self) -> Uuid {
        self.0
    }

    /// Derives the sharded record directory for this UUID under `parent_dir`.
    ///
    /// Layout: `parent_dir/<s1>/<s2>/<uuid>/` where `s1`/`s2` are the first four hex
    /// characters of the canonical form.
    pub fn sharded_dir(&self, parent_dir: &Path) -> PathBuf {
        let canonical = self.0.simple().to_string();
        parent_dir
            .join(&canonical[0..2])
            .join(&canonical[2..4])
            .join(&canonical)
    }

    fn is_canonical(input: &str) -> bool {
        input.len() == 32
            && input
                .bytes()
                .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    }
}

impl Default for RecordUuid {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

impl FromStr for RecordUuid {
    type Err = RecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl serde::Serialize for RecordUuid {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0.simple().to_string())
    }
}

impl<'de> serde::Deserialize<'de> for RecordUuid {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        RecordUuid::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_produces_canonical_form() {
        let id = RecordUuid::new();
        let rendered = id.to_string();
        assert_eq!(rendered.len(), 32, "canonical form is 32 characters");
        assert!(
            rendered
                .bytes()
                .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')),
            "canonical form is lowercase hex"
        );
    }

    #[test]
    fn parse_accepts_canonical_and_round_trips() {
        let id = RecordUuid::new();
        let parsed = RecordUuid::parse(&id.to_string()).expect("canonical form should parse");
        assert_eq!(parsed, id);
    }

    #[test]
    fn parse_rejects_hyphenated_form() {
        let hyphenated = Uuid::new_v4().hyphenated().to_string();
        let err = RecordUuid::parse(&hyphenated).expect_err("hyphenated form should be rejected");
        assert!(matches!(err, RecordError::InvalidInput(_)));
    }

    #[test]
    fn parse_rejects_uppercase() {
        let upper = RecordUuid::new().to_string().to_uppercase();
        let err = RecordUuid::parse(&upper).expect_err("uppercase form should be rejected");
        assert!(matches!(err, RecordError::InvalidInput(_)));
    }

    #[test]
    fn sharded_dir_uses_first_four_characters() {
        let id = RecordUuid::parse("550e8400e29b41d4a716446655440000")
            .expect("canonical form should parse");
        let dir = id.sharded_dir(Path::new("records"));
        assert_eq!(
            dir,
            Path::new("records/55/0e/550e8400e29b41d4a716446655440000")
        );
    }
}
