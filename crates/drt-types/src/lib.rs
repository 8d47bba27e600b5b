//! Shared identifier types and form-input coercion.
//!
//! Identifiers assigned by the persistence collaborator (applications, patients,
//! reviewers, facilities) are positive integers on the wire. References into the
//! static lookup tables (test types, drugs, regimens, period units) use `0` to mean
//! "nothing selected yet", so they get their own type.

use std::fmt;

/// Errors that can occur when coercing raw form input into typed values.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TypeError {
    /// The input was not blank but could not be read as a whole number.
    #[error("expected a whole number, got {0:?}")]
    NotNumeric(String),

    /// A record identifier was zero or negative.
    #[error("record identifiers must be positive")]
    NonPositiveId,
}

/// Coerce raw form input into a whole number.
///
/// Blank (or whitespace-only) input coerces to `0`, mirroring an untouched number
/// field. Anything else must parse as a signed integer.
///
/// # Errors
///
/// Returns [`TypeError::NotNumeric`] if the trimmed input is not an integer.
pub fn parse_whole_number(input: &str) -> Result<i64, TypeError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    trimmed
        .parse::<i64>()
        .map_err(|_| TypeError::NotNumeric(input.to_owned()))
}

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            serde::Serialize,
            serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// Wraps a positive identifier.
            ///
            /// # Errors
            ///
            /// Returns [`TypeError::NonPositiveId`] for `0`.
            pub fn new(value: u64) -> Result<Self, TypeError> {
                if value == 0 {
                    return Err(TypeError::NonPositiveId);
                }
                Ok(Self(value))
            }

            /// Parses an identifier from raw form input.
            pub fn parse(input: &str) -> Result<Self, TypeError> {
                let value = parse_whole_number(input)?;
                let value = u64::try_from(value).map_err(|_| TypeError::NonPositiveId)?;
                Self::new(value)
            }

            pub fn get(self) -> u64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

record_id!(
    /// Server-assigned identifier of a persisted application.
    ApplicationId
);
record_id!(
    /// Server-assigned identifier of a patient.
    PatientId
);
record_id!(
    /// Identifier of a reviewer in the reviewer directory.
    ReviewerId
);
record_id!(
    /// Identifier of a facility (institution) submitting applications.
    FacilityId
);

/// Reference into one of the static lookup tables.
///
/// `LookupId::UNSET` (`0`) means the user has not chosen a value yet. The lookup
/// tables themselves are external data; this type only carries the reference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct LookupId(u32);

impl LookupId {
    pub const UNSET: LookupId = LookupId(0);

    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Coerces a select-box value. Blank input is [`LookupId::UNSET`].
    ///
    /// # Errors
    ///
    /// Returns [`TypeError::NotNumeric`] if the input is neither blank nor a
    /// non-negative integer.
    pub fn from_input(input: &str) -> Result<Self, TypeError> {
        let value = parse_whole_number(input)?;
        u32::try_from(value)
            .map(Self)
            .map_err(|_| TypeError::NotNumeric(input.to_owned()))
    }

    pub fn is_set(self) -> bool {
        self.0 != 0
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for LookupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
