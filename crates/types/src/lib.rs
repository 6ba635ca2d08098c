//! Validated value types shared across the ward workspace.
//!
//! Every type in this crate upholds its invariant from construction onwards,
//! so downstream code can accept a [`NonEmptyText`] or an [`Age`] and skip
//! re-validation. Deserialisation routes through the same constructors, which
//! means malformed wire data is rejected at the boundary rather than deep
//! inside a service.

use serde::{Deserialize, Serialize};

/// Errors raised when constructing validated text types.
#[derive(Debug, thiserror::Error)]
pub enum TextError {
    /// The input was empty or contained only whitespace.
    #[error("text cannot be empty")]
    Empty,
}

/// Errors raised when constructing an [`Age`].
#[derive(Debug, thiserror::Error)]
pub enum AgeError {
    /// The value fell outside the accepted range.
    #[error("age must be between {min} and {max} years, got {value}")]
    OutOfRange {
        /// The rejected input value.
        value: u16,
        /// Lower bound of the accepted range.
        min: u16,
        /// Upper bound of the accepted range.
        max: u16,
    },
}

/// A string guaranteed to hold at least one non-whitespace character.
///
/// Construction trims leading and trailing whitespace, so the stored value
/// never carries accidental padding. Use this wherever an empty name, label,
/// or identifier would be a logic error rather than a storable value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Builds a `NonEmptyText` from any string-like input.
    ///
    /// # Errors
    ///
    /// Returns [`TextError::Empty`] when the trimmed input has no content.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the validated content as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the wrapper and returns the owned `String`.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for NonEmptyText {
    type Error = TextError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for NonEmptyText {
    type Error = TextError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<NonEmptyText> for String {
    fn from(value: NonEmptyText) -> Self {
        value.0
    }
}

/// A patient age in whole years, restricted to a plausible human range.
///
/// The range is inclusive on both ends; see [`Age::MIN`] and [`Age::MAX`].
/// Zero is rejected because registration records completed years and a
/// zero-year entry is indistinguishable from an unfilled field upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct Age(u16);

impl Age {
    /// Youngest accepted age, in years.
    pub const MIN: u16 = 1;
    /// Oldest accepted age, in years.
    pub const MAX: u16 = 150;

    /// Builds an `Age` from a year count.
    ///
    /// # Errors
    ///
    /// Returns [`AgeError::OutOfRange`] when `years` lies outside
    /// `MIN..=MAX`.
    pub fn new(years: u16) -> Result<Self, AgeError> {
        if !(Self::MIN..=Self::MAX).contains(&years) {
            return Err(AgeError::OutOfRange {
                value: years,
                min: Self::MIN,
                max: Self::MAX,
            });
        }
        Ok(Self(years))
    }

    /// Returns the age in whole years.
    pub fn years(&self) -> u16 {
        self.0
    }
}

impl std::fmt::Display for Age {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u16> for Age {
    type Error = AgeError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Age> for u16 {
    fn from(value: Age) -> Self {
        value.0
    }
}
