use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Opaque identifier for a user, assigned by the external auth/document store.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Opaque identifier for a question document.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QuestionId(String);

impl QuestionId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UserId({})", self.0)
    }
}

impl fmt::Debug for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QuestionId({})", self.0)
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

//
// ─── SESSION NUMBER ────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionNumberError {
    #[error("session number {0} is outside 1..=9")]
    OutOfRange(u8),

    #[error("failed to parse session number from {0:?}")]
    Parse(String),
}

/// A session slot in the training plan, numbered 1 through 9.
///
/// The difficulty of a session is derived from this number alone; see
/// [`crate::model::Difficulty::for_session`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SessionNumber(u8);

impl SessionNumber {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 9;

    /// Creates a validated session number.
    ///
    /// # Errors
    ///
    /// Returns `SessionNumberError::OutOfRange` if `value` is not in 1..=9.
    pub fn new(value: u8) -> Result<Self, SessionNumberError> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value))
        } else {
            Err(SessionNumberError::OutOfRange(value))
        }
    }

    #[must_use]
    pub fn value(&self) -> u8 {
        self.0
    }

    /// All nine session numbers in order.
    pub fn all() -> impl Iterator<Item = SessionNumber> {
        (Self::MIN..=Self::MAX).map(SessionNumber)
    }
}

impl TryFrom<u8> for SessionNumber {
    type Error = SessionNumberError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Debug for SessionNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionNumber({})", self.0)
    }
}

impl fmt::Display for SessionNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for SessionNumber {
    type Err = SessionNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw: u8 = s
            .parse()
            .map_err(|_| SessionNumberError::Parse(s.to_string()))?;
        Self::new(raw)
    }
}
