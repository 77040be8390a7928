use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::SessionNumber;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DifficultyError {
    #[error("invalid difficulty level: {0}")]
    InvalidLevel(i64),

    #[error("invalid difficulty label: {0:?}")]
    InvalidLabel(String),
}

/// Difficulty tier of a practice session and of the questions it draws from.
///
/// Determined solely by the session number: sessions 1-3 are easy, 4-6
/// medium, 7-9 hard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    /// Fixed session-number → difficulty lookup.
    #[must_use]
    pub fn for_session(session: SessionNumber) -> Self {
        match session.value() {
            1..=3 => Difficulty::Easy,
            4..=6 => Difficulty::Medium,
            _ => Difficulty::Hard,
        }
    }

    /// Numeric level as stored on question documents (1, 2, 3).
    #[must_use]
    pub fn level(&self) -> i64 {
        match self {
            Difficulty::Easy => 1,
            Difficulty::Medium => 2,
            Difficulty::Hard => 3,
        }
    }

    /// Inverse of [`Difficulty::level`].
    ///
    /// # Errors
    ///
    /// Returns `DifficultyError::InvalidLevel` for anything outside 1..=3.
    pub fn from_level(level: i64) -> Result<Self, DifficultyError> {
        match level {
            1 => Ok(Difficulty::Easy),
            2 => Ok(Difficulty::Medium),
            3 => Ok(Difficulty::Hard),
            other => Err(DifficultyError::InvalidLevel(other)),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = DifficultyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(DifficultyError::InvalidLabel(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_number_maps_to_difficulty_tiers() {
        let expected = [
            (1, Difficulty::Easy),
            (2, Difficulty::Easy),
            (3, Difficulty::Easy),
            (4, Difficulty::Medium),
            (5, Difficulty::Medium),
            (6, Difficulty::Medium),
            (7, Difficulty::Hard),
            (8, Difficulty::Hard),
            (9, Difficulty::Hard),
        ];
        for (n, difficulty) in expected {
            let session = SessionNumber::new(n).unwrap();
            assert_eq!(Difficulty::for_session(session), difficulty);
        }
    }

    #[test]
    fn level_round_trips() {
        for difficulty in Difficulty::ALL {
            assert_eq!(
                Difficulty::from_level(difficulty.level()).unwrap(),
                difficulty
            );
        }
        assert!(Difficulty::from_level(0).is_err());
        assert!(Difficulty::from_level(4).is_err());
    }

    #[test]
    fn label_round_trips() {
        for difficulty in Difficulty::ALL {
            assert_eq!(
                difficulty.as_str().parse::<Difficulty>().unwrap(),
                difficulty
            );
        }
        assert!("brutal".parse::<Difficulty>().is_err());
    }
}
