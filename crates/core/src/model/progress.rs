use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::SessionNumber;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("invalid training status label: {0:?}")]
    InvalidStatus(String),

    #[error("status {status} inconsistent with current_session {current_session}")]
    StatusMismatch {
        current_session: u8,
        status: TrainingStatus,
    },
}

/// Overall state of a user's training plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainingStatus {
    InProgress,
    Completed,
}

impl TrainingStatus {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            TrainingStatus::InProgress => "in_progress",
            TrainingStatus::Completed => "completed",
        }
    }
}

impl fmt::Display for TrainingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TrainingStatus {
    type Err = ProgressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in_progress" => Ok(TrainingStatus::InProgress),
            "completed" => Ok(TrainingStatus::Completed),
            other => Err(ProgressError::InvalidStatus(other.to_string())),
        }
    }
}

/// The persisted pointer to a user's next session.
///
/// Advanced by exactly one per recorded session and overwritten in place;
/// `current_session` runs past [`SessionNumber::MAX`] (to 10) once the plan
/// is finished, which is why it is a plain counter here rather than a
/// `SessionNumber`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressCursor {
    current_session: u8,
    completed_sessions: u8,
    status: TrainingStatus,
    last_activity: DateTime<Utc>,
}

impl ProgressCursor {
    /// Cursor for a user who has not recorded any session yet.
    #[must_use]
    pub fn initial(now: DateTime<Utc>) -> Self {
        Self {
            current_session: SessionNumber::MIN,
            completed_sessions: 0,
            status: TrainingStatus::InProgress,
            last_activity: now,
        }
    }

    /// Cursor state after recording `session`.
    #[must_use]
    pub fn after_session(session: SessionNumber, now: DateTime<Utc>) -> Self {
        let current_session = session.value() + 1;
        let status = if current_session > SessionNumber::MAX {
            TrainingStatus::Completed
        } else {
            TrainingStatus::InProgress
        };
        Self {
            current_session,
            completed_sessions: session.value(),
            status,
            last_activity: now,
        }
    }

    /// Rehydrate a cursor from storage.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::StatusMismatch` if the stored status
    /// disagrees with `current_session` (completed iff past session 9).
    pub fn from_persisted(
        current_session: u8,
        completed_sessions: u8,
        status: TrainingStatus,
        last_activity: DateTime<Utc>,
    ) -> Result<Self, ProgressError> {
        let expected = if current_session > SessionNumber::MAX {
            TrainingStatus::Completed
        } else {
            TrainingStatus::InProgress
        };
        if status != expected {
            return Err(ProgressError::StatusMismatch {
                current_session,
                status,
            });
        }
        Ok(Self {
            current_session,
            completed_sessions,
            status,
            last_activity,
        })
    }

    #[must_use]
    pub fn current_session(&self) -> u8 {
        self.current_session
    }

    #[must_use]
    pub fn completed_sessions(&self) -> u8 {
        self.completed_sessions
    }

    #[must_use]
    pub fn status(&self) -> TrainingStatus {
        self.status
    }

    #[must_use]
    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_activity
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.status == TrainingStatus::Completed
    }

    /// Sessions this cursor counts as completed. Progression is strictly
    /// sequential, so that is every session up to `completed_sessions`.
    #[must_use]
    pub fn completed_set(&self) -> BTreeSet<SessionNumber> {
        SessionNumber::all()
            .filter(|s| s.value() <= self.completed_sessions)
            .collect()
    }
}

/// Session unlock dependencies: completing the key session opens the listed
/// ones. Session 1 is always open.
const UNLOCKS: &[(u8, &[u8])] = &[
    (1, &[2, 4]),
    (2, &[3, 5]),
    (4, &[5, 7]),
    (5, &[6, 8]),
    (7, &[8]),
    (8, &[9]),
];

/// The set of sessions a user may start, given the sessions already
/// completed.
#[must_use]
pub fn unlocked_sessions(completed: &BTreeSet<SessionNumber>) -> BTreeSet<SessionNumber> {
    let mut available = BTreeSet::new();
    available.extend(SessionNumber::new(1).ok());

    for (done, opens) in UNLOCKS {
        if completed.iter().any(|s| s.value() == *done) {
            available.extend(opens.iter().filter_map(|n| SessionNumber::new(*n).ok()));
        }
    }

    available
}
