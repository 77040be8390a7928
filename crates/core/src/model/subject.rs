use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SubjectError {
    #[error("subject name cannot be empty")]
    EmptyName,
}

/// Validated subject name (trimmed, non-empty).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubjectName(String);

impl SubjectName {
    /// Create a validated subject name.
    ///
    /// # Errors
    ///
    /// Returns `SubjectError::EmptyName` if the name is empty after trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, SubjectError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(SubjectError::EmptyName);
        }
        Ok(Self(trimmed.to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SubjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One diagnostic grade for one subject.
#[derive(Debug, Clone, PartialEq)]
pub struct SubjectScore {
    pub subject: SubjectName,
    pub grade: f64,
}

/// A user's diagnostic grades, in the order the score source returned them.
///
/// Order matters: ranking ties are broken by this order, so the sheet
/// preserves insertion order and `push` updates an existing subject in place
/// rather than re-appending it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreSheet {
    entries: Vec<SubjectScore>,
}

impl ScoreSheet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or update a subject's grade, keeping the subject's original slot.
    pub fn push(&mut self, subject: SubjectName, grade: f64) {
        if let Some(existing) = self.entries.iter_mut().find(|e| e.subject == subject) {
            existing.grade = grade;
        } else {
            self.entries.push(SubjectScore { subject, grade });
        }
    }

    #[must_use]
    pub fn grade(&self, subject: &SubjectName) -> Option<f64> {
        self.entries
            .iter()
            .find(|e| &e.subject == subject)
            .map(|e| e.grade)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SubjectScore> {
        self.entries.iter()
    }

    /// Subjects ordered weakest first.
    ///
    /// Stable: subjects with equal grades keep their sheet order, so the
    /// tie-break is the order the score source produced, not a secondary key.
    #[must_use]
    pub fn ranked_by_weakness(&self) -> Vec<SubjectName> {
        let mut ranked: Vec<&SubjectScore> = self.entries.iter().collect();
        ranked.sort_by(|a, b| a.grade.total_cmp(&b.grade));
        ranked.into_iter().map(|e| e.subject.clone()).collect()
    }
}

impl FromIterator<(SubjectName, f64)> for ScoreSheet {
    fn from_iter<I: IntoIterator<Item = (SubjectName, f64)>>(iter: I) -> Self {
        let mut sheet = Self::new();
        for (subject, grade) in iter {
            sheet.push(subject, grade);
        }
        sheet
    }
}
