use std::collections::HashSet;

use training_core::model::{Question, QuestionId, ScoreSheet};

/// Number of questions a full practice session aims for.
pub const SESSION_SIZE: usize = 10;

/// Per-rank question quotas, weakest subject first. Ranks past the table get
/// one question each.
const QUESTION_DISTRIBUTION: [usize; 4] = [4, 3, 2, 1];

/// Selection result for a session build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPlan {
    pub questions: Vec<Question>,
    /// Questions selected through per-subject quotas.
    pub quota_selected: usize,
    /// Questions appended from the leftover pool to reach the target.
    pub backfilled: usize,
}

impl SessionPlan {
    /// Total number of questions in this plan.
    #[must_use]
    pub fn total(&self) -> usize {
        self.questions.len()
    }

    /// Returns true when no questions were selected for this session.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

/// Composes a practice session biased toward the user's weakest subjects.
///
/// Subjects are ranked weakest first from the diagnostic score sheet; each
/// rank draws up to its quota from the pool in pool order. Whatever is still
/// missing after the ranked pass is backfilled from the remaining pool, and
/// the result is capped at the target size.
pub struct SessionBuilder {
    target: usize,
}

impl SessionBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            target: SESSION_SIZE,
        }
    }

    /// Override the target size. Session flows always use [`SESSION_SIZE`].
    #[must_use]
    pub fn with_target(mut self, target: usize) -> Self {
        self.target = target;
        self
    }

    /// Build a session plan from diagnostic scores and a question pool.
    ///
    /// The pool is consumed in the order it arrives; the external source may
    /// already deliver it shuffled, so no reordering happens here. An empty
    /// pool yields an empty plan, and an empty score sheet skips straight to
    /// backfill.
    #[must_use]
    pub fn build(&self, scores: &ScoreSheet, pool: &[Question]) -> SessionPlan {
        let mut selected: Vec<Question> = Vec::new();
        let mut selected_ids: HashSet<QuestionId> = HashSet::new();

        for (rank, subject) in scores.ranked_by_weakness().iter().enumerate() {
            if selected.len() >= self.target {
                break;
            }
            let quota = QUESTION_DISTRIBUTION.get(rank).copied().unwrap_or(1);
            let picks: Vec<&Question> = pool
                .iter()
                .filter(|q| q.subject() == subject && !selected_ids.contains(q.id()))
                .take(quota)
                .collect();
            for question in picks {
                selected_ids.insert(question.id().clone());
                selected.push(question.clone());
            }
        }

        let quota_selected = selected.len().min(self.target);

        if selected.len() < self.target {
            for question in pool {
                if selected.len() >= self.target {
                    break;
                }
                if selected_ids.contains(question.id()) {
                    continue;
                }
                selected_ids.insert(question.id().clone());
                selected.push(question.clone());
            }
        }

        selected.truncate(self.target);
        let backfilled = selected.len().saturating_sub(quota_selected);

        SessionPlan {
            questions: selected,
            quota_selected,
            backfilled,
        }
    }
}

impl Default for SessionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use training_core::model::{Difficulty, SubjectName};

    fn subject(name: &str) -> SubjectName {
        SubjectName::new(name).unwrap()
    }

    fn question(id: &str, subject_name: &str) -> Question {
        Question::from_persisted(
            QuestionId::new(id),
            subject(subject_name),
            format!("prompt {id}"),
            vec!["a".into(), "b".into(), "c".into(), "d".into()],
            0,
            None,
            Difficulty::Easy,
        )
        .unwrap()
    }

    fn pool_of(counts: &[(&str, usize)]) -> Vec<Question> {
        let mut pool = Vec::new();
        for (subject_name, count) in counts {
            for i in 0..*count {
                pool.push(question(&format!("{subject_name}-{i}"), subject_name));
            }
        }
        pool
    }

    fn sheet(scores: &[(&str, f64)]) -> ScoreSheet {
        scores
            .iter()
            .map(|(name, grade)| (subject(name), *grade))
            .collect()
    }

    #[test]
    fn full_pool_yields_exactly_ten_unique_questions() {
        let scores = sheet(&[("algebra", 40.0), ("geometry", 60.0), ("trig", 80.0)]);
        let pool = pool_of(&[("algebra", 6), ("geometry", 6), ("trig", 6)]);

        let plan = SessionBuilder::new().build(&scores, &pool);

        assert_eq!(plan.total(), SESSION_SIZE);
        let mut ids: Vec<_> = plan.questions.iter().map(|q| q.id().clone()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), SESSION_SIZE);
        for q in &plan.questions {
            assert!(pool.iter().any(|p| p.id() == q.id()));
        }
    }

    #[test]
    fn small_pool_is_used_entirely() {
        let scores = sheet(&[("algebra", 40.0)]);
        let pool = pool_of(&[("algebra", 3), ("geometry", 2)]);

        let plan = SessionBuilder::new().build(&scores, &pool);

        assert_eq!(plan.total(), 5);
    }

    #[test]
    fn weakest_subject_fills_the_first_quota() {
        let scores = sheet(&[("a", 90.0), ("b", 10.0)]);
        let pool = pool_of(&[("a", 4), ("b", 4)]);

        let plan = SessionBuilder::new().build(&scores, &pool);

        for q in plan.questions.iter().take(4) {
            assert_eq!(q.subject(), &subject("b"));
        }
    }

    #[test]
    fn quotas_then_backfill_until_pool_exhausted() {
        // Quotas give 4 algebra + 3 geometry = 7, backfill adds the last
        // geometry question. Eight total, pool exhausted.
        let scores = sheet(&[("algebra", 20.0), ("geometry", 80.0)]);
        let pool = pool_of(&[("algebra", 4), ("geometry", 4)]);

        let plan = SessionBuilder::new().build(&scores, &pool);

        assert_eq!(plan.total(), 8);
        assert_eq!(plan.quota_selected, 7);
        assert_eq!(plan.backfilled, 1);
        for q in plan.questions.iter().take(4) {
            assert_eq!(q.subject(), &subject("algebra"));
        }
        for q in plan.questions.iter().skip(4) {
            assert_eq!(q.subject(), &subject("geometry"));
        }
    }

    #[test]
    fn ranks_past_the_table_get_one_question() {
        let scores = sheet(&[
            ("s1", 10.0),
            ("s2", 20.0),
            ("s3", 30.0),
            ("s4", 40.0),
            ("s5", 50.0),
            ("s6", 60.0),
        ]);
        let pool = pool_of(&[
            ("s1", 10),
            ("s2", 10),
            ("s3", 10),
            ("s4", 10),
            ("s5", 10),
            ("s6", 10),
        ]);

        let plan = SessionBuilder::new().build(&scores, &pool);

        assert_eq!(plan.total(), SESSION_SIZE);
        let count_for = |name: &str| {
            plan.questions
                .iter()
                .filter(|q| q.subject() == &subject(name))
                .count()
        };
        assert_eq!(count_for("s1"), 4);
        assert_eq!(count_for("s2"), 3);
        assert_eq!(count_for("s3"), 2);
        assert_eq!(count_for("s4"), 1);
        // Target reached before s5/s6 are visited.
        assert_eq!(count_for("s5"), 0);
        assert_eq!(count_for("s6"), 0);
    }

    #[test]
    fn empty_pool_yields_empty_plan() {
        let scores = sheet(&[("algebra", 50.0)]);
        let plan = SessionBuilder::new().build(&scores, &[]);
        assert!(plan.is_empty());
    }

    #[test]
    fn empty_scores_select_in_pool_order() {
        let pool = pool_of(&[("algebra", 2), ("geometry", 2)]);
        let plan = SessionBuilder::new().build(&ScoreSheet::new(), &pool);

        assert_eq!(plan.total(), 4);
        assert_eq!(plan.quota_selected, 0);
        assert_eq!(plan.backfilled, 4);
        let ids: Vec<_> = plan.questions.iter().map(|q| q.id().clone()).collect();
        let expected: Vec<_> = pool.iter().map(|q| q.id().clone()).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn scored_subject_missing_from_pool_is_skipped() {
        let scores = sheet(&[("history", 5.0), ("algebra", 50.0)]);
        let pool = pool_of(&[("algebra", 12)]);

        let plan = SessionBuilder::new().build(&scores, &pool);

        // history has no pool questions; algebra's rank-2 quota (3) plus
        // backfill carries the session to the target.
        assert_eq!(plan.total(), SESSION_SIZE);
        assert_eq!(plan.quota_selected, 3);
        assert_eq!(plan.backfilled, 7);
    }

    #[test]
    fn custom_target_caps_the_plan() {
        let scores = sheet(&[("algebra", 10.0)]);
        let pool = pool_of(&[("algebra", 9)]);

        let plan = SessionBuilder::new().with_target(5).build(&scores, &pool);

        assert_eq!(plan.total(), 5);
    }
}
