use chrono::{DateTime, Utc};
use std::collections::BTreeSet;
use std::fmt;

use quiz_core::model::{Question, QuestionId, SessionSource, accuracy_percent};

//
// ─── OUTCOMES ──────────────────────────────────────────────────────────────────
//

/// Result of moving forward in a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// The cursor moved to this index.
    Moved(usize),
    /// The cursor was already on the last question (or the batch is empty).
    Finished,
}

/// Result of dropping a question from the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// Removed; the cursor now points at `current` of `remaining`.
    Removed { remaining: usize, current: usize },
    /// The batch became empty.
    Emptied,
    /// The question was not part of the batch.
    NotInBatch,
}

/// Tally of one practice run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    pub source: SessionSource,
    pub total: usize,
    pub answered: u32,
    pub correct: u32,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl SessionReport {
    #[must_use]
    pub fn accuracy_percent(&self) -> u32 {
        accuracy_percent(self.correct, self.answered)
    }
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// In-memory practice batch with a cursor.
///
/// The batch is fixed once built; only removals from the wrong book shrink it.
/// `current` stays in `0..len` while the batch is non-empty and is `0` otherwise.
/// Each question counts towards the tally at most once.
pub struct PracticeSession {
    source: SessionSource,
    questions: Vec<Question>,
    current: usize,
    graded: BTreeSet<QuestionId>,
    answered: u32,
    correct: u32,
    started_at: DateTime<Utc>,
}

impl PracticeSession {
    #[must_use]
    pub fn new(source: SessionSource, questions: Vec<Question>, started_at: DateTime<Utc>) -> Self {
        Self {
            source,
            questions,
            current: 0,
            graded: BTreeSet::new(),
            answered: 0,
            correct: 0,
            started_at,
        }
    }

    #[must_use]
    pub fn source(&self) -> &SessionSource {
        &self.source
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn is_last(&self) -> bool {
        self.current + 1 >= self.questions.len()
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current)
    }

    pub fn advance(&mut self) -> Step {
        if self.is_last() {
            return Step::Finished;
        }
        self.current += 1;
        Step::Moved(self.current)
    }

    /// Step back one question. Returns false when already at the start.
    pub fn retreat(&mut self) -> bool {
        if self.current == 0 {
            return false;
        }
        self.current -= 1;
        true
    }

    /// Drop a question and clamp the cursor back into range.
    pub fn remove(&mut self, id: QuestionId) -> Removal {
        let Some(pos) = self.questions.iter().position(|q| q.id() == id) else {
            return Removal::NotInBatch;
        };
        self.questions.remove(pos);

        if self.questions.is_empty() {
            self.current = 0;
            return Removal::Emptied;
        }

        self.current = self.current.min(self.questions.len() - 1);
        Removal::Removed {
            remaining: self.questions.len(),
            current: self.current,
        }
    }

    #[must_use]
    pub fn is_answered(&self, id: QuestionId) -> bool {
        self.graded.contains(&id)
    }

    /// Tally an answer. Returns false if the question was already graded.
    pub fn record(&mut self, id: QuestionId, correct: bool) -> bool {
        if !self.graded.insert(id) {
            return false;
        }
        self.answered = self.answered.saturating_add(1);
        if correct {
            self.correct = self.correct.saturating_add(1);
        }
        true
    }

    #[must_use]
    pub fn report(&self, finished_at: DateTime<Utc>) -> SessionReport {
        SessionReport {
            source: self.source.clone(),
            total: self.questions.len(),
            answered: self.answered,
            correct: self.correct,
            started_at: self.started_at,
            finished_at,
        }
    }
}

impl fmt::Debug for PracticeSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PracticeSession")
            .field("source", &self.source)
            .field("questions_len", &self.questions.len())
            .field("current", &self.current)
            .field("answered", &self.answered)
            .field("correct", &self.correct)
            .field("started_at", &self.started_at)
            .finish()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::QuestionDraft;
    use quiz_core::time::fixed_now;

    fn build_question(id: u64) -> Question {
        QuestionDraft {
            kind: "fill".into(),
            category: "SQL".into(),
            prompt: format!("Q{id}"),
            answer: format!("A{id}"),
            ..QuestionDraft::default()
        }
        .validate()
        .unwrap()
        .assign_id(QuestionId::new(id))
    }

    fn build_session(n: u64) -> PracticeSession {
        PracticeSession::new(
            SessionSource::wrong_book(),
            (1..=n).map(build_question).collect(),
            fixed_now(),
        )
    }

    #[test]
    fn advance_stops_at_last_question() {
        let mut session = build_session(3);
        assert_eq!(session.advance(), Step::Moved(1));
        assert_eq!(session.advance(), Step::Moved(2));
        assert_eq!(session.advance(), Step::Finished);
        assert_eq!(session.current_index(), 2);
    }

    #[test]
    fn empty_session_has_no_current_question() {
        let mut session = build_session(0);
        assert!(session.current_question().is_none());
        assert_eq!(session.advance(), Step::Finished);
        assert!(!session.retreat());
    }

    #[test]
    fn retreat_is_noop_at_start() {
        let mut session = build_session(2);
        assert!(!session.retreat());
        session.advance();
        assert!(session.retreat());
        assert_eq!(session.current_index(), 0);
    }

    #[test]
    fn removing_last_question_at_cursor_clamps() {
        let mut session = build_session(3);
        session.advance();
        session.advance();
        assert_eq!(
            session.remove(QuestionId::new(3)),
            Removal::Removed {
                remaining: 2,
                current: 1
            }
        );
        assert_eq!(session.current_question().unwrap().id(), QuestionId::new(2));
    }

    #[test]
    fn removing_before_cursor_keeps_index_in_bounds() {
        let mut session = build_session(3);
        session.advance();
        session.remove(QuestionId::new(1));
        assert_eq!(session.current_index(), 1);
        assert_eq!(session.current_question().unwrap().id(), QuestionId::new(3));
    }

    #[test]
    fn removing_everything_empties() {
        let mut session = build_session(1);
        assert_eq!(session.remove(QuestionId::new(9)), Removal::NotInBatch);
        assert_eq!(session.remove(QuestionId::new(1)), Removal::Emptied);
        assert!(session.is_empty());
        assert_eq!(session.current_index(), 0);
    }

    #[test]
    fn report_tallies_answers() {
        let mut session = build_session(4);
        assert!(session.record(QuestionId::new(1), true));
        assert!(session.record(QuestionId::new(2), false));
        assert!(session.record(QuestionId::new(3), true));
        assert!(!session.record(QuestionId::new(3), false));
        assert!(session.is_answered(QuestionId::new(2)));
        let report = session.report(fixed_now());
        assert_eq!(report.total, 4);
        assert_eq!(report.answered, 3);
        assert_eq!(report.correct, 2);
        assert_eq!(report.accuracy_percent(), 67);
    }
}
