use std::sync::Arc;

use quiz_core::evaluator::evaluate;
use quiz_core::model::{Question, QuestionId, SessionSource, Stats};
use quiz_core::streak::Encouragement;
use storage::repository::{ProgressRepository, QuestionRepository, StorageError};

use super::plan::BatchPlanner;
use super::progress::ProgressTracker;
use super::queries::BatchFetcher;
use super::service::{PracticeSession, Removal, SessionReport, Step};
use crate::Clock;
use crate::error::SessionError;

/// Handle for one batch fetch. Only the most recently issued ticket may install its batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartTicket {
    seq: u64,
    source: SessionSource,
}

impl StartTicket {
    #[must_use]
    pub fn seq(&self) -> u64 {
        self.seq
    }

    #[must_use]
    pub fn source(&self) -> &SessionSource {
        &self.source
    }
}

/// What happened to a completed fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// The batch was installed; `total` may be 0.
    Started { total: usize },
    /// A newer fetch was issued meanwhile; the result was dropped.
    Stale,
}

/// Result of moving to the next question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    Next(usize),
    /// The last question was passed; the session was reset.
    Finished(SessionReport),
    /// No session is running.
    Idle,
}

/// Outcome of one submitted answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerFeedback {
    pub question_id: QuestionId,
    pub correct: bool,
    pub streak: u32,
    pub encouragement: Option<Encouragement>,
}

/// Drives a practice run: fetching, navigation, grading and progress reporting.
pub struct SessionController {
    clock: Clock,
    fetcher: BatchFetcher,
    progress: Arc<dyn ProgressRepository>,
    planner: BatchPlanner,
    session: Option<PracticeSession>,
    tracker: ProgressTracker,
    stats: Option<Stats>,
    issued: u64,
}

impl SessionController {
    #[must_use]
    pub fn new(
        clock: Clock,
        questions: Arc<dyn QuestionRepository>,
        progress: Arc<dyn ProgressRepository>,
    ) -> Self {
        Self {
            clock,
            fetcher: BatchFetcher::new(questions, Arc::clone(&progress)),
            progress,
            planner: BatchPlanner::new(),
            session: None,
            tracker: ProgressTracker::new(),
            stats: None,
            issued: 0,
        }
    }

    #[must_use]
    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.planner = self.planner.with_shuffle(shuffle);
        self
    }

    /// Serve at most `limit` questions per session.
    #[must_use]
    pub fn with_batch_limit(mut self, limit: Option<usize>) -> Self {
        self.planner = self.planner.with_limit(limit);
        self
    }

    /// A detached fetcher for running a ticketed fetch outside `&mut self`.
    #[must_use]
    pub fn fetcher(&self) -> BatchFetcher {
        self.fetcher.clone()
    }

    //
    // ─── STARTING ──────────────────────────────────────────────────────────────
    //

    /// Issue a ticket for a new fetch. Any ticket issued earlier becomes stale.
    pub fn begin_start(&mut self, source: SessionSource) -> StartTicket {
        self.issued += 1;
        StartTicket {
            seq: self.issued,
            source,
        }
    }

    /// Install the result of a ticketed fetch.
    ///
    /// A failed fetch still replaces the session with an empty batch for the
    /// same source before the error is returned.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` when the fetch itself failed.
    pub fn complete_start(
        &mut self,
        ticket: StartTicket,
        fetched: Result<Vec<Question>, StorageError>,
    ) -> Result<StartOutcome, SessionError> {
        if ticket.seq != self.issued {
            tracing::debug!(
                seq = ticket.seq,
                latest = self.issued,
                "dropping stale question batch"
            );
            return Ok(StartOutcome::Stale);
        }

        self.tracker.reset();
        let now = self.clock.now();
        match fetched {
            Ok(batch) => {
                let batch = self.planner.plan(&ticket.source, batch);
                let total = batch.len();
                tracing::debug!(source = ?ticket.source, total, "session started");
                self.session = Some(PracticeSession::new(ticket.source, batch, now));
                Ok(StartOutcome::Started { total })
            }
            Err(e) => {
                tracing::warn!(error = %e, source = ?ticket.source, "failed to fetch questions");
                self.session = Some(PracticeSession::new(ticket.source, Vec::new(), now));
                Err(e.into())
            }
        }
    }

    /// Fetch and install a batch in one step.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` when the fetch fails.
    pub async fn start(&mut self, source: SessionSource) -> Result<StartOutcome, SessionError> {
        let ticket = self.begin_start(source);
        let fetched = self.fetcher.fetch(ticket.source()).await;
        self.complete_start(ticket, fetched)
    }

    //
    // ─── NAVIGATION ────────────────────────────────────────────────────────────
    //

    /// Move to the next question, ending the session after the last one.
    pub async fn advance(&mut self) -> Advance {
        self.tracker.clear_message();
        let Some(session) = self.session.as_mut() else {
            return Advance::Idle;
        };
        match session.advance() {
            Step::Moved(index) => Advance::Next(index),
            Step::Finished => match self.reset().await {
                Some(report) => Advance::Finished(report),
                None => Advance::Idle,
            },
        }
    }

    /// Step back one question; no-op at the first one.
    pub fn retreat(&mut self) -> bool {
        self.session.as_mut().is_some_and(PracticeSession::retreat)
    }

    /// End the current session and refresh stats.
    pub async fn reset(&mut self) -> Option<SessionReport> {
        let report = self
            .session
            .take()
            .map(|session| session.report(self.clock.now()));
        self.tracker.reset();
        self.refresh_stats().await;
        if let Some(report) = &report {
            tracing::debug!(
                answered = report.answered,
                correct = report.correct,
                "session ended"
            );
        }
        report
    }

    //
    // ─── ANSWERING ─────────────────────────────────────────────────────────────
    //

    /// Grade `submitted` against the current question and report it to the store.
    ///
    /// Store failures while reporting are logged; the feedback is still returned.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoQuestion` when no question is on screen.
    /// Returns `SessionError::AlreadyAnswered` when the current question was graded before;
    /// nothing is recorded or reported in that case.
    pub async fn submit_answer(&mut self, submitted: &str) -> Result<AnswerFeedback, SessionError> {
        let session = self.session.as_mut().ok_or(SessionError::NoQuestion)?;
        let question = session.current_question().ok_or(SessionError::NoQuestion)?;
        let question_id = question.id();
        if session.is_answered(question_id) {
            return Err(SessionError::AlreadyAnswered(question_id));
        }
        let correct = evaluate(question, submitted);
        session.record(question_id, correct);

        let encouragement = self.tracker.observe(correct);
        if let Some(stats) = self
            .tracker
            .report(self.progress.as_ref(), question_id, correct)
            .await
        {
            self.stats = Some(stats);
        }

        Ok(AnswerFeedback {
            question_id,
            correct,
            streak: self.tracker.streak(),
            encouragement,
        })
    }

    /// Drop a question from the wrong book, and from the batch when practicing the wrong book.
    ///
    /// An entry the store no longer has counts as removed.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` when the store rejects the removal.
    pub async fn remove_from_wrong_book(&mut self, id: QuestionId) -> Result<(), SessionError> {
        match self.progress.remove_wrong_question(id).await {
            Ok(()) | Err(StorageError::NotFound) => {}
            Err(e) => return Err(e.into()),
        }

        let removal = match self.session.as_mut() {
            Some(session) if session.source().is_wrong_book() => session.remove(id),
            _ => Removal::NotInBatch,
        };
        if removal == Removal::Emptied {
            self.reset().await;
        } else {
            self.refresh_stats().await;
        }
        Ok(())
    }

    /// Reload stats from the store, keeping the previous value on failure.
    pub async fn refresh_stats(&mut self) {
        match self.progress.stats().await {
            Ok(stats) => self.stats = Some(stats),
            Err(e) => tracing::warn!(error = %e, "failed to refresh stats"),
        }
    }

    //
    // ─── STATE ─────────────────────────────────────────────────────────────────
    //

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        self.session
            .as_ref()
            .map(PracticeSession::questions)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.session
            .as_ref()
            .map_or(0, PracticeSession::current_index)
    }

    #[must_use]
    pub fn current_question(&self) -> Option<&Question> {
        self.session.as_ref()?.current_question()
    }

    #[must_use]
    pub fn source(&self) -> Option<&SessionSource> {
        self.session.as_ref().map(PracticeSession::source)
    }

    #[must_use]
    pub fn streak(&self) -> u32 {
        self.tracker.streak()
    }

    #[must_use]
    pub fn message(&self) -> Option<String> {
        self.tracker.message()
    }

    #[must_use]
    pub fn stats(&self) -> Option<&Stats> {
        self.stats.as_ref()
    }
}
