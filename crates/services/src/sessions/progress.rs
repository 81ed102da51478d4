use quiz_core::model::{QuestionId, Stats};
use quiz_core::streak::{Encouragement, Streak};
use storage::repository::ProgressRepository;

/// Streak counter plus the encouragement currently on display.
#[derive(Debug, Clone, Default)]
pub struct ProgressTracker {
    streak: Streak,
    pending: Option<Encouragement>,
}

impl ProgressTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn streak(&self) -> u32 {
        self.streak.value()
    }

    #[must_use]
    pub fn message(&self) -> Option<String> {
        self.pending.map(|tier| tier.message(self.streak.value()))
    }

    /// Fold one outcome into the streak and pick the message for it.
    pub fn observe(&mut self, correct: bool) -> Option<Encouragement> {
        self.pending = self.streak.record(correct);
        self.pending
    }

    pub fn clear_message(&mut self) {
        self.pending = None;
    }

    pub fn reset(&mut self) {
        self.streak.reset();
        self.pending = None;
    }

    /// Forward the outcome to the store and fetch fresh stats.
    ///
    /// Failures are logged and swallowed; `None` means the stats could not be refreshed.
    pub async fn report(
        &self,
        progress: &dyn ProgressRepository,
        question_id: QuestionId,
        correct: bool,
    ) -> Option<Stats> {
        if let Err(e) = progress.record_answer(question_id, correct).await {
            tracing::warn!(error = %e, %question_id, correct, "failed to report answer");
        }
        match progress.stats().await {
            Ok(stats) => Some(stats),
            Err(e) => {
                tracing::warn!(error = %e, "failed to refresh stats");
                None
            }
        }
    }
}
