use std::sync::Arc;

use quiz_core::model::{Question, SessionSource};
use storage::repository::{ProgressRepository, QuestionRepository, StorageError};

/// Store-backed batch lookup for a session source.
///
/// Cheap to clone, so a fetch can run while the controller stays borrowable.
#[derive(Clone)]
pub struct BatchFetcher {
    questions: Arc<dyn QuestionRepository>,
    progress: Arc<dyn ProgressRepository>,
}

impl BatchFetcher {
    #[must_use]
    pub fn new(
        questions: Arc<dyn QuestionRepository>,
        progress: Arc<dyn ProgressRepository>,
    ) -> Self {
        Self {
            questions,
            progress,
        }
    }

    /// Fetch the raw batch in store order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` when the store cannot be reached or answers with an error.
    pub async fn fetch(&self, source: &SessionSource) -> Result<Vec<Question>, StorageError> {
        let batch = match source {
            SessionSource::Questions(filter) => self.questions.list_questions(filter).await?,
            SessionSource::WrongBook => self.progress.list_wrong_questions().await?,
        };
        tracing::debug!(?source, count = batch.len(), "fetched question batch");
        Ok(batch)
    }
}
