use std::sync::Arc;

use serde::Deserialize;

use quiz_core::model::{Filters, Question, QuestionDraft, QuestionFilter, QuestionId};
use storage::repository::{QuestionRecord, QuestionRepository};

use crate::error::QuestionBankError;

/// Accepted layouts of an import file.
#[derive(Deserialize)]
#[serde(untagged)]
enum ImportFile {
    Wrapped { questions: Vec<QuestionRecord> },
    Bare(Vec<QuestionRecord>),
}

impl ImportFile {
    fn into_records(self) -> Vec<QuestionRecord> {
        match self {
            Self::Wrapped { questions } | Self::Bare(questions) => questions,
        }
    }
}

/// Administrative access to the question catalog.
#[derive(Clone)]
pub struct QuestionBankService {
    questions: Arc<dyn QuestionRepository>,
}

impl QuestionBankService {
    #[must_use]
    pub fn new(questions: Arc<dyn QuestionRepository>) -> Self {
        Self { questions }
    }

    /// # Errors
    ///
    /// Returns `QuestionBankError::Storage` if repository access fails.
    pub async fn filters(&self) -> Result<Filters, QuestionBankError> {
        Ok(self.questions.list_filters().await?)
    }

    /// # Errors
    ///
    /// Returns `QuestionBankError::Storage` if repository access fails.
    pub async fn list(&self, filter: &QuestionFilter) -> Result<Vec<Question>, QuestionBankError> {
        Ok(self.questions.list_questions(filter).await?)
    }

    /// # Errors
    ///
    /// Returns `QuestionBankError::Storage` if the question is missing or access fails.
    pub async fn get(&self, id: QuestionId) -> Result<Question, QuestionBankError> {
        Ok(self.questions.get_question(id).await?)
    }

    /// Validate and store a new question.
    ///
    /// # Errors
    ///
    /// Returns `QuestionBankError::Question` for validation failures.
    /// Returns `QuestionBankError::Storage` if persistence fails.
    pub async fn create(&self, draft: QuestionDraft) -> Result<Question, QuestionBankError> {
        draft.clone().validate()?;
        let question = self.questions.create_question(draft).await?;
        tracing::debug!(id = %question.id(), "question created");
        Ok(question)
    }

    /// Replace the content of an existing question, keeping its id.
    ///
    /// # Errors
    ///
    /// Returns `QuestionBankError::Question` for validation failures.
    /// Returns `QuestionBankError::Storage` if the question is missing or persistence fails.
    pub async fn update(
        &self,
        id: QuestionId,
        draft: QuestionDraft,
    ) -> Result<Question, QuestionBankError> {
        draft.clone().validate()?;
        Ok(self.questions.update_question(id, draft).await?)
    }

    /// # Errors
    ///
    /// Returns `QuestionBankError::Storage` if the question is missing or deletion fails.
    pub async fn delete(&self, id: QuestionId) -> Result<(), QuestionBankError> {
        self.questions.delete_question(id).await?;
        tracing::debug!(%id, "question deleted");
        Ok(())
    }

    /// Import a batch of drafts. Nothing is stored unless every draft is valid.
    ///
    /// # Errors
    ///
    /// Returns `QuestionBankError::InvalidRecord` naming the first bad draft (1-based).
    /// Returns `QuestionBankError::Storage` if the store rejects the batch.
    pub async fn import(&self, drafts: Vec<QuestionDraft>) -> Result<usize, QuestionBankError> {
        for (index, draft) in drafts.iter().enumerate() {
            draft
                .clone()
                .validate()
                .map_err(|source| QuestionBankError::InvalidRecord {
                    position: index + 1,
                    source,
                })?;
        }
        let count = self.questions.import_questions(drafts).await?;
        tracing::info!(count, "questions imported");
        Ok(count)
    }

    /// Import questions from JSON text: `{"questions": [...]}` or a bare array.
    ///
    /// Record ids in the file are ignored; the store assigns new ones.
    ///
    /// # Errors
    ///
    /// Returns `QuestionBankError::Json` if the text is not a question list.
    /// Returns `QuestionBankError::InvalidRecord` or `Storage` as [`Self::import`] does.
    pub async fn import_json(&self, text: &str) -> Result<usize, QuestionBankError> {
        let file: ImportFile = serde_json::from_str(text)?;
        let drafts = file
            .into_records()
            .into_iter()
            .map(QuestionRecord::into_draft)
            .collect();
        self.import(drafts).await
    }
}
