//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::{QuestionError, QuestionId};
use storage::repository::StorageError;

/// Errors emitted by the practice session controller.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no question is being shown")]
    NoQuestion,
    #[error("question {0} was already answered in this session")]
    AlreadyAnswered(QuestionId),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `QuestionBankService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuestionBankError {
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error("import record #{position} is invalid: {source}")]
    InvalidRecord {
        position: usize,
        #[source]
        source: QuestionError,
    },
    #[error("import file is not valid question JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
