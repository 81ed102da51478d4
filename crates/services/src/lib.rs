#![forbid(unsafe_code)]

pub mod error;
pub mod question_bank_service;
pub mod sessions;

pub use quiz_core::Clock;
pub use sessions as session;

pub use error::{QuestionBankError, SessionError};
pub use question_bank_service::QuestionBankService;

pub use sessions::{
    AnswerFeedback, Advance, BatchPlanner, ProgressTracker, SessionController, SessionReport,
    StartOutcome, StartTicket,
};
