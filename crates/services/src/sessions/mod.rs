mod plan;
mod progress;
mod queries;
mod service;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use plan::BatchPlanner;
pub use progress::ProgressTracker;
pub use queries::BatchFetcher;
pub use service::{PracticeSession, Removal, SessionReport, Step};
pub use workflow::{AnswerFeedback, Advance, SessionController, StartOutcome, StartTicket};
