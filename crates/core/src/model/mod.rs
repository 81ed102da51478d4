mod filter;
mod ids;
mod question;
mod stats;

pub use filter::{FilterItem, Filters, PracticeMode, QuestionFilter, SessionSource};
pub use ids::{ParseIdError, QuestionId};
pub use question::{
    AnswerKey, Question, QuestionDraft, QuestionError, QuestionKind, ValidatedQuestion, Verdict,
    index_to_letter, letter_to_index,
};
pub use stats::{CategoryAccuracy, CategoryStats, Stats, accuracy_percent};
