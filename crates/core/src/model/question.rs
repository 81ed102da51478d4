use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::QuestionId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question prompt cannot be empty")]
    EmptyPrompt,

    #[error("unknown question type: {0}")]
    UnknownKind(String),

    #[error("choice question needs at least one option")]
    MissingOptions,

    #[error("true/false answer must be `√` or `×`, got {0:?}")]
    InvalidVerdict(String),
}

//
// ─── KIND ──────────────────────────────────────────────────────────────────────
//

/// The four supported question formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    Choice,
    TrueFalse,
    Fill,
    ShortAnswer,
}

impl QuestionKind {
    pub const ALL: [QuestionKind; 4] = [
        QuestionKind::Choice,
        QuestionKind::TrueFalse,
        QuestionKind::Fill,
        QuestionKind::ShortAnswer,
    ];

    /// Wire name used by the question store.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            QuestionKind::Choice => "choice",
            QuestionKind::TrueFalse => "true_false",
            QuestionKind::Fill => "fill",
            QuestionKind::ShortAnswer => "short_answer",
        }
    }

    /// Human readable label for filter listings.
    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            QuestionKind::Choice => "Multiple choice",
            QuestionKind::TrueFalse => "True / false",
            QuestionKind::Fill => "Fill in the blank",
            QuestionKind::ShortAnswer => "Short answer",
        }
    }
}

impl fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionKind {
    type Err = QuestionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QuestionKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| QuestionError::UnknownKind(s.to_string()))
    }
}

//
// ─── ANSWER KEY ────────────────────────────────────────────────────────────────
//

/// Answer of a true/false question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    True,
    False,
}

impl Verdict {
    pub const TRUE_SYMBOL: &'static str = "√";
    pub const FALSE_SYMBOL: &'static str = "×";

    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Verdict::True => Self::TRUE_SYMBOL,
            Verdict::False => Self::FALSE_SYMBOL,
        }
    }

    /// Parses one of the two sentinel symbols. Anything else is rejected.
    #[must_use]
    pub fn from_symbol(s: &str) -> Option<Self> {
        match s {
            Self::TRUE_SYMBOL => Some(Verdict::True),
            Self::FALSE_SYMBOL => Some(Verdict::False),
            _ => None,
        }
    }
}

/// Expected answer, shaped by the question kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerKey {
    /// `letter` names the correct option by position (`A` is the first).
    /// It is kept verbatim; a letter that does not resolve to an option is
    /// never matched.
    Choice { options: Vec<String>, letter: String },
    TrueFalse(Verdict),
    Fill(String),
    /// Reference text for self-assessment. Not graded.
    ShortAnswer(String),
}

impl AnswerKey {
    #[must_use]
    pub fn kind(&self) -> QuestionKind {
        match self {
            AnswerKey::Choice { .. } => QuestionKind::Choice,
            AnswerKey::TrueFalse(_) => QuestionKind::TrueFalse,
            AnswerKey::Fill(_) => QuestionKind::Fill,
            AnswerKey::ShortAnswer(_) => QuestionKind::ShortAnswer,
        }
    }

    /// The answer in its stored text form.
    #[must_use]
    pub fn as_text(&self) -> &str {
        match self {
            AnswerKey::Choice { letter, .. } => letter,
            AnswerKey::TrueFalse(verdict) => verdict.symbol(),
            AnswerKey::Fill(text) | AnswerKey::ShortAnswer(text) => text,
        }
    }
}

/// Maps an option letter to its zero-based position (`A → 0`, `B → 1`, ...).
///
/// Only a single uppercase ASCII letter is recognized.
#[must_use]
pub fn letter_to_index(letter: &str) -> Option<usize> {
    let mut chars = letter.chars();
    match (chars.next(), chars.next()) {
        (Some(c @ 'A'..='Z'), None) => Some(c as usize - 'A' as usize),
        _ => None,
    }
}

/// Inverse of [`letter_to_index`]; `None` past `Z`.
#[must_use]
pub fn index_to_letter(index: usize) -> Option<char> {
    u8::try_from(index)
        .ok()
        .filter(|i| *i < 26)
        .map(|i| char::from(b'A' + i))
}

//
// ─── DRAFT ─────────────────────────────────────────────────────────────────────
//

/// Unvalidated question as typed by an editor or read from an import file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QuestionDraft {
    pub kind: String,
    pub category: String,
    pub prompt: String,
    pub options: Vec<String>,
    pub answer: String,
    pub explanation: String,
}

impl QuestionDraft {
    /// Check the draft and shape its answer into an [`AnswerKey`].
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` when the prompt is blank, the kind is unknown,
    /// a choice question has no options, or a true/false answer is not a sentinel.
    pub fn validate(self) -> Result<ValidatedQuestion, QuestionError> {
        if self.prompt.trim().is_empty() {
            return Err(QuestionError::EmptyPrompt);
        }

        let kind: QuestionKind = self.kind.trim().parse()?;
        let key = match kind {
            QuestionKind::Choice => {
                if self.options.is_empty() {
                    return Err(QuestionError::MissingOptions);
                }
                AnswerKey::Choice {
                    options: self.options,
                    letter: self.answer,
                }
            }
            QuestionKind::TrueFalse => AnswerKey::TrueFalse(
                Verdict::from_symbol(self.answer.trim())
                    .ok_or(QuestionError::InvalidVerdict(self.answer))?,
            ),
            QuestionKind::Fill => AnswerKey::Fill(self.answer),
            QuestionKind::ShortAnswer => AnswerKey::ShortAnswer(self.answer),
        };

        let explanation = Some(self.explanation).filter(|e| !e.trim().is_empty());

        Ok(ValidatedQuestion {
            category: self.category.trim().to_string(),
            prompt: self.prompt,
            explanation,
            key,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedQuestion {
    pub category: String,
    pub prompt: String,
    pub explanation: Option<String>,
    pub key: AnswerKey,
}

impl ValidatedQuestion {
    #[must_use]
    pub fn assign_id(self, id: QuestionId) -> Question {
        Question {
            id,
            category: self.category,
            prompt: self.prompt,
            explanation: self.explanation,
            key: self.key,
        }
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A question as served to a practice session. Read-only from the session's side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    id: QuestionId,
    category: String,
    prompt: String,
    explanation: Option<String>,
    key: AnswerKey,
}

impl Question {
    #[must_use]
    pub fn id(&self) -> QuestionId {
        self.id
    }

    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    #[must_use]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    #[must_use]
    pub fn explanation(&self) -> Option<&str> {
        self.explanation.as_deref()
    }

    #[must_use]
    pub fn key(&self) -> &AnswerKey {
        &self.key
    }

    #[must_use]
    pub fn kind(&self) -> QuestionKind {
        self.key.kind()
    }

    /// Options of a choice question; empty for every other kind.
    #[must_use]
    pub fn options(&self) -> &[String] {
        match &self.key {
            AnswerKey::Choice { options, .. } => options,
            _ => &[],
        }
    }

    /// Back to the editable form, e.g. for an update round trip.
    #[must_use]
    pub fn to_draft(&self) -> QuestionDraft {
        QuestionDraft {
            kind: self.kind().as_str().to_string(),
            category: self.category.clone(),
            prompt: self.prompt.clone(),
            options: self.options().to_vec(),
            answer: self.key.as_text().to_string(),
            explanation: self.explanation.clone().unwrap_or_default(),
        }
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
