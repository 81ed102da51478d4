use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::model::question::QuestionKind;

/// One selectable entry of a filter listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterItem {
    pub id: String,
    pub name: String,
}

/// Categories and types currently present in the question bank.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Filters {
    pub categories: Vec<FilterItem>,
    pub types: Vec<FilterItem>,
}

/// Which slice of the answer history a batch is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PracticeMode {
    #[default]
    All,
    /// Questions never answered.
    Undone,
    /// Questions answered at least once.
    Done,
    /// Store-ordered mix: wrong book first, then unanswered, then answered.
    Recommend,
}

impl PracticeMode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PracticeMode::All => "all",
            PracticeMode::Undone => "undone",
            PracticeMode::Done => "done",
            PracticeMode::Recommend => "recommend",
        }
    }
}

impl fmt::Display for PracticeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PracticeMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "all" => Ok(PracticeMode::All),
            "undone" => Ok(PracticeMode::Undone),
            "done" => Ok(PracticeMode::Done),
            "recommend" => Ok(PracticeMode::Recommend),
            other => Err(format!("unknown practice mode: {other}")),
        }
    }
}

/// Query sent to the question store.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct QuestionFilter {
    pub category: Option<String>,
    pub kind: Option<QuestionKind>,
    pub mode: PracticeMode,
}

impl QuestionFilter {
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn with_kind(mut self, kind: QuestionKind) -> Self {
        self.kind = Some(kind);
        self
    }

    #[must_use]
    pub fn with_mode(mut self, mode: PracticeMode) -> Self {
        self.mode = mode;
        self
    }
}

/// What a practice session was started from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionSource {
    Questions(QuestionFilter),
    WrongBook,
}

impl SessionSource {
    #[must_use]
    pub fn category(category: impl Into<String>) -> Self {
        Self::Questions(QuestionFilter::default().with_category(category))
    }

    #[must_use]
    pub fn kind(kind: QuestionKind) -> Self {
        Self::Questions(QuestionFilter::default().with_kind(kind))
    }

    #[must_use]
    pub fn mode(mode: PracticeMode) -> Self {
        Self::Questions(QuestionFilter::default().with_mode(mode))
    }

    #[must_use]
    pub fn wrong_book() -> Self {
        Self::WrongBook
    }

    #[must_use]
    pub fn is_wrong_book(&self) -> bool {
        matches!(self, Self::WrongBook)
    }

    /// The store already orders recommended batches; they must not be reshuffled.
    #[must_use]
    pub fn is_store_ordered(&self) -> bool {
        matches!(
            self,
            Self::Questions(QuestionFilter {
                mode: PracticeMode::Recommend,
                ..
            })
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_recommend_is_store_ordered() {
        assert!(SessionSource::mode(PracticeMode::Recommend).is_store_ordered());
        assert!(!SessionSource::mode(PracticeMode::Undone).is_store_ordered());
        assert!(!SessionSource::category("Indexes").is_store_ordered());
        assert!(!SessionSource::wrong_book().is_store_ordered());
    }

    #[test]
    fn mode_parses_and_displays() {
        for mode in [
            PracticeMode::All,
            PracticeMode::Undone,
            PracticeMode::Done,
            PracticeMode::Recommend,
        ] {
            assert_eq!(mode.to_string().parse::<PracticeMode>().unwrap(), mode);
        }
        assert!("sometimes".parse::<PracticeMode>().is_err());
    }
}
