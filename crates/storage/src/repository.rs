use async_trait::async_trait;
use quiz_core::model::{
    FilterItem, Filters, PracticeMode, Question, QuestionDraft, QuestionError, QuestionFilter,
    QuestionId, QuestionKind, Stats,
};
use rand::rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by question store adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("store rejected request with status {0}")]
    Status(u16),

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Wire shape of a question, shared by the HTTP store and import files.
///
/// Mirrors the domain `Question` with the answer flattened back to text so
/// store payloads can be decoded without leaking transport concerns into the
/// domain layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub category: String,
    pub question: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub answer: String,
    #[serde(default)]
    pub explanation: String,
}

impl QuestionRecord {
    #[must_use]
    pub fn from_question(question: &Question) -> Self {
        let mut record = Self::from_draft(question.to_draft());
        record.id = Some(question.id().value());
        record
    }

    #[must_use]
    pub fn from_draft(draft: QuestionDraft) -> Self {
        Self {
            id: None,
            kind: draft.kind,
            category: draft.category,
            question: draft.prompt,
            options: draft.options,
            answer: draft.answer,
            explanation: draft.explanation,
        }
    }

    #[must_use]
    pub fn into_draft(self) -> QuestionDraft {
        QuestionDraft {
            kind: self.kind,
            category: self.category,
            prompt: self.question,
            options: self.options,
            answer: self.answer,
            explanation: self.explanation,
        }
    }

    /// Convert the record back into a domain `Question`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Serialization` if the id is missing or the
    /// question fails domain validation.
    pub fn into_question(self) -> Result<Question, StorageError> {
        let id = self
            .id
            .map(QuestionId::new)
            .ok_or_else(|| StorageError::Serialization("question record without id".into()))?;
        self.into_draft()
            .validate()
            .map(|validated| validated.assign_id(id))
            .map_err(|e| StorageError::Serialization(format!("question {id}: {e}")))
    }
}

/// Catalog side of the question store.
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// Categories and types present in the bank.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be reached.
    async fn list_filters(&self) -> Result<Filters, StorageError>;

    /// Questions matching the filter, in store order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be reached.
    async fn list_questions(&self, filter: &QuestionFilter) -> Result<Vec<Question>, StorageError>;

    /// Fetch one question.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_question(&self, id: QuestionId) -> Result<Question, StorageError>;

    /// Persist a new question; the store assigns the id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the question cannot be stored.
    async fn create_question(&self, draft: QuestionDraft) -> Result<Question, StorageError>;

    /// Replace a question's content, keeping its id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn update_question(
        &self,
        id: QuestionId,
        draft: QuestionDraft,
    ) -> Result<Question, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn delete_question(&self, id: QuestionId) -> Result<(), StorageError>;

    /// Append questions with fresh ids; returns how many were added.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the batch cannot be stored.
    async fn import_questions(&self, drafts: Vec<QuestionDraft>) -> Result<usize, StorageError>;
}

/// Answer history, wrong book and statistics.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Record one answer event.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the event cannot be stored.
    async fn record_answer(&self, id: QuestionId, correct: bool) -> Result<(), StorageError>;

    /// Questions currently in the wrong book.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be reached.
    async fn list_wrong_questions(&self) -> Result<Vec<Question>, StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the question is not in the wrong book.
    async fn remove_wrong_question(&self, id: QuestionId) -> Result<(), StorageError>;

    /// # Errors
    ///
    /// Returns `StorageError` if the store cannot be reached.
    async fn stats(&self) -> Result<Stats, StorageError>;
}

#[derive(Debug, Default)]
struct Progress {
    history: BTreeSet<QuestionId>,
    wrong: Vec<QuestionId>,
    total_answered: u32,
    correct_answered: u32,
    cat_stats: BTreeMap<String, quiz_core::model::CategoryStats>,
}

const UNCATEGORIZED: &str = "Uncategorized";

/// In-memory question store for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    questions: Arc<Mutex<Vec<Question>>>,
    progress: Arc<Mutex<Progress>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_questions(&self) -> Result<std::sync::MutexGuard<'_, Vec<Question>>, StorageError> {
        self.questions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }

    fn lock_progress(&self) -> Result<std::sync::MutexGuard<'_, Progress>, StorageError> {
        self.progress
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }
}

fn next_id(questions: &[Question]) -> QuestionId {
    questions
        .iter()
        .map(Question::id)
        .max()
        .map_or_else(|| QuestionId::new(1), |max| max.next())
}

fn invalid(e: QuestionError) -> StorageError {
    StorageError::Serialization(e.to_string())
}

#[async_trait]
impl QuestionRepository for InMemoryRepository {
    async fn list_filters(&self) -> Result<Filters, StorageError> {
        let guard = self.lock_questions()?;
        let categories: BTreeSet<&str> = guard
            .iter()
            .map(Question::category)
            .filter(|c| !c.is_empty())
            .collect();
        let kinds: BTreeSet<QuestionKind> = guard.iter().map(Question::kind).collect();

        Ok(Filters {
            categories: categories
                .into_iter()
                .map(|c| FilterItem {
                    id: c.to_string(),
                    name: c.to_string(),
                })
                .collect(),
            types: kinds
                .into_iter()
                .map(|k| FilterItem {
                    id: k.as_str().to_string(),
                    name: k.display_name().to_string(),
                })
                .collect(),
        })
    }

    async fn list_questions(&self, filter: &QuestionFilter) -> Result<Vec<Question>, StorageError> {
        let all = self.lock_questions()?.clone();
        let (history, wrong) = {
            let progress = self.lock_progress()?;
            let wrong: BTreeSet<QuestionId> = progress.wrong.iter().copied().collect();
            (progress.history.clone(), wrong)
        };

        let by_mode: Vec<Question> = match filter.mode {
            PracticeMode::All => all,
            PracticeMode::Done => all
                .into_iter()
                .filter(|q| history.contains(&q.id()))
                .collect(),
            PracticeMode::Undone => all
                .into_iter()
                .filter(|q| !history.contains(&q.id()))
                .collect(),
            PracticeMode::Recommend => {
                let (mut in_wrong, rest): (Vec<_>, Vec<_>) =
                    all.into_iter().partition(|q| wrong.contains(&q.id()));
                let (mut done, mut undone): (Vec<_>, Vec<_>) =
                    rest.into_iter().partition(|q| history.contains(&q.id()));

                let mut rng = rng();
                in_wrong.shuffle(&mut rng);
                undone.shuffle(&mut rng);
                done.shuffle(&mut rng);

                in_wrong.into_iter().chain(undone).chain(done).collect()
            }
        };

        Ok(by_mode
            .into_iter()
            .filter(|q| filter.category.as_deref().is_none_or(|c| q.category() == c))
            .filter(|q| filter.kind.is_none_or(|k| q.kind() == k))
            .collect())
    }

    async fn get_question(&self, id: QuestionId) -> Result<Question, StorageError> {
        let guard = self.lock_questions()?;
        guard
            .iter()
            .find(|q| q.id() == id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn create_question(&self, draft: QuestionDraft) -> Result<Question, StorageError> {
        let validated = draft.validate().map_err(invalid)?;
        let mut guard = self.lock_questions()?;
        let question = validated.assign_id(next_id(&guard));
        guard.push(question.clone());
        Ok(question)
    }

    async fn update_question(
        &self,
        id: QuestionId,
        draft: QuestionDraft,
    ) -> Result<Question, StorageError> {
        let validated = draft.validate().map_err(invalid)?;
        let mut guard = self.lock_questions()?;
        let slot = guard
            .iter_mut()
            .find(|q| q.id() == id)
            .ok_or(StorageError::NotFound)?;
        *slot = validated.assign_id(id);
        Ok(slot.clone())
    }

    async fn delete_question(&self, id: QuestionId) -> Result<(), StorageError> {
        let mut guard = self.lock_questions()?;
        let before = guard.len();
        guard.retain(|q| q.id() != id);
        if guard.len() == before {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn import_questions(&self, drafts: Vec<QuestionDraft>) -> Result<usize, StorageError> {
        let validated = drafts
            .into_iter()
            .map(QuestionDraft::validate)
            .collect::<Result<Vec<_>, _>>()
            .map_err(invalid)?;

        let mut guard = self.lock_questions()?;
        let mut id = next_id(&guard);
        let count = validated.len();
        for question in validated {
            guard.push(question.assign_id(id));
            id = id.next();
        }
        Ok(count)
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn record_answer(&self, id: QuestionId, correct: bool) -> Result<(), StorageError> {
        let category = {
            let guard = self.lock_questions()?;
            guard.iter().find(|q| q.id() == id).map(|q| {
                if q.category().is_empty() {
                    UNCATEGORIZED.to_string()
                } else {
                    q.category().to_string()
                }
            })
        };

        let mut progress = self.lock_progress()?;
        progress.total_answered = progress.total_answered.saturating_add(1);
        progress.history.insert(id);

        if correct {
            progress.correct_answered = progress.correct_answered.saturating_add(1);
            progress.wrong.retain(|w| *w != id);
        } else if !progress.wrong.contains(&id) {
            progress.wrong.push(id);
        }

        if let Some(category) = category {
            progress.cat_stats.entry(category).or_default().record(correct);
        }
        Ok(())
    }

    async fn list_wrong_questions(&self) -> Result<Vec<Question>, StorageError> {
        let wrong: BTreeSet<QuestionId> = self.lock_progress()?.wrong.iter().copied().collect();
        let guard = self.lock_questions()?;
        Ok(guard
            .iter()
            .filter(|q| wrong.contains(&q.id()))
            .cloned()
            .collect())
    }

    async fn remove_wrong_question(&self, id: QuestionId) -> Result<(), StorageError> {
        let mut progress = self.lock_progress()?;
        let before = progress.wrong.len();
        progress.wrong.retain(|w| *w != id);
        if progress.wrong.len() == before {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn stats(&self) -> Result<Stats, StorageError> {
        let progress = self.lock_progress()?;
        Ok(Stats {
            total_answered: progress.total_answered,
            correct_answered: progress.correct_answered,
            wrong_count: u32::try_from(progress.wrong.len()).unwrap_or(u32::MAX),
            cat_stats: progress.cat_stats.clone(),
        })
    }
}

/// Aggregates the question store behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub questions: Arc<dyn QuestionRepository>,
    pub progress: Arc<dyn ProgressRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_repository(InMemoryRepository::new())
    }

    #[must_use]
    pub fn from_repository(repo: InMemoryRepository) -> Self {
        let questions: Arc<dyn QuestionRepository> = Arc::new(repo.clone());
        let progress: Arc<dyn ProgressRepository> = Arc::new(repo);
        Self {
            questions,
            progress,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(kind: &str, category: &str, prompt: &str) -> QuestionDraft {
        QuestionDraft {
            kind: kind.into(),
            category: category.into(),
            prompt: prompt.into(),
            options: vec!["a".into(), "b".into()],
            answer: match kind {
                "true_false" => "√".into(),
                "choice" => "A".into(),
                _ => "answer".into(),
            },
            explanation: String::new(),
        }
    }

    async fn seeded() -> InMemoryRepository {
        let repo = InMemoryRepository::new();
        repo.import_questions(vec![
            draft("choice", "Indexes", "q1"),
            draft("fill", "Indexes", "q2"),
            draft("true_false", "Views", "q3"),
            draft("short_answer", "", "q4"),
        ])
        .await
        .unwrap();
        repo
    }

    fn ids(questions: &[Question]) -> Vec<u64> {
        questions.iter().map(|q| q.id().value()).collect()
    }

    #[tokio::test]
    async fn import_assigns_sequential_ids_after_max() {
        let repo = seeded().await;
        let created = repo.create_question(draft("fill", "Views", "q5")).await.unwrap();
        assert_eq!(created.id(), QuestionId::new(5));

        repo.delete_question(QuestionId::new(2)).await.unwrap();
        let added = repo
            .import_questions(vec![draft("fill", "Views", "q6")])
            .await
            .unwrap();
        assert_eq!(added, 1);
        assert!(repo.get_question(QuestionId::new(6)).await.is_ok());
    }

    #[tokio::test]
    async fn filters_skip_empty_categories_and_sort() {
        let repo = seeded().await;
        let filters = repo.list_filters().await.unwrap();
        let categories: Vec<_> = filters.categories.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(categories, ["Indexes", "Views"]);
        let types: Vec<_> = filters.types.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(types, ["choice", "true_false", "fill", "short_answer"]);
    }

    #[tokio::test]
    async fn list_filters_by_category_and_kind() {
        let repo = seeded().await;
        let by_cat = repo
            .list_questions(&QuestionFilter::default().with_category("Indexes"))
            .await
            .unwrap();
        assert_eq!(ids(&by_cat), [1, 2]);

        let by_kind = repo
            .list_questions(&QuestionFilter::default().with_kind(QuestionKind::TrueFalse))
            .await
            .unwrap();
        assert_eq!(ids(&by_kind), [3]);
    }

    #[tokio::test]
    async fn done_and_undone_split_on_history() {
        let repo = seeded().await;
        repo.record_answer(QuestionId::new(2), true).await.unwrap();

        let done = repo
            .list_questions(&QuestionFilter::default().with_mode(PracticeMode::Done))
            .await
            .unwrap();
        assert_eq!(ids(&done), [2]);

        let undone = repo
            .list_questions(&QuestionFilter::default().with_mode(PracticeMode::Undone))
            .await
            .unwrap();
        assert_eq!(ids(&undone), [1, 3, 4]);
    }

    #[tokio::test]
    async fn recommend_orders_wrong_then_undone_then_done() {
        let repo = seeded().await;
        repo.record_answer(QuestionId::new(1), true).await.unwrap();
        repo.record_answer(QuestionId::new(3), false).await.unwrap();

        let batch = repo
            .list_questions(&QuestionFilter::default().with_mode(PracticeMode::Recommend))
            .await
            .unwrap();
        let order = ids(&batch);
        assert_eq!(order[0], 3);
        let mut middle = order[1..3].to_vec();
        middle.sort_unstable();
        assert_eq!(middle, [2, 4]);
        assert_eq!(order[3], 1);
    }

    #[tokio::test]
    async fn answers_move_questions_in_and_out_of_wrong_book() {
        let repo = seeded().await;
        repo.record_answer(QuestionId::new(1), false).await.unwrap();
        repo.record_answer(QuestionId::new(1), false).await.unwrap();
        repo.record_answer(QuestionId::new(2), false).await.unwrap();
        assert_eq!(ids(&repo.list_wrong_questions().await.unwrap()), [1, 2]);

        repo.record_answer(QuestionId::new(1), true).await.unwrap();
        assert_eq!(ids(&repo.list_wrong_questions().await.unwrap()), [2]);

        let stats = repo.stats().await.unwrap();
        assert_eq!(stats.total_answered, 4);
        assert_eq!(stats.correct_answered, 1);
        assert_eq!(stats.wrong_count, 1);
        assert_eq!(stats.cat_stats["Indexes"].total, 4);
        assert_eq!(stats.cat_stats["Indexes"].correct, 1);
    }

    #[tokio::test]
    async fn uncategorized_and_unknown_questions_in_stats() {
        let repo = seeded().await;
        repo.record_answer(QuestionId::new(4), true).await.unwrap();
        repo.record_answer(QuestionId::new(99), true).await.unwrap();

        let stats = repo.stats().await.unwrap();
        assert_eq!(stats.total_answered, 2);
        assert_eq!(stats.cat_stats.len(), 1);
        assert_eq!(stats.cat_stats[UNCATEGORIZED].correct, 1);
    }

    #[tokio::test]
    async fn removing_missing_wrong_entry_is_not_found() {
        let repo = seeded().await;
        let err = repo.remove_wrong_question(QuestionId::new(1)).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound));
    }

    #[tokio::test]
    async fn update_keeps_id_and_rejects_unknown() {
        let repo = seeded().await;
        let updated = repo
            .update_question(QuestionId::new(2), draft("fill", "Joins", "q2 edited"))
            .await
            .unwrap();
        assert_eq!(updated.id(), QuestionId::new(2));
        assert_eq!(updated.category(), "Joins");

        let err = repo
            .update_question(QuestionId::new(42), draft("fill", "Joins", "x"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::NotFound));
    }

    #[tokio::test]
    async fn invalid_import_adds_nothing() {
        let repo = seeded().await;
        let err = repo
            .import_questions(vec![draft("fill", "A", "ok"), draft("essay", "A", "bad")])
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Serialization(_)));
        assert_eq!(repo.list_questions(&QuestionFilter::default()).await.unwrap().len(), 4);
    }

    #[test]
    fn record_round_trips_through_question() {
        let question = draft("choice", "Indexes", "q")
            .validate()
            .unwrap()
            .assign_id(QuestionId::new(8));
        let record = QuestionRecord::from_question(&question);
        assert_eq!(record.id, Some(8));
        assert_eq!(record.kind, "choice");
        assert_eq!(record.into_question().unwrap(), question);
    }

    #[test]
    fn record_without_id_is_rejected() {
        let record = QuestionRecord::from_draft(draft("fill", "A", "q"));
        assert!(matches!(
            record.into_question(),
            Err(StorageError::Serialization(_))
        ));
    }
}
