use quiz_core::model::{Question, QuestionFilter};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::repository::{QuestionRecord, StorageError};

#[derive(Debug, Serialize)]
pub(crate) struct ReportRequest {
    pub question_id: u64,
    pub is_correct: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct ImportRequest {
    pub questions: Vec<QuestionRecord>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ImportResponse {
    pub count: usize,
}

pub(crate) fn transport(e: reqwest::Error) -> StorageError {
    if e.is_decode() {
        StorageError::Serialization(e.to_string())
    } else {
        StorageError::Connection(e.to_string())
    }
}

pub(crate) fn status_error(status: StatusCode) -> StorageError {
    if status == StatusCode::NOT_FOUND {
        StorageError::NotFound
    } else {
        StorageError::Status(status.as_u16())
    }
}

pub(crate) fn check_status(response: Response) -> Result<Response, StorageError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(status_error(status))
    }
}

pub(crate) async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, StorageError> {
    check_status(response)?.json::<T>().await.map_err(transport)
}

/// Decode a batch, dropping records the domain rejects instead of failing the batch.
pub(crate) fn questions_from_records(records: Vec<QuestionRecord>) -> Vec<Question> {
    records
        .into_iter()
        .filter_map(|record| match record.into_question() {
            Ok(question) => Some(question),
            Err(e) => {
                tracing::warn!(error = %e, "skipping malformed question record");
                None
            }
        })
        .collect()
}

pub(crate) fn with_filter_query(mut url: Url, filter: &QuestionFilter) -> Url {
    {
        let mut pairs = url.query_pairs_mut();
        if let Some(category) = &filter.category {
            pairs.append_pair("category", category);
        }
        if let Some(kind) = filter.kind {
            pairs.append_pair("type", kind.as_str());
        }
        pairs.append_pair("mode", filter.mode.as_str());
    }
    url
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{PracticeMode, QuestionKind};

    fn record(id: Option<u64>, kind: &str) -> QuestionRecord {
        QuestionRecord {
            id,
            kind: kind.into(),
            category: "Indexes".into(),
            question: "What does a covering index avoid?".into(),
            options: Vec::new(),
            answer: "table lookups".into(),
            explanation: String::new(),
        }
    }

    #[test]
    fn filter_query_encodes_category_type_and_mode() {
        let base = Url::parse("http://localhost:8000/api/questions").unwrap();
        let filter = QuestionFilter::default()
            .with_category("Joins & Views")
            .with_kind(QuestionKind::TrueFalse)
            .with_mode(PracticeMode::Recommend);

        let url = with_filter_query(base, &filter);
        assert_eq!(
            url.query(),
            Some("category=Joins+%26+Views&type=true_false&mode=recommend")
        );
    }

    #[test]
    fn default_filter_sends_mode_all() {
        let base = Url::parse("http://localhost:8000/api/questions").unwrap();
        let url = with_filter_query(base, &QuestionFilter::default());
        assert_eq!(url.query(), Some("mode=all"));
    }

    #[test]
    fn malformed_records_are_skipped() {
        let batch = questions_from_records(vec![
            record(Some(1), "fill"),
            record(Some(2), "essay"),
            record(None, "fill"),
            record(Some(4), "short_answer"),
        ]);
        let ids: Vec<u64> = batch.iter().map(|q| q.id().value()).collect();
        assert_eq!(ids, [1, 4]);
    }

    #[test]
    fn not_found_maps_to_domain_error() {
        assert!(matches!(
            status_error(StatusCode::NOT_FOUND),
            StorageError::NotFound
        ));
        assert!(matches!(
            status_error(StatusCode::BAD_GATEWAY),
            StorageError::Status(502)
        ));
    }

    #[test]
    fn report_payload_matches_store_contract() {
        let body = serde_json::to_value(ReportRequest {
            question_id: 7,
            is_correct: false,
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"question_id": 7, "is_correct": false}));
    }

    #[test]
    fn store_records_decode_with_type_field() {
        let raw = r#"[{"id": 3, "type": "choice", "category": "Joins",
            "question": "Pick one", "options": ["x", "y"], "answer": "B", "explanation": ""}]"#;
        let records: Vec<QuestionRecord> = serde_json::from_str(raw).unwrap();
        let questions = questions_from_records(records);
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].kind(), QuestionKind::Choice);
        assert_eq!(questions[0].options(), ["x", "y"]);
    }
}
