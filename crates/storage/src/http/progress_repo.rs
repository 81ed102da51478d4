use quiz_core::model::{Question, QuestionId, Stats};

use super::HttpRepository;
use super::mapping::{ReportRequest, check_status, questions_from_records, read_json, transport};
use crate::repository::{ProgressRepository, QuestionRecord, StorageError};

#[async_trait::async_trait]
impl ProgressRepository for HttpRepository {
    async fn record_answer(&self, id: QuestionId, correct: bool) -> Result<(), StorageError> {
        let response = self
            .client()
            .post(self.endpoint("report")?)
            .json(&ReportRequest {
                question_id: id.value(),
                is_correct: correct,
            })
            .send()
            .await
            .map_err(transport)?;
        check_status(response)?;
        Ok(())
    }

    async fn list_wrong_questions(&self) -> Result<Vec<Question>, StorageError> {
        let response = self
            .client()
            .get(self.endpoint("wrong-questions")?)
            .send()
            .await
            .map_err(transport)?;
        let records: Vec<QuestionRecord> = read_json(response).await?;
        Ok(questions_from_records(records))
    }

    async fn remove_wrong_question(&self, id: QuestionId) -> Result<(), StorageError> {
        let response = self
            .client()
            .delete(self.endpoint(&format!("wrong-questions/{id}"))?)
            .send()
            .await
            .map_err(transport)?;
        check_status(response)?;
        Ok(())
    }

    async fn stats(&self) -> Result<Stats, StorageError> {
        let response = self
            .client()
            .get(self.endpoint("stats")?)
            .send()
            .await
            .map_err(transport)?;
        read_json(response).await
    }
}
