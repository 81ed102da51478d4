use quiz_core::model::{Filters, Question, QuestionDraft, QuestionFilter, QuestionId};

use super::HttpRepository;
use super::mapping::{
    ImportRequest, ImportResponse, check_status, questions_from_records, read_json, transport,
    with_filter_query,
};
use crate::repository::{QuestionRecord, QuestionRepository, StorageError};

#[async_trait::async_trait]
impl QuestionRepository for HttpRepository {
    async fn list_filters(&self) -> Result<Filters, StorageError> {
        let response = self
            .client()
            .get(self.endpoint("filters")?)
            .send()
            .await
            .map_err(transport)?;
        read_json(response).await
    }

    async fn list_questions(&self, filter: &QuestionFilter) -> Result<Vec<Question>, StorageError> {
        let url = with_filter_query(self.endpoint("questions")?, filter);
        let response = self.client().get(url).send().await.map_err(transport)?;
        let records: Vec<QuestionRecord> = read_json(response).await?;
        Ok(questions_from_records(records))
    }

    async fn get_question(&self, id: QuestionId) -> Result<Question, StorageError> {
        let response = self
            .client()
            .get(self.endpoint(&format!("questions/{id}"))?)
            .send()
            .await
            .map_err(transport)?;
        let record: QuestionRecord = read_json(response).await?;
        record.into_question()
    }

    async fn create_question(&self, draft: QuestionDraft) -> Result<Question, StorageError> {
        let response = self
            .client()
            .post(self.endpoint("questions")?)
            .json(&QuestionRecord::from_draft(draft))
            .send()
            .await
            .map_err(transport)?;
        let record: QuestionRecord = read_json(response).await?;
        record.into_question()
    }

    async fn update_question(
        &self,
        id: QuestionId,
        draft: QuestionDraft,
    ) -> Result<Question, StorageError> {
        let mut body = QuestionRecord::from_draft(draft);
        body.id = Some(id.value());
        let response = self
            .client()
            .put(self.endpoint(&format!("questions/{id}"))?)
            .json(&body)
            .send()
            .await
            .map_err(transport)?;
        let record: QuestionRecord = read_json(response).await?;
        record.into_question()
    }

    async fn delete_question(&self, id: QuestionId) -> Result<(), StorageError> {
        let response = self
            .client()
            .delete(self.endpoint(&format!("questions/{id}"))?)
            .send()
            .await
            .map_err(transport)?;
        check_status(response)?;
        Ok(())
    }

    async fn import_questions(&self, drafts: Vec<QuestionDraft>) -> Result<usize, StorageError> {
        let body = ImportRequest {
            questions: drafts.into_iter().map(QuestionRecord::from_draft).collect(),
        };
        let response = self
            .client()
            .post(self.endpoint("questions/import")?)
            .json(&body)
            .send()
            .await
            .map_err(transport)?;
        let imported: ImportResponse = read_json(response).await?;
        Ok(imported.count)
    }
}
