//! 评分存储操作

use super::SeaOrmStorage;
use crate::entity::evaluations::{Column, Entity as Evaluations};
use crate::entity::responses::{Column as ResponseColumn, Entity as Responses};
use crate::errors::{ExamSystemError, Result};
use crate::models::evaluations::entities::{Evaluation, EvaluationDraft, Evaluator};
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, Condition, EntityTrait, QueryFilter, QuerySelect, UpdateMany};

// 把评分草稿的各字段写入更新语句
fn apply_draft(
    update: UpdateMany<Evaluations>,
    draft: EvaluationDraft,
) -> UpdateMany<Evaluations> {
    update
        .col_expr(Column::MarksAwarded, Expr::value(draft.marks_awarded))
        .col_expr(Column::Feedback, Expr::value(draft.feedback))
        .col_expr(
            Column::Evaluator,
            Expr::value(draft.evaluator.map(|e| e.to_string())),
        )
        .col_expr(Column::EvaluatorId, Expr::value(draft.evaluator_id))
        .col_expr(Column::Status, Expr::value(draft.status.to_string()))
        .col_expr(
            Column::EvaluatedAt,
            Expr::value(draft.evaluated_at.map(|t| t.timestamp())),
        )
        .col_expr(Column::LastError, Expr::value(Option::<String>::None))
}

// 尚未被人工评阅锁定
fn not_manually_locked() -> Condition {
    Condition::any()
        .add(Column::Evaluator.is_null())
        .add(Column::Evaluator.ne(Evaluator::MANUAL_REVIEWER))
}

impl SeaOrmStorage {
    /// 获取作答当前评分
    pub async fn get_evaluation_by_response_id_impl(
        &self,
        response_id: i64,
    ) -> Result<Option<Evaluation>> {
        let result = Evaluations::find()
            .filter(Column::ResponseId.eq(response_id))
            .one(&self.db)
            .await
            .map_err(|e| ExamSystemError::database_operation(format!("查询评分失败: {e}")))?;

        Ok(result.map(|m| m.into_evaluation()))
    }

    /// 列出会话全部评分
    pub async fn list_session_evaluations_impl(&self, session_id: i64) -> Result<Vec<Evaluation>> {
        let response_ids: Vec<i64> = Responses::find()
            .select_only()
            .column(ResponseColumn::Id)
            .filter(ResponseColumn::SessionId.eq(session_id))
            .into_tuple()
            .all(&self.db)
            .await
            .map_err(|e| ExamSystemError::database_operation(format!("查询作答失败: {e}")))?;

        if response_ids.is_empty() {
            return Ok(Vec::new());
        }

        let results = Evaluations::find()
            .filter(Column::ResponseId.is_in(response_ids))
            .all(&self.db)
            .await
            .map_err(|e| ExamSystemError::database_operation(format!("查询评分失败: {e}")))?;

        Ok(results.into_iter().map(|m| m.into_evaluation()).collect())
    }

    /// 写入自动评分
    ///
    /// 条件更新排除已由人工评阅的记录，未写入时返回 `None`。
    pub async fn write_automatic_evaluation_impl(
        &self,
        response_id: i64,
        draft: EvaluationDraft,
    ) -> Result<Option<Evaluation>> {
        let result = apply_draft(Evaluations::update_many(), draft)
            .filter(Column::ResponseId.eq(response_id))
            .filter(not_manually_locked())
            .exec(&self.db)
            .await
            .map_err(|e| ExamSystemError::database_operation(format!("写入自动评分失败: {e}")))?;

        // MySQL 只统计实际变化的行，需要回读确认是否被人工锁定
        let current = self.get_evaluation_by_response_id_impl(response_id).await?;
        if result.rows_affected == 0 {
            return Ok(current.filter(|e| !e.is_locked()));
        }
        Ok(current)
    }

    /// 写入人工评分（覆盖任何已有评分）
    pub async fn write_manual_evaluation_impl(
        &self,
        response_id: i64,
        draft: EvaluationDraft,
    ) -> Result<Evaluation> {
        let result = apply_draft(Evaluations::update_many(), draft)
            .filter(Column::ResponseId.eq(response_id))
            .exec(&self.db)
            .await
            .map_err(|e| ExamSystemError::database_operation(format!("写入人工评分失败: {e}")))?;

        tracing::debug!(
            "Manual evaluation of response {} touched {} row(s)",
            response_id,
            result.rows_affected
        );
        self.get_evaluation_by_response_id_impl(response_id)
            .await?
            .ok_or_else(|| ExamSystemError::not_found(format!("作答 {response_id} 尚无评分记录")))
    }

    /// 记录自动评分失败原因
    pub async fn record_evaluation_failure_impl(&self, response_id: i64, error: &str) -> Result<()> {
        Evaluations::update_many()
            .col_expr(Column::LastError, Expr::value(error.to_string()))
            .filter(Column::ResponseId.eq(response_id))
            .filter(not_manually_locked())
            .exec(&self.db)
            .await
            .map_err(|e| ExamSystemError::database_operation(format!("记录评分失败原因失败: {e}")))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, Utc};

    use super::*;
    use crate::models::evaluations::entities::EvaluationStatus;
    use crate::models::exams::entities::Question;
    use crate::models::responses::requests::AnswerInput;
    use crate::storage::SubmissionCommit;
    use crate::test_support::{memory_storage, sample_exam};

    fn pending_grader(_: &Question, _: &str, _: DateTime<Utc>) -> EvaluationDraft {
        EvaluationDraft::pending()
    }

    // 提交一份只含论述题答案的会话，返回作答 ID
    async fn submitted_long_answer(storage: &SeaOrmStorage) -> i64 {
        let (exam, questions) = storage
            .create_exam_impl(sample_exam(1_700_000_000))
            .await
            .unwrap();
        let now = Utc::now();
        let session = storage
            .create_session_impl(exam.id, 9, now, now + Duration::minutes(30))
            .await
            .unwrap();
        storage
            .commit_submission_impl(
                session.id,
                SubmissionCommit {
                    submitted_at: now,
                    auto_submitted: false,
                    answers: vec![AnswerInput {
                        question_id: questions[2].id,
                        answer_text: "RefCell checks borrows at runtime".to_string(),
                    }],
                    questions,
                    grader: pending_grader,
                },
            )
            .await
            .unwrap();
        storage
            .list_session_responses_impl(session.id)
            .await
            .unwrap()[0]
            .id
    }

    #[tokio::test]
    async fn test_automatic_write_skips_manual_evaluation() {
        let storage = memory_storage().await;
        let response_id = submitted_long_answer(&storage).await;
        let now = Utc::now();

        let manual = storage
            .write_manual_evaluation_impl(
                response_id,
                EvaluationDraft::evaluated(Evaluator::ManualReviewer, Some(5), 7.0, None, now),
            )
            .await
            .unwrap();
        assert_eq!(manual.marks_awarded, 7.0);

        let automatic = storage
            .write_automatic_evaluation_impl(
                response_id,
                EvaluationDraft::evaluated(Evaluator::AiModel, None, 2.0, Some("weak".into()), now),
            )
            .await
            .unwrap();
        assert!(automatic.is_none());

        let current = storage
            .get_evaluation_by_response_id_impl(response_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(current.marks_awarded, 7.0);
        assert_eq!(current.evaluator, Some(Evaluator::ManualReviewer));
        assert_eq!(current.evaluator_id, Some(5));
    }

    #[tokio::test]
    async fn test_failure_is_recorded_without_changing_status() {
        let storage = memory_storage().await;
        let response_id = submitted_long_answer(&storage).await;

        storage
            .record_evaluation_failure_impl(response_id, "scorer timed out")
            .await
            .unwrap();

        let current = storage
            .get_evaluation_by_response_id_impl(response_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(current.status, EvaluationStatus::Pending);
        assert_eq!(current.last_error.as_deref(), Some("scorer timed out"));
    }
}
