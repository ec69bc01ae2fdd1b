//! 作答存储操作

use super::SeaOrmStorage;
use crate::entity::evaluations::{Column as EvaluationColumn, Entity as Evaluations};
use crate::entity::exam_sessions::{Column as SessionColumn, Entity as ExamSessions};
use crate::entity::responses::{ActiveModel, Column, Entity as Responses};
use crate::errors::{ExamSystemError, Result};
use crate::models::{
    evaluations::entities::EvaluationStatus,
    responses::{entities::Response, requests::AnswerInput},
    sessions::entities::SessionState,
};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{
    ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};

/// 按 (会话, 题目) 写入或覆盖作答
pub(super) async fn upsert_response<C: ConnectionTrait>(
    conn: &C,
    session_id: i64,
    answer: &AnswerInput,
    saved_at: i64,
) -> Result<()> {
    let model = ActiveModel {
        session_id: Set(session_id),
        question_id: Set(answer.question_id),
        answer_text: Set(answer.answer_text.clone()),
        last_saved_at: Set(saved_at),
        ..Default::default()
    };

    Responses::insert(model)
        .on_conflict(
            OnConflict::columns([Column::SessionId, Column::QuestionId])
                .update_columns([Column::AnswerText, Column::LastSavedAt])
                .to_owned(),
        )
        .exec_without_returning(conn)
        .await
        .map_err(|e| ExamSystemError::database_operation(format!("保存作答失败: {e}")))?;

    Ok(())
}

impl SeaOrmStorage {
    /// 保存作答
    ///
    /// 同一事务内先确认会话仍在进行且未到期，再逐题覆盖写入。
    pub async fn record_responses_impl(
        &self,
        session_id: i64,
        answers: Vec<AnswerInput>,
        now: DateTime<Utc>,
    ) -> Result<usize> {
        let now_ts = now.timestamp();

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| ExamSystemError::database_operation(format!("开启事务失败: {e}")))?;

        let guard = ExamSessions::update_many()
            .col_expr(SessionColumn::LastSavedAt, Expr::value(now_ts))
            .filter(SessionColumn::Id.eq(session_id))
            .filter(SessionColumn::State.eq(SessionState::ACTIVE))
            .filter(SessionColumn::ExpiresAt.gt(now_ts))
            .exec(&txn)
            .await
            .map_err(|e| ExamSystemError::database_operation(format!("更新会话失败: {e}")))?;

        // MySQL 同一秒内重复保存时 rows_affected 为 0，需回读会话确认
        let still_open = guard.rows_affected > 0
            || ExamSessions::find_by_id(session_id)
                .filter(SessionColumn::State.eq(SessionState::ACTIVE))
                .filter(SessionColumn::ExpiresAt.gt(now_ts))
                .one(&txn)
                .await
                .map_err(|e| ExamSystemError::database_operation(format!("查询会话失败: {e}")))?
                .is_some();

        if !still_open {
            txn.rollback()
                .await
                .map_err(|e| ExamSystemError::database_operation(format!("回滚事务失败: {e}")))?;
            return Err(ExamSystemError::session_closed(format!(
                "会话 {session_id} 已结束，无法保存作答"
            )));
        }

        for answer in &answers {
            upsert_response(&txn, session_id, answer, now_ts).await?;
        }

        txn.commit()
            .await
            .map_err(|e| ExamSystemError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(answers.len())
    }

    /// 列出会话全部作答（按题目 ID 排序）
    pub async fn list_session_responses_impl(&self, session_id: i64) -> Result<Vec<Response>> {
        let results = Responses::find()
            .filter(Column::SessionId.eq(session_id))
            .order_by_asc(Column::QuestionId)
            .all(&self.db)
            .await
            .map_err(|e| ExamSystemError::database_operation(format!("查询作答失败: {e}")))?;

        Ok(results.into_iter().map(|m| m.into_response()).collect())
    }

    /// 通过 ID 获取作答
    pub async fn get_response_by_id_impl(&self, response_id: i64) -> Result<Option<Response>> {
        let result = Responses::find_by_id(response_id)
            .one(&self.db)
            .await
            .map_err(|e| ExamSystemError::database_operation(format!("查询作答失败: {e}")))?;

        Ok(result.map(|m| m.into_response()))
    }

    /// 列出会话中评分仍为 pending 的作答
    pub async fn list_pending_responses_impl(&self, session_id: i64) -> Result<Vec<Response>> {
        let responses = self.list_session_responses_impl(session_id).await?;
        if responses.is_empty() {
            return Ok(responses);
        }

        let pending_ids: Vec<i64> = Evaluations::find()
            .filter(EvaluationColumn::ResponseId.is_in(responses.iter().map(|r| r.id)))
            .filter(EvaluationColumn::Status.eq(EvaluationStatus::PENDING))
            .all(&self.db)
            .await
            .map_err(|e| ExamSystemError::database_operation(format!("查询评分失败: {e}")))?
            .into_iter()
            .map(|m| m.response_id)
            .collect();

        Ok(responses
            .into_iter()
            .filter(|r| pending_ids.contains(&r.id))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;
    use crate::test_support::{memory_storage, sample_exam};

    fn answer(question_id: i64, text: &str) -> AnswerInput {
        AnswerInput {
            question_id,
            answer_text: text.to_string(),
        }
    }

    #[tokio::test]
    async fn test_progressive_saves_overwrite_per_question() {
        let storage = memory_storage().await;
        let (exam, questions) = storage
            .create_exam_impl(sample_exam(1_700_000_000))
            .await
            .unwrap();
        let now = Utc::now();
        let session = storage
            .create_session_impl(exam.id, 3, now, now + Duration::minutes(30))
            .await
            .unwrap();

        storage
            .record_responses_impl(session.id, vec![answer(questions[0].id, "B")], now)
            .await
            .unwrap();
        storage
            .record_responses_impl(
                session.id,
                vec![answer(questions[0].id, "A"), answer(questions[1].id, "draft")],
                now,
            )
            .await
            .unwrap();

        let responses = storage.list_session_responses_impl(session.id).await.unwrap();
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0].answer_text, "A");
        assert_eq!(responses[1].answer_text, "draft");
    }

    #[tokio::test]
    async fn test_save_after_expiry_is_rejected() {
        let storage = memory_storage().await;
        let (exam, questions) = storage
            .create_exam_impl(sample_exam(1_700_000_000))
            .await
            .unwrap();
        let now = Utc::now();
        let session = storage
            .create_session_impl(exam.id, 3, now - Duration::minutes(31), now - Duration::minutes(1))
            .await
            .unwrap();

        let err = storage
            .record_responses_impl(session.id, vec![answer(questions[0].id, "A")], now)
            .await
            .unwrap_err();
        assert_eq!(err.code(), "E023");
        assert!(
            storage
                .list_session_responses_impl(session.id)
                .await
                .unwrap()
                .is_empty()
        );
    }
}
