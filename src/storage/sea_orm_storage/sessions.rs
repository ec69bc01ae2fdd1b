//! 考试会话存储操作

use super::SeaOrmStorage;
use super::responses::upsert_response;
use crate::entity::evaluations::ActiveModel as EvaluationActiveModel;
use crate::entity::exam_sessions::{ActiveModel, Column, Entity as ExamSessions};
use crate::entity::responses::{Column as ResponseColumn, Entity as Responses};
use crate::errors::{ExamSystemError, Result};
use crate::models::sessions::entities::{ExamSession, SessionState};
use crate::storage::SubmissionCommit;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect, Set, SqlErr,
    TransactionTrait,
};
use tracing::debug;

impl SeaOrmStorage {
    /// 创建会话；同一 (考试, 学生) 已存在会话时返回冲突
    pub async fn create_session_impl(
        &self,
        exam_id: i64,
        student_id: i64,
        started_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<ExamSession> {
        let model = ActiveModel {
            exam_id: Set(exam_id),
            student_id: Set(student_id),
            started_at: Set(started_at.timestamp()),
            expires_at: Set(expires_at.timestamp()),
            state: Set(SessionState::Active.to_string()),
            submitted_at: Set(None),
            auto_submitted: Set(false),
            last_saved_at: Set(None),
            ..Default::default()
        };

        match model.insert(&self.db).await {
            Ok(result) => Ok(result.into_session()),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                let existing = ExamSessions::find()
                    .filter(Column::ExamId.eq(exam_id))
                    .filter(Column::StudentId.eq(student_id))
                    .one(&self.db)
                    .await
                    .map_err(|e| {
                        ExamSystemError::database_operation(format!("查询会话失败: {e}"))
                    })?
                    .map(|m| m.into_session());

                match existing {
                    Some(session) if session.is_active() => Err(ExamSystemError::already_active(
                        format!("考试 {exam_id} 已有进行中的会话 {}", session.id),
                    )),
                    Some(session) => Err(ExamSystemError::already_submitted(format!(
                        "考试 {exam_id} 的会话 {} 已提交",
                        session.id
                    ))),
                    None => Err(ExamSystemError::state_conflict(format!(
                        "创建会话冲突: {e}"
                    ))),
                }
            }
            Err(e) => Err(ExamSystemError::database_operation(format!(
                "创建会话失败: {e}"
            ))),
        }
    }

    /// 通过 ID 获取会话
    pub async fn get_session_by_id_impl(&self, session_id: i64) -> Result<Option<ExamSession>> {
        let result = ExamSessions::find_by_id(session_id)
            .one(&self.db)
            .await
            .map_err(|e| ExamSystemError::database_operation(format!("查询会话失败: {e}")))?;

        Ok(result.map(|m| m.into_session()))
    }

    /// 列出已到期但仍处于进行中的会话（按到期时间升序）
    pub async fn list_expired_active_sessions_impl(
        &self,
        now: DateTime<Utc>,
        limit: u64,
    ) -> Result<Vec<ExamSession>> {
        let results = ExamSessions::find()
            .filter(Column::State.eq(SessionState::ACTIVE))
            .filter(Column::ExpiresAt.lte(now.timestamp()))
            .order_by_asc(Column::ExpiresAt)
            .limit(limit)
            .all(&self.db)
            .await
            .map_err(|e| {
                ExamSystemError::database_operation(format!("查询到期会话失败: {e}"))
            })?;

        Ok(results.into_iter().map(|m| m.into_session()).collect())
    }

    /// 提交会话
    ///
    /// 先以条件更新把状态从 active 改为 submitted，只有改成功的调用继续写入
    /// 最终答案并生成初始评分；其余调用回滚事务并返回 `None`。
    pub async fn commit_submission_impl(
        &self,
        session_id: i64,
        commit: SubmissionCommit,
    ) -> Result<Option<ExamSession>> {
        let submitted_at = commit.submitted_at.timestamp();

        let txn = self
            .db
            .begin()
            .await
            .map_err(|e| ExamSystemError::database_operation(format!("开启事务失败: {e}")))?;

        let flipped = ExamSessions::update_many()
            .col_expr(Column::State, Expr::value(SessionState::SUBMITTED))
            .col_expr(Column::SubmittedAt, Expr::value(submitted_at))
            .col_expr(Column::AutoSubmitted, Expr::value(commit.auto_submitted))
            .filter(Column::Id.eq(session_id))
            .filter(Column::State.eq(SessionState::ACTIVE))
            .exec(&txn)
            .await
            .map_err(|e| ExamSystemError::database_operation(format!("更新会话状态失败: {e}")))?;

        if flipped.rows_affected == 0 {
            txn.rollback()
                .await
                .map_err(|e| ExamSystemError::database_operation(format!("回滚事务失败: {e}")))?;
            debug!("Session {} already submitted, commit skipped", session_id);
            return Ok(None);
        }

        for answer in &commit.answers {
            upsert_response(&txn, session_id, answer, submitted_at).await?;
        }

        let responses = Responses::find()
            .filter(ResponseColumn::SessionId.eq(session_id))
            .all(&txn)
            .await
            .map_err(|e| ExamSystemError::database_operation(format!("查询作答失败: {e}")))?;

        for response in responses {
            let Some(question) = commit.questions.iter().find(|q| q.id == response.question_id)
            else {
                continue;
            };
            let draft = (commit.grader)(question, &response.answer_text, commit.submitted_at);
            EvaluationActiveModel {
                response_id: Set(response.id),
                marks_awarded: Set(draft.marks_awarded),
                feedback: Set(draft.feedback),
                evaluator: Set(draft.evaluator.map(|e| e.to_string())),
                evaluator_id: Set(draft.evaluator_id),
                status: Set(draft.status.to_string()),
                evaluated_at: Set(draft.evaluated_at.map(|t| t.timestamp())),
                last_error: Set(None),
                ..Default::default()
            }
            .insert(&txn)
            .await
            .map_err(|e| ExamSystemError::database_operation(format!("创建评分失败: {e}")))?;
        }

        let session = ExamSessions::find_by_id(session_id)
            .one(&txn)
            .await
            .map_err(|e| ExamSystemError::database_operation(format!("查询会话失败: {e}")))?
            .ok_or_else(|| ExamSystemError::not_found(format!("会话 {session_id} 不存在")))?;

        txn.commit()
            .await
            .map_err(|e| ExamSystemError::database_operation(format!("提交事务失败: {e}")))?;

        Ok(Some(session.into_session()))
    }
}
