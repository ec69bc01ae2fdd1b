use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::models::{
    evaluations::entities::{Evaluation, EvaluationDraft},
    exams::{
        entities::{Exam, Question},
        requests::CreateExamRequest,
    },
    responses::{entities::Response, requests::AnswerInput},
    sessions::entities::ExamSession,
};

use crate::errors::Result;

pub mod sea_orm_storage;

/// 根据题目与最终答案生成初始评分
pub type InitialGrader = fn(&Question, &str, DateTime<Utc>) -> EvaluationDraft;

/// 提交落库所需的全部数据
#[derive(Debug, Clone)]
pub struct SubmissionCommit {
    pub submitted_at: DateTime<Utc>,
    pub auto_submitted: bool,
    // 已过滤未知题目并去重
    pub answers: Vec<AnswerInput>,
    pub questions: Vec<Question>,
    pub grader: InitialGrader,
}

#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    /// 考试（只读，导入时写入）
    // 创建考试及其题目
    async fn create_exam(&self, exam: CreateExamRequest) -> Result<(Exam, Vec<Question>)>;
    // 通过ID获取考试
    async fn get_exam_by_id(&self, exam_id: i64) -> Result<Option<Exam>>;
    // 通过标题与出题人查找考试
    async fn find_exam_by_title_and_owner(&self, title: &str, owner_id: i64)
    -> Result<Option<Exam>>;
    // 按顺序列出考试题目
    async fn list_exam_questions(&self, exam_id: i64) -> Result<Vec<Question>>;
    // 通过ID获取题目
    async fn get_question_by_id(&self, question_id: i64) -> Result<Option<Question>>;

    /// 考试会话
    // 创建会话，同一学生同一考试只允许一次
    async fn create_session(
        &self,
        exam_id: i64,
        student_id: i64,
        started_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<ExamSession>;
    // 通过ID获取会话
    async fn get_session_by_id(&self, session_id: i64) -> Result<Option<ExamSession>>;
    // 列出已到期但仍未提交的会话
    async fn list_expired_active_sessions(
        &self,
        now: DateTime<Utc>,
        limit: u64,
    ) -> Result<Vec<ExamSession>>;
    // 原子地提交会话；返回 None 表示已被其他调用提交
    async fn commit_submission(
        &self,
        session_id: i64,
        commit: SubmissionCommit,
    ) -> Result<Option<ExamSession>>;

    /// 作答
    // 保存作答（仅会话进行中且未到期时）
    async fn record_responses(
        &self,
        session_id: i64,
        answers: Vec<AnswerInput>,
        now: DateTime<Utc>,
    ) -> Result<usize>;
    // 列出会话全部作答
    async fn list_session_responses(&self, session_id: i64) -> Result<Vec<Response>>;
    // 通过ID获取作答
    async fn get_response_by_id(&self, response_id: i64) -> Result<Option<Response>>;
    // 列出会话中待评阅的作答
    async fn list_pending_responses(&self, session_id: i64) -> Result<Vec<Response>>;

    /// 评分
    // 获取作答当前评分
    async fn get_evaluation_by_response_id(&self, response_id: i64)
    -> Result<Option<Evaluation>>;
    // 列出会话全部评分
    async fn list_session_evaluations(&self, session_id: i64) -> Result<Vec<Evaluation>>;
    // 写入自动评分；已人工评阅时不写入并返回 None
    async fn write_automatic_evaluation(
        &self,
        response_id: i64,
        draft: EvaluationDraft,
    ) -> Result<Option<Evaluation>>;
    // 写入人工评分
    async fn write_manual_evaluation(
        &self,
        response_id: i64,
        draft: EvaluationDraft,
    ) -> Result<Evaluation>;
    // 记录自动评分失败原因，不改变分数与状态
    async fn record_evaluation_failure(&self, response_id: i64, error: &str) -> Result<()>;
}

pub async fn create_storage() -> Result<Arc<dyn Storage>> {
    let storage = sea_orm_storage::SeaOrmStorage::new_async().await?;
    Ok(Arc::new(storage))
}
