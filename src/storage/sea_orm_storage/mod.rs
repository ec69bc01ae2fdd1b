//! SeaORM 存储实现
//!
//! 统一的数据库存储层，支持 SQLite、PostgreSQL 和 MySQL。

mod evaluations;
mod exams;
mod responses;
mod sessions;

use crate::config::AppConfig;
use crate::errors::{ExamSystemError, Result};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::time::Duration;
use tracing::info;

/// SeaORM 存储实现
#[derive(Clone)]
pub struct SeaOrmStorage {
    pub(crate) db: DatabaseConnection,
}

impl SeaOrmStorage {
    /// 按全局配置创建存储实例
    pub async fn new_async() -> Result<Self> {
        let config = AppConfig::get();
        Self::connect(
            &config.database.url,
            config.database.pool_size,
            config.database.timeout,
        )
        .await
    }

    /// 连接数据库并运行迁移
    pub async fn connect(url: &str, pool_size: u32, timeout_secs: u64) -> Result<Self> {
        let db_url = Self::build_database_url(url)?;

        // 根据数据库类型选择连接方式
        let db = if db_url.starts_with("sqlite:") {
            Self::connect_sqlite(&db_url, pool_size, timeout_secs).await?
        } else {
            Self::connect_generic(&db_url, pool_size, timeout_secs).await?
        };

        // 运行迁移
        Migrator::up(&db, None)
            .await
            .map_err(|e| ExamSystemError::database_operation(format!("数据库迁移失败: {e}")))?;

        info!("SeaORM 存储初始化完成，数据库: {}", db_url);

        Ok(Self { db })
    }

    /// SQLite 专用连接（WAL + pragma 优化）
    async fn connect_sqlite(
        url: &str,
        pool_size: u32,
        timeout_secs: u64,
    ) -> Result<DatabaseConnection> {
        use sea_orm::SqlxSqliteConnector;
        use sea_orm::sqlx::sqlite::{
            SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
        };
        use std::str::FromStr;

        let opt = SqliteConnectOptions::from_str(url)
            .map_err(|e| ExamSystemError::database_config(format!("SQLite URL 解析失败: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(Duration::from_secs(5))
            .foreign_keys(true)
            .pragma("cache_size", "-64000")
            .pragma("temp_store", "memory");

        // 内存库每个连接各自独立，只能使用单连接
        let max_connections = if url.contains(":memory:") { 1 } else { pool_size };

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .min_connections(1)
            .test_before_acquire(true)
            .acquire_timeout(Duration::from_secs(timeout_secs))
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(opt)
            .await
            .map_err(|e| ExamSystemError::database_connection(format!("SQLite 连接失败: {e}")))?;

        Ok(SqlxSqliteConnector::from_sqlx_sqlite_pool(pool))
    }

    /// 通用连接（PostgreSQL、MySQL 等）
    async fn connect_generic(
        url: &str,
        pool_size: u32,
        timeout_secs: u64,
    ) -> Result<DatabaseConnection> {
        let mut opt = ConnectOptions::new(url);
        opt.max_connections(pool_size)
            .min_connections(5)
            .connect_timeout(Duration::from_secs(timeout_secs))
            .acquire_timeout(Duration::from_secs(timeout_secs))
            .idle_timeout(Duration::from_secs(600))
            .max_lifetime(Duration::from_secs(1800))
            .sqlx_logging(false)
            .sqlx_logging_level(tracing::log::LevelFilter::Debug);

        Database::connect(opt)
            .await
            .map_err(|e| ExamSystemError::database_connection(format!("无法连接到数据库: {e}")))
    }

    /// 从 URL 自动推断数据库类型并构建连接 URL
    fn build_database_url(url: &str) -> Result<String> {
        if url.starts_with("sqlite:") {
            Ok(url.to_string())
        } else if url == ":memory:" {
            Ok("sqlite::memory:".to_string())
        } else if url.ends_with(".db") || url.ends_with(".sqlite") {
            Ok(format!("sqlite://{}?mode=rwc", url))
        } else if url.starts_with("postgres://")
            || url.starts_with("postgresql://")
            || url.starts_with("mysql://")
            || url.starts_with("mariadb://")
        {
            Ok(url.to_string())
        } else {
            Err(ExamSystemError::database_config(format!(
                "无法从 URL 推断数据库类型: {url}. 支持: sqlite://, postgres://, mysql://, 或 .db/.sqlite 文件路径"
            )))
        }
    }
}

// Storage trait 实现
use crate::models::{
    evaluations::entities::{Evaluation, EvaluationDraft},
    exams::{
        entities::{Exam, Question},
        requests::CreateExamRequest,
    },
    responses::{entities::Response, requests::AnswerInput},
    sessions::entities::ExamSession,
};
use crate::storage::{Storage, SubmissionCommit};
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[async_trait]
impl Storage for SeaOrmStorage {
    // 考试模块
    async fn create_exam(&self, exam: CreateExamRequest) -> Result<(Exam, Vec<Question>)> {
        self.create_exam_impl(exam).await
    }

    async fn get_exam_by_id(&self, exam_id: i64) -> Result<Option<Exam>> {
        self.get_exam_by_id_impl(exam_id).await
    }

    async fn find_exam_by_title_and_owner(
        &self,
        title: &str,
        owner_id: i64,
    ) -> Result<Option<Exam>> {
        self.find_exam_by_title_and_owner_impl(title, owner_id)
            .await
    }

    async fn list_exam_questions(&self, exam_id: i64) -> Result<Vec<Question>> {
        self.list_exam_questions_impl(exam_id).await
    }

    async fn get_question_by_id(&self, question_id: i64) -> Result<Option<Question>> {
        self.get_question_by_id_impl(question_id).await
    }

    // 会话模块
    async fn create_session(
        &self,
        exam_id: i64,
        student_id: i64,
        started_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Result<ExamSession> {
        self.create_session_impl(exam_id, student_id, started_at, expires_at)
            .await
    }

    async fn get_session_by_id(&self, session_id: i64) -> Result<Option<ExamSession>> {
        self.get_session_by_id_impl(session_id).await
    }

    async fn list_expired_active_sessions(
        &self,
        now: DateTime<Utc>,
        limit: u64,
    ) -> Result<Vec<ExamSession>> {
        self.list_expired_active_sessions_impl(now, limit).await
    }

    async fn commit_submission(
        &self,
        session_id: i64,
        commit: SubmissionCommit,
    ) -> Result<Option<ExamSession>> {
        self.commit_submission_impl(session_id, commit).await
    }

    // 作答模块
    async fn record_responses(
        &self,
        session_id: i64,
        answers: Vec<AnswerInput>,
        now: DateTime<Utc>,
    ) -> Result<usize> {
        self.record_responses_impl(session_id, answers, now).await
    }

    async fn list_session_responses(&self, session_id: i64) -> Result<Vec<Response>> {
        self.list_session_responses_impl(session_id).await
    }

    async fn get_response_by_id(&self, response_id: i64) -> Result<Option<Response>> {
        self.get_response_by_id_impl(response_id).await
    }

    async fn list_pending_responses(&self, session_id: i64) -> Result<Vec<Response>> {
        self.list_pending_responses_impl(session_id).await
    }

    // 评分模块
    async fn get_evaluation_by_response_id(
        &self,
        response_id: i64,
    ) -> Result<Option<Evaluation>> {
        self.get_evaluation_by_response_id_impl(response_id).await
    }

    async fn list_session_evaluations(&self, session_id: i64) -> Result<Vec<Evaluation>> {
        self.list_session_evaluations_impl(session_id).await
    }

    async fn write_automatic_evaluation(
        &self,
        response_id: i64,
        draft: EvaluationDraft,
    ) -> Result<Option<Evaluation>> {
        self.write_automatic_evaluation_impl(response_id, draft)
            .await
    }

    async fn write_manual_evaluation(
        &self,
        response_id: i64,
        draft: EvaluationDraft,
    ) -> Result<Evaluation> {
        self.write_manual_evaluation_impl(response_id, draft).await
    }

    async fn record_evaluation_failure(&self, response_id: i64, error: &str) -> Result<()> {
        self.record_evaluation_failure_impl(response_id, error)
            .await
    }
}
