//! 自动评分服务
//!
//! 主观题的自动评分通过 [`AutoScorer`] 调用外部模型完成，后端按名称在
//! [`register`] 中注册。

mod disabled;
#[cfg(test)]
pub(crate) mod mock;
mod openai;
pub mod prompt;
pub mod register;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::exams::entities::{Question, QuestionType};

pub use disabled::DisabledScorer;
pub use openai::OpenAiScorer;
pub use register::{create_scorer, register_builtin_scorers};

/// 一次评分请求
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreRequest {
    pub question_type: QuestionType,
    pub question_text: String,
    pub answer_text: String,
    pub max_marks: f64,
    pub word_limit: Option<i32>,
}

impl ScoreRequest {
    pub fn new(question: &Question, answer_text: &str) -> Self {
        Self {
            question_type: question.question_type,
            question_text: question.text.clone(),
            answer_text: answer_text.to_string(),
            max_marks: question.max_marks,
            word_limit: question.word_limit,
        }
    }
}

/// 评分结果
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreOutcome {
    pub marks_awarded: f64,
    pub feedback: String,
}

/// Errors returned by an automated scorer backend.
#[derive(Debug, Error)]
pub enum ScorerError {
    /// No backend is configured.
    #[error("automated scorer is not configured: {0}")]
    NotConfigured(String),

    /// A network error occurred.
    #[error("network error: {0}")]
    Network(String),

    /// The request timed out.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// The API returned a 429 rate limit response.
    #[error("rate limited, retry after {retry_after_ms}ms")]
    RateLimited { retry_after_ms: u64 },

    /// The API returned an error response.
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// The model answered but the output could not be used.
    #[error("invalid scorer output: {0}")]
    InvalidOutput(String),
}

impl ScorerError {
    /// 可在同一次触发内重试的错误
    pub fn is_transient(&self) -> bool {
        match self {
            ScorerError::Network(_) | ScorerError::Timeout(_) | ScorerError::RateLimited { .. } => {
                true
            }
            ScorerError::Api { status, .. } => *status >= 500,
            ScorerError::NotConfigured(_) | ScorerError::InvalidOutput(_) => false,
        }
    }
}

/// 自动评分后端
#[async_trait]
pub trait AutoScorer: Send + Sync {
    fn name(&self) -> &str;

    async fn score(&self, request: &ScoreRequest) -> Result<ScoreOutcome, ScorerError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(ScorerError::Timeout(30).is_transient());
        assert!(ScorerError::RateLimited { retry_after_ms: 1000 }.is_transient());
        assert!(
            ScorerError::Api {
                status: 503,
                message: "overloaded".into()
            }
            .is_transient()
        );
        assert!(
            !ScorerError::Api {
                status: 401,
                message: "bad key".into()
            }
            .is_transient()
        );
        assert!(!ScorerError::InvalidOutput("no json".into()).is_transient());
    }
}
