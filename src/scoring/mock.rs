//! 测试用评分后端

use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;

use super::{AutoScorer, ScoreOutcome, ScoreRequest, ScorerError};

/// 返回固定结果的评分后端，记录调用次数
pub struct MockScorer {
    outcome: Result<ScoreOutcome, String>,
    call_count: AtomicU32,
}

impl MockScorer {
    pub fn with_marks(marks_awarded: f64, feedback: &str) -> Self {
        Self {
            outcome: Ok(ScoreOutcome {
                marks_awarded,
                feedback: feedback.to_string(),
            }),
            call_count: AtomicU32::new(0),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            outcome: Err(message.to_string()),
            call_count: AtomicU32::new(0),
        }
    }

    pub fn call_count(&self) -> u32 {
        self.call_count.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl AutoScorer for MockScorer {
    fn name(&self) -> &str {
        "mock"
    }

    async fn score(&self, _request: &ScoreRequest) -> Result<ScoreOutcome, ScorerError> {
        self.call_count.fetch_add(1, Ordering::Relaxed);
        self.outcome.clone().map_err(ScorerError::Network)
    }
}
