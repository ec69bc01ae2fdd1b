use async_trait::async_trait;

use super::{AutoScorer, ScoreOutcome, ScoreRequest, ScorerError};

/// 未配置自动评分时使用，所有请求都返回 `NotConfigured`
#[derive(Debug, Default)]
pub struct DisabledScorer;

#[async_trait]
impl AutoScorer for DisabledScorer {
    fn name(&self) -> &str {
        "disabled"
    }

    async fn score(&self, _request: &ScoreRequest) -> Result<ScoreOutcome, ScorerError> {
        Err(ScorerError::NotConfigured(
            "no automated scorer backend is enabled".to_string(),
        ))
    }
}
