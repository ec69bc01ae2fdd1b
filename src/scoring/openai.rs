//! OpenAI 兼容的评分后端

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{instrument, warn};

use super::prompt::{SYSTEM_PROMPT, build_prompt, parse_evaluation_output};
use super::{AutoScorer, ScoreOutcome, ScoreRequest, ScorerError};
use crate::config::OpenAiScorerConfig;

/// 通过 chat completions 接口评分
pub struct OpenAiScorer {
    api_key: String,
    base_url: String,
    model: String,
    temperature: f64,
    max_tokens: u32,
    timeout_secs: u64,
    max_attempts: u32,
    backoff_min: Duration,
    backoff_max: Duration,
    client: reqwest::Client,
}

impl OpenAiScorer {
    pub fn new(config: &OpenAiScorerConfig) -> Result<Self, ScorerError> {
        if config.api_key.trim().is_empty() {
            return Err(ScorerError::NotConfigured(
                "evaluation.openai.api_key is empty".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ScorerError::NotConfigured(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            timeout_secs: config.timeout_secs,
            max_attempts: config.max_attempts.max(1),
            backoff_min: Duration::from_millis(config.backoff_min_ms),
            backoff_max: Duration::from_millis(config.backoff_max_ms.max(config.backoff_min_ms)),
            client,
        })
    }

    // 第 attempt 次失败后的随机指数退避
    fn backoff(&self, attempt: u32, error: &ScorerError) -> Duration {
        if let ScorerError::RateLimited { retry_after_ms } = error {
            return Duration::from_millis(*retry_after_ms).min(self.backoff_max);
        }
        let ceiling = self
            .backoff_min
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(self.backoff_max);
        let floor = self.backoff_min.min(ceiling);
        let millis = rand::rng().random_range(floor.as_millis()..=ceiling.as_millis());
        Duration::from_millis(millis as u64)
    }

    async fn complete(&self, prompt: &str) -> Result<String, ScorerError> {
        let body = ChatRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
        };

        let response = self
            .client
            .post(format!("{}/v1/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ScorerError::Timeout(self.timeout_secs)
                } else {
                    ScorerError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();
        if status == 429 {
            let retry_after_ms = retry_after_ms(
                response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok()),
            );
            return Err(ScorerError::RateLimited { retry_after_ms });
        }
        if status >= 400 {
            let message = response.text().await.unwrap_or_default();
            return Err(ScorerError::Api { status, message });
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| ScorerError::Api {
            status: 0,
            message: format!("failed to parse response: {e}"),
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| ScorerError::InvalidOutput("response has no content".to_string()))
    }
}

// Retry-After 仅支持秒数形式，缺失或无法解析时按 5 秒处理
fn retry_after_ms(header: Option<&str>) -> u64 {
    header
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(5)
        .saturating_mul(1000)
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f64,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    #[serde(default)]
    content: String,
}

#[async_trait]
impl AutoScorer for OpenAiScorer {
    fn name(&self) -> &str {
        "openai"
    }

    #[instrument(skip(self, request), fields(model = %self.model, max_marks = request.max_marks))]
    async fn score(&self, request: &ScoreRequest) -> Result<ScoreOutcome, ScorerError> {
        let prompt = build_prompt(request);
        let mut attempt = 1;
        loop {
            match self.complete(&prompt).await {
                Ok(content) => return parse_evaluation_output(&content, request.max_marks),
                Err(e) if e.is_transient() && attempt < self.max_attempts => {
                    let delay = self.backoff(attempt, &e);
                    warn!(
                        "Scorer attempt {}/{} failed: {}, retrying in {:?}",
                        attempt, self.max_attempts, e, delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::exams::entities::QuestionType;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config(base_url: String) -> OpenAiScorerConfig {
        OpenAiScorerConfig {
            base_url,
            api_key: "test-key".to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.3,
            max_tokens: 400,
            timeout_secs: 5,
            max_attempts: 3,
            backoff_min_ms: 1,
            backoff_max_ms: 5,
        }
    }

    fn request() -> ScoreRequest {
        ScoreRequest {
            question_type: QuestionType::ShortAnswer,
            question_text: "What does the borrow checker enforce?".to_string(),
            answer_text: "Aliasing xor mutation.".to_string(),
            max_marks: 5.0,
            word_limit: Some(50),
        }
    }

    fn completion(content: &str) -> serde_json::Value {
        serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": content}, "index": 0}],
            "model": "gpt-4o-mini"
        })
    }

    #[tokio::test]
    async fn test_successful_scoring() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .and(header("Authorization", "Bearer test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion(
                "{\"marks_awarded\": 4, \"feedback\": \"Correct and concise.\"}",
            )))
            .mount(&server)
            .await;

        let scorer = OpenAiScorer::new(&config(server.uri())).unwrap();
        let outcome = scorer.score(&request()).await.unwrap();
        assert_eq!(outcome.marks_awarded, 4.0);
        assert_eq!(outcome.feedback, "Correct and concise.");
    }

    #[tokio::test]
    async fn test_retries_server_errors_then_gives_up() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .expect(3)
            .mount(&server)
            .await;

        let scorer = OpenAiScorer::new(&config(server.uri())).unwrap();
        let err = scorer.score(&request()).await.unwrap_err();
        assert!(matches!(err, ScorerError::Api { status: 503, .. }));
    }

    #[tokio::test]
    async fn test_client_errors_are_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .expect(1)
            .mount(&server)
            .await;

        let scorer = OpenAiScorer::new(&config(server.uri())).unwrap();
        let err = scorer.score(&request()).await.unwrap_err();
        assert!(matches!(err, ScorerError::Api { status: 401, .. }));
    }

    #[tokio::test]
    async fn test_out_of_range_marks_are_invalid_output() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(completion(
                "{\"marks_awarded\": 9, \"feedback\": \"Generous.\"}",
            )))
            .mount(&server)
            .await;

        let scorer = OpenAiScorer::new(&config(server.uri())).unwrap();
        assert!(matches!(
            scorer.score(&request()).await,
            Err(ScorerError::InvalidOutput(_))
        ));
    }

    #[test]
    fn test_missing_api_key_is_not_configured() {
        let mut cfg = config("http://localhost".to_string());
        cfg.api_key = String::new();
        assert!(matches!(
            OpenAiScorer::new(&cfg),
            Err(ScorerError::NotConfigured(_))
        ));
    }

    #[test]
    fn test_retry_after_header() {
        assert_eq!(retry_after_ms(Some("3")), 3000);
        assert_eq!(retry_after_ms(Some("soon")), 5000);
        assert_eq!(retry_after_ms(None), 5000);
        assert_eq!(retry_after_ms(Some(&u64::MAX.to_string())), u64::MAX);
    }
}
