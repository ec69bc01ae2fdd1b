use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::errors::{ExamSystemError, Result};
use crate::models::{
    evaluations::{
        entities::{Evaluation, EvaluationDraft, Evaluator},
        requests::{EvaluationMode, TriggerEvaluationRequest},
        responses::BatchEvaluationSummary,
    },
    exams::entities::Question,
    responses::entities::Response,
};
use crate::scoring::{AutoScorer, ScoreRequest};
use crate::storage::Storage;

/// 单条作答的评分
///
/// 评分来源的优先级在这里统一判断：人工评阅一旦写入即锁定，之后的自动
/// 评分触发一律以 `Locked` 拒绝；自动评分之间可以互相覆盖。
#[derive(Clone)]
pub struct ResponseEvaluator {
    storage: Arc<dyn Storage>,
    scorer: Arc<dyn AutoScorer>,
}

// 单选题答案比较：去掉首尾空白，忽略大小写
fn normalize_choice(text: &str) -> String {
    text.trim().to_lowercase()
}

impl ResponseEvaluator {
    pub fn new(storage: Arc<dyn Storage>, scorer: Arc<dyn AutoScorer>) -> Self {
        Self { storage, scorer }
    }

    /// 交卷时生成的初始评分：单选题直接判分，主观题待评阅
    pub fn initial_evaluation(
        question: &Question,
        answer_text: &str,
        at: DateTime<Utc>,
    ) -> EvaluationDraft {
        if question.question_type.is_objective() {
            Self::objective_evaluation(question, answer_text, at)
        } else {
            EvaluationDraft::pending()
        }
    }

    fn objective_evaluation(
        question: &Question,
        answer_text: &str,
        at: DateTime<Utc>,
    ) -> EvaluationDraft {
        let correct = question
            .correct_answer
            .as_deref()
            .is_some_and(|c| normalize_choice(c) == normalize_choice(answer_text));
        let marks = if correct { question.max_marks } else { 0.0 };
        EvaluationDraft::evaluated(Evaluator::Automatic, None, marks, None, at)
    }

    /// 新评分能否覆盖现有评分
    pub fn may_overwrite(existing: Option<Evaluator>, incoming: Evaluator) -> bool {
        existing.is_none_or(|current| incoming.priority() >= current.priority())
    }

    /// 触发单条作答的评分
    pub async fn trigger(
        &self,
        response_id: i64,
        request: TriggerEvaluationRequest,
        reviewer_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Evaluation> {
        let response = self
            .storage
            .get_response_by_id(response_id)
            .await?
            .ok_or_else(|| ExamSystemError::not_found(format!("作答 {response_id} 不存在")))?;
        let existing = self
            .storage
            .get_evaluation_by_response_id(response_id)
            .await?
            .ok_or_else(|| {
                ExamSystemError::state_conflict(format!("作答 {response_id} 所属会话尚未交卷"))
            })?;
        let question = self
            .storage
            .get_question_by_id(response.question_id)
            .await?
            .ok_or_else(|| {
                ExamSystemError::not_found(format!("题目 {} 不存在", response.question_id))
            })?;

        match request.mode {
            EvaluationMode::Manual => {
                let marks = request.marks_awarded.ok_or_else(|| {
                    ExamSystemError::validation("人工评阅必须提供 marks_awarded")
                })?;
                self.evaluate_manually(&question, &response, marks, request.feedback, reviewer_id, now)
                    .await
            }
            EvaluationMode::Automatic => {
                self.evaluate_automatically(&question, &response, &existing, now)
                    .await
            }
        }
    }

    /// 人工评阅，覆盖并锁定评分
    pub async fn evaluate_manually(
        &self,
        question: &Question,
        response: &Response,
        marks_awarded: f64,
        feedback: Option<String>,
        reviewer_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Evaluation> {
        if !marks_awarded.is_finite() || !(0.0..=question.max_marks).contains(&marks_awarded) {
            return Err(ExamSystemError::validation(format!(
                "分数 {marks_awarded} 超出范围 [0, {}]",
                question.max_marks
            )));
        }
        let feedback = feedback
            .map(|f| f.trim().to_string())
            .filter(|f| !f.is_empty());

        let draft = EvaluationDraft::evaluated(
            Evaluator::ManualReviewer,
            Some(reviewer_id),
            marks_awarded,
            feedback,
            now,
        );
        let evaluation = self
            .storage
            .write_manual_evaluation(response.id, draft)
            .await?;

        info!(
            "Response {} manually evaluated by reviewer {}: {} / {}",
            response.id, reviewer_id, marks_awarded, question.max_marks
        );
        Ok(evaluation)
    }

    /// 自动评分；已人工评阅时返回 `Locked`，评分服务失败时返回
    /// `EvaluationUnavailable` 且评分保持原状
    pub async fn evaluate_automatically(
        &self,
        question: &Question,
        response: &Response,
        existing: &Evaluation,
        now: DateTime<Utc>,
    ) -> Result<Evaluation> {
        let incoming = if question.question_type.is_objective() {
            Evaluator::Automatic
        } else {
            Evaluator::AiModel
        };
        if !Self::may_overwrite(existing.evaluator, incoming) {
            warn!(
                "Automatic evaluation of response {} rejected: manually evaluated",
                response.id
            );
            return Err(ExamSystemError::locked(format!(
                "作答 {} 已由人工评阅，不能自动重评",
                response.id
            )));
        }

        let draft = if question.question_type.is_objective() {
            Self::objective_evaluation(question, &response.answer_text, now)
        } else {
            let request = ScoreRequest::new(question, &response.answer_text);
            match self.scorer.score(&request).await {
                Ok(outcome) => EvaluationDraft::evaluated(
                    Evaluator::AiModel,
                    None,
                    outcome.marks_awarded,
                    Some(outcome.feedback),
                    now,
                ),
                Err(e) => {
                    warn!(
                        "Scorer '{}' failed for response {}: {}",
                        self.scorer.name(),
                        response.id,
                        e
                    );
                    if let Err(record_err) = self
                        .storage
                        .record_evaluation_failure(response.id, &e.to_string())
                        .await
                    {
                        warn!(
                            "Failed to record scorer failure for response {}: {}",
                            response.id, record_err
                        );
                    }
                    return Err(e.into());
                }
            }
        };

        // 评分期间可能有人工评阅写入，由条件更新兜底
        match self
            .storage
            .write_automatic_evaluation(response.id, draft)
            .await?
        {
            Some(evaluation) => {
                info!(
                    "Response {} evaluated by {}: {} / {}",
                    response.id, incoming, evaluation.marks_awarded, question.max_marks
                );
                Ok(evaluation)
            }
            None => Err(ExamSystemError::locked(format!(
                "作答 {} 已由人工评阅，不能自动重评",
                response.id
            ))),
        }
    }

    /// 对已交卷会话中所有待评阅作答做自动评分，单条失败不影响其他作答
    pub async fn evaluate_pending(
        &self,
        session_id: i64,
        now: DateTime<Utc>,
    ) -> Result<BatchEvaluationSummary> {
        let session = self
            .storage
            .get_session_by_id(session_id)
            .await?
            .ok_or_else(|| ExamSystemError::not_found(format!("会话 {session_id} 不存在")))?;
        if session.is_active() {
            return Err(ExamSystemError::state_conflict(format!(
                "会话 {session_id} 尚未交卷"
            )));
        }

        let questions = self.storage.list_exam_questions(session.exam_id).await?;
        let pending = self.storage.list_pending_responses(session_id).await?;
        let mut summary = BatchEvaluationSummary::default();

        for response in pending {
            let Some(question) = questions.iter().find(|q| q.id == response.question_id) else {
                continue;
            };
            let existing = match self.storage.get_evaluation_by_response_id(response.id).await {
                Ok(Some(existing)) => existing,
                Ok(None) => continue,
                Err(e) => {
                    warn!("Failed to load evaluation of response {}: {}", response.id, e);
                    summary.unavailable += 1;
                    continue;
                }
            };

            match self
                .evaluate_automatically(question, &response, &existing, now)
                .await
            {
                Ok(_) => summary.evaluated += 1,
                Err(ExamSystemError::Locked(_)) => summary.locked += 1,
                Err(e) => {
                    warn!("Response {} left pending: {}", response.id, e);
                    summary.unavailable += 1;
                }
            }
        }

        info!(
            "Session {} batch evaluation: {} evaluated, {} locked, {} unavailable",
            session_id, summary.evaluated, summary.locked, summary.unavailable
        );
        Ok(summary)
    }
}
