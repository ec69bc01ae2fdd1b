use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use super::clock::SessionClock;
use super::gate::{GateOutcome, SubmissionGate};
use crate::errors::{ExamSystemError, Result};
use crate::models::{
    exams::responses::SanitizedQuestion,
    responses::requests::AnswerInput,
    sessions::{
        entities::ExamSession,
        responses::{RecordOutcome, SessionStatusResponse, StartSessionResponse},
    },
};
use crate::storage::Storage;

/// 作答生命周期：开始、保存、交卷
///
/// 每个操作都显式接收服务器当前时刻 `now`。
#[derive(Clone)]
pub struct SessionLifecycle {
    storage: Arc<dyn Storage>,
    gate: SubmissionGate,
}

impl SessionLifecycle {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self {
            gate: SubmissionGate::new(storage.clone()),
            storage,
        }
    }

    pub async fn load(&self, session_id: i64) -> Result<ExamSession> {
        self.storage
            .get_session_by_id(session_id)
            .await?
            .ok_or_else(|| ExamSystemError::not_found(format!("会话 {session_id} 不存在")))
    }

    /// 开始作答
    pub async fn start(
        &self,
        exam_id: i64,
        student_id: i64,
        now: DateTime<Utc>,
    ) -> Result<StartSessionResponse> {
        let exam = self
            .storage
            .get_exam_by_id(exam_id)
            .await?
            .ok_or_else(|| ExamSystemError::not_found(format!("考试 {exam_id} 不存在")))?;

        if !exam.is_open_at(now) {
            return Err(ExamSystemError::window_closed(format!(
                "考试 {exam_id} 当前不在开放时间内（{} 至 {}）",
                exam.scheduled_start,
                exam.window_end()
            )));
        }

        let clock = SessionClock::start(now, exam.duration());
        let session = self
            .storage
            .create_session(exam.id, student_id, clock.started_at(), clock.expires_at())
            .await?;
        let questions = self.storage.list_exam_questions(exam.id).await?;

        info!(
            "Session {} started: exam {}, student {}, expires at {}",
            session.id, exam.id, student_id, session.expires_at
        );

        Ok(StartSessionResponse {
            session_id: session.id,
            exam_id: exam.id,
            started_at: session.started_at.timestamp(),
            expires_at: session.expires_at.timestamp(),
            remaining_seconds: clock.remaining_seconds(now),
            questions: questions.iter().map(SanitizedQuestion::from).collect(),
        })
    }

    /// 会话状态
    pub fn status(session: &ExamSession, now: DateTime<Utc>) -> SessionStatusResponse {
        let clock = SessionClock::for_session(session);
        SessionStatusResponse {
            session_id: session.id,
            exam_id: session.exam_id,
            state: session.state,
            started_at: session.started_at.timestamp(),
            expires_at: session.expires_at.timestamp(),
            server_time: now.timestamp(),
            remaining_seconds: if session.is_active() {
                clock.remaining_seconds(now)
            } else {
                0
            },
            submitted_at: session.submitted_at.map(|t| t.timestamp()),
        }
    }

    /// 保存作答
    ///
    /// 会话已交卷时返回 `SessionClosed`；已到期但仍未交卷时改为强制交卷。
    pub async fn record(
        &self,
        session: &ExamSession,
        answers: Vec<AnswerInput>,
        now: DateTime<Utc>,
    ) -> Result<RecordOutcome> {
        if !session.is_active() {
            return Err(ExamSystemError::session_closed(format!(
                "会话 {} 已交卷",
                session.id
            )));
        }
        // 到期优先于校验：强制交卷时未知题目由最终答案集过滤
        let clock = SessionClock::for_session(session);
        if clock.is_expired(now) {
            return self.force_submit(session, answers, now).await;
        }
        self.validate_answers(session, &answers).await?;

        match self
            .storage
            .record_responses(session.id, answers.clone(), now)
            .await
        {
            Ok(saved_count) => Ok(RecordOutcome::Saved {
                saved_count,
                remaining_seconds: clock.remaining_seconds(now),
            }),
            Err(ExamSystemError::SessionClosed(msg)) => {
                // 校验之后会话可能已被交卷或刚好到期
                let current = self.load(session.id).await?;
                if current.is_active() && SessionClock::for_session(&current).is_expired(now) {
                    self.force_submit(&current, answers, now).await
                } else {
                    Err(ExamSystemError::SessionClosed(msg))
                }
            }
            Err(e) => Err(e),
        }
    }

    async fn force_submit(
        &self,
        session: &ExamSession,
        answers: Vec<AnswerInput>,
        now: DateTime<Utc>,
    ) -> Result<RecordOutcome> {
        warn!(
            "Save on session {} arrived after deadline, forcing submission",
            session.id
        );
        let outcome = self.gate.submit(session, answers, now).await?;
        Ok(RecordOutcome::AutoSubmitted {
            submission: outcome.receipt,
        })
    }

    // 保存作答时拒绝未知题目与重复题目
    async fn validate_answers(&self, session: &ExamSession, answers: &[AnswerInput]) -> Result<()> {
        let questions = self.storage.list_exam_questions(session.exam_id).await?;
        let known: HashSet<i64> = questions.iter().map(|q| q.id).collect();
        let mut seen = HashSet::new();
        for answer in answers {
            if !known.contains(&answer.question_id) {
                return Err(ExamSystemError::validation(format!(
                    "题目 {} 不属于本场考试",
                    answer.question_id
                )));
            }
            if !seen.insert(answer.question_id) {
                return Err(ExamSystemError::validation(format!(
                    "题目 {} 的答案重复出现",
                    answer.question_id
                )));
            }
        }
        Ok(())
    }

    /// 交卷（幂等）
    pub async fn submit(
        &self,
        session: &ExamSession,
        answers: Vec<AnswerInput>,
        now: DateTime<Utc>,
    ) -> Result<GateOutcome> {
        self.gate.submit(session, answers, now).await
    }

    /// 强制提交所有已到期的会话，返回本次完成提交的会话
    pub async fn sweep_expired(&self, now: DateTime<Utc>, limit: u64) -> Result<Vec<i64>> {
        let expired = self
            .storage
            .list_expired_active_sessions(now, limit)
            .await?;
        let mut submitted = Vec::new();
        for session in expired {
            match self.gate.submit(&session, Vec::new(), now).await {
                Ok(outcome) if outcome.committed => submitted.push(session.id),
                Ok(_) => {}
                Err(e) => warn!("Failed to auto-submit session {}: {}", session.id, e),
            }
        }
        Ok(submitted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::evaluations::entities::{EvaluationStatus, Evaluator};
    use crate::models::exams::entities::Question;
    use crate::models::sessions::entities::SessionState;
    use crate::test_support::{memory_storage, sample_exam};

    const EXAM_START: i64 = 1_700_000_000;

    fn at(offset_secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(EXAM_START + offset_secs, 0).unwrap()
    }

    fn answer(question_id: i64, text: &str) -> AnswerInput {
        AnswerInput {
            question_id,
            answer_text: text.to_string(),
        }
    }

    async fn setup() -> (SessionLifecycle, Arc<dyn Storage>, Vec<Question>, i64) {
        let storage: Arc<dyn Storage> = Arc::new(memory_storage().await);
        let (exam, questions) = storage.create_exam(sample_exam(EXAM_START)).await.unwrap();
        (SessionLifecycle::new(storage.clone()), storage, questions, exam.id)
    }

    async fn answers_of(storage: &Arc<dyn Storage>, session_id: i64) -> Vec<(i64, String)> {
        storage
            .list_session_responses(session_id)
            .await
            .unwrap()
            .into_iter()
            .map(|r| (r.question_id, r.answer_text))
            .collect()
    }

    #[tokio::test]
    async fn test_start_fixes_deadline_from_server_clock() {
        let (lifecycle, _, questions, exam_id) = setup().await;

        let started = lifecycle.start(exam_id, 42, at(100)).await.unwrap();
        assert_eq!(started.started_at, at(100).timestamp());
        assert_eq!(started.expires_at, at(100 + 30 * 60).timestamp());
        assert_eq!(started.remaining_seconds, 30 * 60);
        assert_eq!(started.questions.len(), questions.len());

        // 之后任何时刻读取，截止时间都不变
        let session = lifecycle.load(started.session_id).await.unwrap();
        let status = SessionLifecycle::status(&session, at(400));
        assert_eq!(status.expires_at, started.expires_at);
        assert_eq!(status.remaining_seconds, 30 * 60 - 300);
        assert_eq!(status.server_time, at(400).timestamp());
    }

    #[tokio::test]
    async fn test_start_outside_window_is_rejected() {
        let (lifecycle, _, _, exam_id) = setup().await;

        let early = lifecycle.start(exam_id, 42, at(-1)).await.unwrap_err();
        assert!(matches!(early, ExamSystemError::WindowClosed(_)));

        let late = lifecycle.start(exam_id, 42, at(30 * 60)).await.unwrap_err();
        assert!(matches!(late, ExamSystemError::WindowClosed(_)));

        let missing = lifecycle.start(9999, 42, at(100)).await.unwrap_err();
        assert!(matches!(missing, ExamSystemError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_second_start_is_already_active() {
        let (lifecycle, _, _, exam_id) = setup().await;
        lifecycle.start(exam_id, 42, at(100)).await.unwrap();

        let err = lifecycle.start(exam_id, 42, at(200)).await.unwrap_err();
        assert!(matches!(err, ExamSystemError::AlreadyActive(_)));

        // 其他学生不受影响
        assert!(lifecycle.start(exam_id, 43, at(200)).await.is_ok());
    }

    #[tokio::test]
    async fn test_start_after_submission_is_already_submitted() {
        let (lifecycle, _, _, exam_id) = setup().await;
        let started = lifecycle.start(exam_id, 42, at(100)).await.unwrap();
        let session = lifecycle.load(started.session_id).await.unwrap();
        lifecycle.submit(&session, Vec::new(), at(200)).await.unwrap();

        let err = lifecycle.start(exam_id, 42, at(300)).await.unwrap_err();
        assert!(matches!(err, ExamSystemError::AlreadySubmitted(_)));
        assert!(err.is_state_conflict());
    }

    #[tokio::test]
    async fn test_progressive_saves_overwrite_per_question() {
        let (lifecycle, storage, questions, exam_id) = setup().await;
        let started = lifecycle.start(exam_id, 42, at(100)).await.unwrap();
        let session = lifecycle.load(started.session_id).await.unwrap();

        let outcome = lifecycle
            .record(&session, vec![answer(questions[1].id, "draft")], at(200))
            .await
            .unwrap();
        assert_eq!(
            outcome,
            RecordOutcome::Saved {
                saved_count: 1,
                remaining_seconds: 30 * 60 - 100,
            }
        );
        lifecycle
            .record(
                &session,
                vec![answer(questions[0].id, "B"), answer(questions[1].id, "final")],
                at(300),
            )
            .await
            .unwrap();

        assert_eq!(
            answers_of(&storage, session.id).await,
            vec![
                (questions[0].id, "B".to_string()),
                (questions[1].id, "final".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_record_rejects_unknown_and_duplicate_questions() {
        let (lifecycle, storage, questions, exam_id) = setup().await;
        let started = lifecycle.start(exam_id, 42, at(100)).await.unwrap();
        let session = lifecycle.load(started.session_id).await.unwrap();

        let unknown = lifecycle
            .record(&session, vec![answer(9999, "x")], at(200))
            .await
            .unwrap_err();
        assert_eq!(unknown.code(), "E010");

        let duplicate = lifecycle
            .record(
                &session,
                vec![answer(questions[1].id, "a"), answer(questions[1].id, "b")],
                at(200),
            )
            .await
            .unwrap_err();
        assert_eq!(duplicate.code(), "E010");
        assert!(answers_of(&storage, session.id).await.is_empty());
    }

    #[tokio::test]
    async fn test_submit_is_idempotent() {
        let (lifecycle, storage, questions, exam_id) = setup().await;
        let started = lifecycle.start(exam_id, 42, at(100)).await.unwrap();
        let session = lifecycle.load(started.session_id).await.unwrap();

        lifecycle
            .record(&session, vec![answer(questions[1].id, "saved earlier")], at(200))
            .await
            .unwrap();
        let first = lifecycle
            .submit(&session, vec![answer(questions[0].id, "A")], at(600))
            .await
            .unwrap();
        assert!(first.committed);
        assert_eq!(first.receipt.status, SessionState::Submitted);
        assert_eq!(first.receipt.submitted_at, at(600).timestamp());
        assert!(!first.receipt.auto_submitted);
        let persisted = answers_of(&storage, session.id).await;

        // 重试与不同答案的重复交卷都返回第一次的结果
        let retry = lifecycle
            .submit(&session, vec![answer(questions[0].id, "B")], at(700))
            .await
            .unwrap();
        assert!(!retry.committed);
        assert_eq!(retry.receipt, first.receipt);

        let reloaded = lifecycle.load(session.id).await.unwrap();
        let again = lifecycle.submit(&reloaded, Vec::new(), at(800)).await.unwrap();
        assert_eq!(again.receipt, first.receipt);

        assert_eq!(answers_of(&storage, session.id).await, persisted);
        assert_eq!(
            persisted,
            vec![
                (questions[0].id, "A".to_string()),
                (questions[1].id, "saved earlier".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_record_after_submit_is_rejected() {
        let (lifecycle, storage, questions, exam_id) = setup().await;
        let started = lifecycle.start(exam_id, 42, at(100)).await.unwrap();
        let stale = lifecycle.load(started.session_id).await.unwrap();

        lifecycle
            .submit(&stale, vec![answer(questions[1].id, "final")], at(300))
            .await
            .unwrap();
        let before = answers_of(&storage, stale.id).await;

        // 旧快照仍显示 Active，由存储层的条件更新拦截
        let err = lifecycle
            .record(&stale, vec![answer(questions[1].id, "too late")], at(400))
            .await
            .unwrap_err();
        assert!(matches!(err, ExamSystemError::SessionClosed(_)));

        let current = lifecycle.load(stale.id).await.unwrap();
        let err = lifecycle
            .record(&current, vec![answer(questions[1].id, "too late")], at(400))
            .await
            .unwrap_err();
        assert!(matches!(err, ExamSystemError::SessionClosed(_)));

        assert_eq!(answers_of(&storage, stale.id).await, before);
    }

    #[tokio::test]
    async fn test_mcq_is_scored_at_submission() {
        let (lifecycle, storage, questions, exam_id) = setup().await;
        let started = lifecycle.start(exam_id, 42, at(100)).await.unwrap();
        let session = lifecycle.load(started.session_id).await.unwrap();

        lifecycle
            .submit(
                &session,
                vec![answer(questions[0].id, " a "), answer(questions[2].id, "essay")],
                at(300),
            )
            .await
            .unwrap();

        let responses = storage.list_session_responses(session.id).await.unwrap();
        let mcq = responses
            .iter()
            .find(|r| r.question_id == questions[0].id)
            .unwrap();
        let mcq_eval = storage
            .get_evaluation_by_response_id(mcq.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(mcq_eval.status, EvaluationStatus::Evaluated);
        assert_eq!(mcq_eval.marks_awarded, 5.0);
        assert_eq!(mcq_eval.evaluator, Some(Evaluator::Automatic));

        let essay = responses
            .iter()
            .find(|r| r.question_id == questions[2].id)
            .unwrap();
        let essay_eval = storage
            .get_evaluation_by_response_id(essay.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(essay_eval.status, EvaluationStatus::Pending);
        assert_eq!(essay_eval.evaluator, None);
    }

    #[tokio::test]
    async fn test_concurrent_submits_flip_exactly_once() {
        let (lifecycle, storage, questions, exam_id) = setup().await;
        let started = lifecycle.start(exam_id, 42, at(100)).await.unwrap();
        let session = lifecycle.load(started.session_id).await.unwrap();

        // 手动交卷与到期自动交卷同时到达
        let (manual, expiry) = tokio::join!(
            lifecycle.submit(&session, vec![answer(questions[1].id, "manual")], at(1799)),
            lifecycle.submit(&session, vec![answer(questions[1].id, "expiry")], at(1900)),
        );
        let manual = manual.unwrap();
        let expiry = expiry.unwrap();

        assert_eq!(
            [manual.committed, expiry.committed]
                .iter()
                .filter(|c| **c)
                .count(),
            1
        );
        assert_eq!(manual.receipt, expiry.receipt);

        let persisted = answers_of(&storage, session.id).await;
        assert_eq!(persisted.len(), 1);
        let winner_text = if manual.committed { "manual" } else { "expiry" };
        assert_eq!(persisted[0].1, winner_text);
        assert_eq!(
            storage.list_session_evaluations(session.id).await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn test_record_after_deadline_forces_submission() {
        let (lifecycle, storage, questions, exam_id) = setup().await;
        let started = lifecycle.start(exam_id, 42, at(100)).await.unwrap();
        let session = lifecycle.load(started.session_id).await.unwrap();
        lifecycle
            .record(&session, vec![answer(questions[1].id, "early")], at(200))
            .await
            .unwrap();

        let outcome = lifecycle
            .record(&session, vec![answer(questions[2].id, "last words")], at(100 + 31 * 60))
            .await
            .unwrap();
        let RecordOutcome::AutoSubmitted { submission } = outcome else {
            panic!("expected forced submission, got {outcome:?}");
        };
        assert!(submission.auto_submitted);
        assert_eq!(submission.submitted_at, started.expires_at);

        assert_eq!(
            answers_of(&storage, session.id).await,
            vec![
                (questions[1].id, "early".to_string()),
                (questions[2].id, "last words".to_string()),
            ]
        );
        assert!(!lifecycle.load(session.id).await.unwrap().is_active());
    }

    #[tokio::test]
    async fn test_late_save_with_unknown_question_still_forces_submission() {
        let (lifecycle, storage, questions, exam_id) = setup().await;
        let started = lifecycle.start(exam_id, 42, at(100)).await.unwrap();
        let session = lifecycle.load(started.session_id).await.unwrap();

        let outcome = lifecycle
            .record(
                &session,
                vec![
                    answer(questions[0].id, "B"),
                    answer(999_999, "not part of this exam"),
                ],
                at(100 + 31 * 60),
            )
            .await
            .unwrap();
        let RecordOutcome::AutoSubmitted { submission } = outcome else {
            panic!("expected forced submission, got {outcome:?}");
        };
        assert!(submission.auto_submitted);
        assert_eq!(
            answers_of(&storage, session.id).await,
            vec![(questions[0].id, "B".to_string())]
        );
        assert!(!lifecycle.load(session.id).await.unwrap().is_active());
    }

    #[tokio::test]
    async fn test_sweep_submits_expired_sessions_once() {
        let (lifecycle, _, _, exam_id) = setup().await;
        let expired = lifecycle.start(exam_id, 1, at(10)).await.unwrap();
        let fresh = lifecycle.start(exam_id, 2, at(1000)).await.unwrap();

        let now = at(10 + 30 * 60 + 5);
        let swept = lifecycle.sweep_expired(now, 50).await.unwrap();
        assert_eq!(swept, vec![expired.session_id]);
        assert!(lifecycle.sweep_expired(now, 50).await.unwrap().is_empty());

        let session = lifecycle.load(expired.session_id).await.unwrap();
        assert!(session.auto_submitted);
        assert_eq!(
            session.submitted_at.map(|t| t.timestamp()),
            Some(expired.expires_at)
        );
        assert!(lifecycle.load(fresh.session_id).await.unwrap().is_active());
    }
}
