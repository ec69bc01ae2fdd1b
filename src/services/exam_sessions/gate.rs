use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use super::clock::SessionClock;
use crate::errors::{ExamSystemError, Result};
use crate::models::{
    exams::entities::Question,
    responses::requests::AnswerInput,
    sessions::{entities::ExamSession, responses::SubmitReceipt},
};
use crate::services::evaluations::ResponseEvaluator;
use crate::storage::{Storage, SubmissionCommit};

/// 交卷结果；`committed` 为真表示本次调用完成了状态切换
#[derive(Debug, Clone, PartialEq)]
pub struct GateOutcome {
    pub receipt: SubmitReceipt,
    pub committed: bool,
}

/// 保证 Active -> Submitted 只发生一次
///
/// 并发或重复的交卷调用中只有一个能完成状态切换并写入最终答案，其余调用
/// 直接返回已提交的回执。
#[derive(Clone)]
pub struct SubmissionGate {
    storage: Arc<dyn Storage>,
}

/// 最终答案：丢弃不属于本场考试的题目，同题多次出现时以最后一次为准
pub fn final_answer_set(questions: &[Question], answers: Vec<AnswerInput>) -> Vec<AnswerInput> {
    let mut merged = BTreeMap::new();
    for answer in answers {
        if questions.iter().any(|q| q.id == answer.question_id) {
            merged.insert(answer.question_id, answer.answer_text);
        }
    }
    merged
        .into_iter()
        .map(|(question_id, answer_text)| AnswerInput {
            question_id,
            answer_text,
        })
        .collect()
}

impl SubmissionGate {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    pub async fn submit(
        &self,
        session: &ExamSession,
        answers: Vec<AnswerInput>,
        now: DateTime<Utc>,
    ) -> Result<GateOutcome> {
        if !session.is_active() {
            return self.committed_receipt(session.id).await;
        }

        let clock = SessionClock::for_session(session);
        let auto_submitted = clock.is_expired(now);
        let questions = self.storage.list_exam_questions(session.exam_id).await?;
        let commit = SubmissionCommit {
            submitted_at: clock.effective_submitted_at(now),
            auto_submitted,
            answers: final_answer_set(&questions, answers),
            questions,
            grader: ResponseEvaluator::initial_evaluation,
        };

        match self.storage.commit_submission(session.id, commit).await? {
            Some(submitted) => {
                if auto_submitted {
                    info!(
                        "Session {} auto-submitted at deadline {}",
                        submitted.id, submitted.expires_at
                    );
                } else {
                    info!("Session {} submitted", submitted.id);
                }
                let receipt = SubmitReceipt::from_session(&submitted).ok_or_else(|| {
                    ExamSystemError::state_conflict(format!(
                        "会话 {} 提交后状态异常",
                        submitted.id
                    ))
                })?;
                Ok(GateOutcome {
                    receipt,
                    committed: true,
                })
            }
            None => {
                debug!("Session {} lost the submission race", session.id);
                self.committed_receipt(session.id).await
            }
        }
    }

    // 已提交会话的回执
    async fn committed_receipt(&self, session_id: i64) -> Result<GateOutcome> {
        let session = self
            .storage
            .get_session_by_id(session_id)
            .await?
            .ok_or_else(|| ExamSystemError::not_found(format!("会话 {session_id} 不存在")))?;
        let receipt = SubmitReceipt::from_session(&session).ok_or_else(|| {
            ExamSystemError::state_conflict(format!("会话 {session_id} 尚未提交"))
        })?;
        Ok(GateOutcome {
            receipt,
            committed: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::exams::entities::QuestionType;

    fn question(id: i64) -> Question {
        Question {
            id,
            exam_id: 1,
            position: id as i32,
            question_type: QuestionType::ShortAnswer,
            text: format!("Q{id}"),
            options: None,
            correct_answer: None,
            max_marks: 5.0,
            word_limit: None,
        }
    }

    fn answer(question_id: i64, text: &str) -> AnswerInput {
        AnswerInput {
            question_id,
            answer_text: text.to_string(),
        }
    }

    #[test]
    fn test_final_answer_set_drops_unknown_and_keeps_last() {
        let questions = vec![question(1), question(2)];
        let merged = final_answer_set(
            &questions,
            vec![answer(2, "first"), answer(99, "stray"), answer(2, "second"), answer(1, "a")],
        );
        assert_eq!(merged, vec![answer(1, "a"), answer(2, "second")]);
    }
}
