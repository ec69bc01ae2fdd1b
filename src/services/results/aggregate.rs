use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::{ExamSystemError, Result};
use crate::models::{
    evaluations::entities::Evaluation,
    exams::entities::Question,
    responses::entities::Response,
    results::responses::{AggregateResult, QuestionResult, QuestionResultStatus, ResultStatus},
    sessions::entities::ExamSession,
};
use crate::storage::Storage;

/// 从作答与评分计算汇总成绩
///
/// 纯函数：只依赖传入的数据，按题目顺序累加，相同输入总是得到相同结果。
/// 待评阅作答不计入得分，但其题目分值计入总分；仍在作答中的会话一律为
/// `PendingEvaluation`。
pub fn aggregate(
    session: &ExamSession,
    questions: &[Question],
    responses: &[Response],
    evaluations: &[Evaluation],
) -> AggregateResult {
    let mut ordered: Vec<&Question> = questions.iter().collect();
    ordered.sort_by_key(|q| (q.position, q.id));

    let responses_by_question: HashMap<i64, &Response> =
        responses.iter().map(|r| (r.question_id, r)).collect();
    let evaluations_by_response: HashMap<i64, &Evaluation> =
        evaluations.iter().map(|e| (e.response_id, e)).collect();

    let mut total_marks_awarded = 0.0;
    let mut total_marks_possible = 0.0;
    let mut evaluated_count = 0;
    let mut pending_count = 0;
    let mut breakdown = Vec::with_capacity(ordered.len());

    for question in ordered {
        total_marks_possible += question.max_marks;

        let Some(response) = responses_by_question.get(&question.id) else {
            breakdown.push(QuestionResult {
                question_id: question.id,
                max_marks: question.max_marks,
                marks_awarded: None,
                status: QuestionResultStatus::NotAnswered,
                evaluator: None,
                feedback: None,
            });
            continue;
        };

        match evaluations_by_response
            .get(&response.id)
            .filter(|e| e.is_evaluated())
        {
            Some(evaluation) => {
                evaluated_count += 1;
                total_marks_awarded += evaluation.marks_awarded;
                breakdown.push(QuestionResult {
                    question_id: question.id,
                    max_marks: question.max_marks,
                    marks_awarded: Some(evaluation.marks_awarded),
                    status: QuestionResultStatus::Evaluated,
                    evaluator: evaluation.evaluator,
                    feedback: evaluation.feedback.clone(),
                });
            }
            None => {
                pending_count += 1;
                breakdown.push(QuestionResult {
                    question_id: question.id,
                    max_marks: question.max_marks,
                    marks_awarded: None,
                    status: QuestionResultStatus::Pending,
                    evaluator: None,
                    feedback: None,
                });
            }
        }
    }

    let status = if session.is_active() || pending_count > 0 {
        ResultStatus::PendingEvaluation
    } else {
        ResultStatus::ResultsDeclared
    };

    AggregateResult {
        session_id: session.id,
        total_marks_awarded,
        total_marks_possible,
        status,
        evaluated_count,
        pending_count,
        questions: breakdown,
    }
}

/// 按需读取存储并计算汇总成绩，不写回任何数据
#[derive(Clone)]
pub struct ScoreAggregator {
    storage: Arc<dyn Storage>,
}

impl ScoreAggregator {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    pub async fn get_result(&self, session_id: i64) -> Result<AggregateResult> {
        let session = self
            .storage
            .get_session_by_id(session_id)
            .await?
            .ok_or_else(|| ExamSystemError::not_found(format!("会话 {session_id} 不存在")))?;
        self.result_for(&session).await
    }

    pub async fn result_for(&self, session: &ExamSession) -> Result<AggregateResult> {
        let questions = self.storage.list_exam_questions(session.exam_id).await?;
        let responses = self.storage.list_session_responses(session.id).await?;
        let evaluations = self.storage.list_session_evaluations(session.id).await?;
        Ok(aggregate(session, &questions, &responses, &evaluations))
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};

    use super::*;
    use crate::models::evaluations::entities::{EvaluationStatus, Evaluator};
    use crate::models::exams::entities::QuestionType;
    use crate::models::sessions::entities::SessionState;

    fn session(state: SessionState) -> ExamSession {
        let now = Utc::now();
        ExamSession {
            id: 1,
            exam_id: 1,
            student_id: 42,
            started_at: now,
            expires_at: now + Duration::minutes(30),
            state,
            submitted_at: (state == SessionState::Submitted).then_some(now),
            auto_submitted: false,
            last_saved_at: None,
        }
    }

    fn question(id: i64, max_marks: f64) -> Question {
        Question {
            id,
            exam_id: 1,
            position: id as i32,
            question_type: QuestionType::LongAnswer,
            text: format!("Q{id}"),
            options: None,
            correct_answer: None,
            max_marks,
            word_limit: None,
        }
    }

    fn response(id: i64, question_id: i64) -> Response {
        Response {
            id,
            session_id: 1,
            question_id,
            answer_text: "answer".to_string(),
            last_saved_at: Utc::now(),
        }
    }

    fn evaluated(response_id: i64, marks: f64) -> Evaluation {
        Evaluation {
            id: response_id,
            response_id,
            marks_awarded: marks,
            feedback: None,
            evaluator: Some(Evaluator::ManualReviewer),
            evaluator_id: Some(3),
            status: EvaluationStatus::Evaluated,
            evaluated_at: Some(Utc::now()),
            last_error: None,
        }
    }

    fn pending(response_id: i64) -> Evaluation {
        Evaluation {
            id: response_id,
            response_id,
            marks_awarded: 0.0,
            feedback: None,
            evaluator: None,
            evaluator_id: None,
            status: EvaluationStatus::Pending,
            evaluated_at: None,
            last_error: None,
        }
    }

    #[test]
    fn test_pending_then_declared() {
        let session = session(SessionState::Submitted);
        let questions = vec![question(1, 5.0), question(2, 5.0), question(3, 10.0)];
        let responses = vec![response(11, 1), response(12, 2), response(13, 3)];

        let partial = aggregate(
            &session,
            &questions,
            &responses,
            &[evaluated(11, 3.0), evaluated(12, 5.0), pending(13)],
        );
        assert_eq!(partial.total_marks_awarded, 8.0);
        assert_eq!(partial.total_marks_possible, 20.0);
        assert_eq!(partial.status, ResultStatus::PendingEvaluation);
        assert_eq!(partial.evaluated_count, 2);
        assert_eq!(partial.pending_count, 1);

        let complete = aggregate(
            &session,
            &questions,
            &responses,
            &[evaluated(11, 3.0), evaluated(12, 5.0), evaluated(13, 6.0)],
        );
        assert_eq!(complete.total_marks_awarded, 14.0);
        assert_eq!(complete.total_marks_possible, 20.0);
        assert_eq!(complete.status, ResultStatus::ResultsDeclared);
    }

    #[test]
    fn test_recompute_is_identical_regardless_of_input_order() {
        let session = session(SessionState::Submitted);
        let questions = vec![question(1, 5.0), question(2, 5.0), question(3, 10.0)];
        let responses = vec![response(11, 1), response(12, 2), response(13, 3)];
        let evaluations = vec![evaluated(11, 3.0), evaluated(12, 5.0), pending(13)];

        let first = aggregate(&session, &questions, &responses, &evaluations);
        let second = aggregate(&session, &questions, &responses, &evaluations);
        assert_eq!(first, second);

        let mut shuffled_questions = questions.clone();
        shuffled_questions.reverse();
        let mut shuffled_evaluations = evaluations.clone();
        shuffled_evaluations.rotate_left(1);
        let reordered = aggregate(
            &session,
            &shuffled_questions,
            &responses,
            &shuffled_evaluations,
        );
        assert_eq!(first, reordered);
    }

    #[test]
    fn test_unanswered_question_counts_toward_possible_only() {
        let session = session(SessionState::Submitted);
        let questions = vec![question(1, 5.0), question(2, 5.0)];
        let result = aggregate(
            &session,
            &questions,
            &[response(11, 1)],
            &[evaluated(11, 4.0)],
        );
        assert_eq!(result.total_marks_awarded, 4.0);
        assert_eq!(result.total_marks_possible, 10.0);
        assert_eq!(result.status, ResultStatus::ResultsDeclared);
        assert_eq!(result.questions[1].status, QuestionResultStatus::NotAnswered);
        assert_eq!(result.questions[1].marks_awarded, None);
    }

    #[test]
    fn test_active_session_is_never_declared() {
        let session = session(SessionState::Active);
        let questions = vec![question(1, 5.0)];
        let result = aggregate(&session, &questions, &[], &[]);
        assert_eq!(result.status, ResultStatus::PendingEvaluation);
        assert_eq!(result.total_marks_awarded, 0.0);
    }
}
