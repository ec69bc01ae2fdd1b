use serde::Serialize;
use ts_rs::TS;

use crate::models::evaluations::entities::{Evaluation, EvaluationStatus, Evaluator};

/// 评分响应
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/evaluation.ts")]
pub struct EvaluationResponse {
    pub id: i64,
    pub response_id: i64,
    pub marks_awarded: f64,
    pub feedback: Option<String>,
    pub evaluator: Option<Evaluator>,
    pub status: EvaluationStatus,
    pub evaluated_at: Option<i64>,
}

impl From<Evaluation> for EvaluationResponse {
    fn from(e: Evaluation) -> Self {
        Self {
            id: e.id,
            response_id: e.response_id,
            marks_awarded: e.marks_awarded,
            feedback: e.feedback,
            evaluator: e.evaluator,
            status: e.status,
            evaluated_at: e.evaluated_at.map(|t| t.timestamp()),
        }
    }
}

/// 批量自动评分统计
#[derive(Debug, Clone, Default, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/evaluation.ts")]
pub struct BatchEvaluationSummary {
    pub evaluated: usize,
    pub locked: usize,
    pub unavailable: usize,
}
