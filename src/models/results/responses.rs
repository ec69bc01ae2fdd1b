use serde::Serialize;
use ts_rs::TS;

use crate::models::evaluations::entities::Evaluator;

// 成绩总体状态
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/result.ts")]
pub enum ResultStatus {
    PendingEvaluation,
    ResultsDeclared,
}

// 单题评阅状态
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/result.ts")]
pub enum QuestionResultStatus {
    Evaluated,
    Pending,
    NotAnswered,
}

/// 单题成绩
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/result.ts")]
pub struct QuestionResult {
    pub question_id: i64,
    pub max_marks: f64,
    pub marks_awarded: Option<f64>,
    pub status: QuestionResultStatus,
    pub evaluator: Option<Evaluator>,
    pub feedback: Option<String>,
}

/// 汇总成绩，每次请求时从作答与评分重新计算，不单独持久化
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/result.ts")]
pub struct AggregateResult {
    pub session_id: i64,
    pub total_marks_awarded: f64,
    pub total_marks_possible: f64,
    pub status: ResultStatus,
    pub evaluated_count: usize,
    pub pending_count: usize,
    pub questions: Vec<QuestionResult>,
}
