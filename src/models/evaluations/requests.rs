use serde::Deserialize;
use ts_rs::TS;

// 评分触发方式
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/evaluation.ts")]
pub enum EvaluationMode {
    Automatic,
    Manual,
}

/// 触发评分请求；manual 模式必须带 marks_awarded
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/evaluation.ts")]
pub struct TriggerEvaluationRequest {
    pub mode: EvaluationMode,
    pub marks_awarded: Option<f64>,
    pub feedback: Option<String>,
}
