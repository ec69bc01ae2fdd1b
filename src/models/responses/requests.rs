use serde::Deserialize;
use ts_rs::TS;

/// 单题答案
#[derive(Debug, Clone, PartialEq, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/session.ts")]
pub struct AnswerInput {
    pub question_id: i64,
    #[serde(default)]
    pub answer_text: String,
}
