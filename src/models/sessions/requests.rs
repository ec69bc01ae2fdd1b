use serde::Deserialize;
use ts_rs::TS;

use crate::models::responses::requests::AnswerInput;

/// 保存作答（可多次、部分保存）
#[derive(Debug, Clone, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/session.ts")]
pub struct RecordResponsesRequest {
    pub answers: Vec<AnswerInput>,
}

/// 交卷，answers 会覆盖此前保存的同题答案
#[derive(Debug, Clone, Default, Deserialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/session.ts")]
pub struct SubmitSessionRequest {
    #[serde(default)]
    pub answers: Vec<AnswerInput>,
}
