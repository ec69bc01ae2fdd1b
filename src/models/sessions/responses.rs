use serde::Serialize;
use ts_rs::TS;

use crate::models::exams::responses::SanitizedQuestion;
use crate::models::sessions::entities::{ExamSession, SessionState};

// 所有时间均为 epoch 秒

/// 开始作答响应
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/session.ts")]
pub struct StartSessionResponse {
    pub session_id: i64,
    pub exam_id: i64,
    pub started_at: i64,
    pub expires_at: i64,
    pub remaining_seconds: i64,
    pub questions: Vec<SanitizedQuestion>,
}

/// 会话状态（客户端倒计时据此校准）
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/session.ts")]
pub struct SessionStatusResponse {
    pub session_id: i64,
    pub exam_id: i64,
    pub state: SessionState,
    pub started_at: i64,
    pub expires_at: i64,
    pub server_time: i64,
    pub remaining_seconds: i64,
    pub submitted_at: Option<i64>,
}

/// 交卷回执；对同一会话重复交卷返回完全相同的回执
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[ts(export, export_to = "../frontend/src/types/generated/session.ts")]
pub struct SubmitReceipt {
    pub session_id: i64,
    pub status: SessionState,
    pub submitted_at: i64,
    pub auto_submitted: bool,
}

impl SubmitReceipt {
    /// 从已提交的会话构造回执
    pub fn from_session(session: &ExamSession) -> Option<Self> {
        match (session.state, session.submitted_at) {
            (SessionState::Submitted, Some(submitted_at)) => Some(Self {
                session_id: session.id,
                status: SessionState::Submitted,
                submitted_at: submitted_at.timestamp(),
                auto_submitted: session.auto_submitted,
            }),
            _ => None,
        }
    }
}

/// 保存作答的结果：正常保存，或因已到期而被强制交卷
#[derive(Debug, Clone, PartialEq, Serialize, TS)]
#[serde(tag = "outcome", rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/session.ts")]
pub enum RecordOutcome {
    Saved {
        saved_count: usize,
        remaining_seconds: i64,
    },
    AutoSubmitted {
        submission: SubmitReceipt,
    },
}
