use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

// 会话状态：Active -> Submitted（终态，不可重新打开）
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, TS)]
#[serde(rename_all = "snake_case")]
#[ts(export, export_to = "../frontend/src/types/generated/session.ts")]
pub enum SessionState {
    Active,
    Submitted,
}

impl SessionState {
    pub const ACTIVE: &'static str = "active";
    pub const SUBMITTED: &'static str = "submitted";
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Active => write!(f, "{}", SessionState::ACTIVE),
            SessionState::Submitted => write!(f, "{}", SessionState::SUBMITTED),
        }
    }
}

impl std::str::FromStr for SessionState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            SessionState::ACTIVE => Ok(SessionState::Active),
            SessionState::SUBMITTED => Ok(SessionState::Submitted),
            _ => Err(format!("Invalid session state: {s}")),
        }
    }
}

/// 一次作答（某学生对某场考试的限时作答）
#[derive(Debug, Clone, PartialEq)]
pub struct ExamSession {
    pub id: i64,
    pub exam_id: i64,
    pub student_id: i64,
    pub started_at: DateTime<Utc>,
    // 创建时由服务器时钟确定，之后不再变化
    pub expires_at: DateTime<Utc>,
    pub state: SessionState,
    pub submitted_at: Option<DateTime<Utc>>,
    // 是否由到期触发的强制提交
    pub auto_submitted: bool,
    pub last_saved_at: Option<DateTime<Utc>>,
}

impl ExamSession {
    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }
}
