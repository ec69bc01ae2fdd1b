pub mod auth;
pub mod common;
pub mod evaluations;
pub mod exams;
pub mod responses;
pub mod results;
pub mod sessions;

pub use common::response::ApiResponse;

/// 业务错误码，随 `ApiResponse.code` 返回给客户端
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ErrorCode {
    Success = 0,

    // 通用错误
    BadRequest = 1000,
    ValidationFailed = 1001,
    Unauthorized = 1002,
    Forbidden = 1003,
    NotFound = 1004,
    InternalServerError = 1005,

    // 会话生命周期
    SessionAlreadyActive = 2000,
    SessionAlreadySubmitted = 2001,
    ExamWindowClosed = 2002,
    SessionClosed = 2003,
    StateConflict = 2004,

    // 评分
    EvaluationUnavailable = 3000,
    EvaluationLocked = 3001,
}

/// 服务启动时间
#[derive(Debug, Clone)]
pub struct AppStartTime {
    pub start_datetime: chrono::DateTime<chrono::Utc>,
}
