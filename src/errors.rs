//! 统一错误处理模块
//!
//! 使用宏自动生成错误类型，支持错误代码、类型名称以及是否可重试。

use std::fmt;

use actix_web::{HttpResponse, http::StatusCode};

use crate::models::{ApiResponse, ErrorCode};

/// 定义错误类型的宏
///
/// 自动生成：
/// - enum 定义
/// - code() 方法 - 返回错误代码
/// - error_type() 方法 - 返回错误类型名称
/// - message() 方法 - 返回错误详情
/// - is_retriable() 方法 - 调用方能否安全重试
/// - 便捷构造函数
macro_rules! define_exam_system_errors {
    ($(
        $variant:ident($code:literal, $type_name:literal, $retriable:literal)
    ),* $(,)?) => {
        #[derive(Debug, Clone, PartialEq)]
        pub enum ExamSystemError {
            $($variant(String),)*
        }

        impl ExamSystemError {
            /// 获取错误代码
            pub fn code(&self) -> &'static str {
                match self {
                    $(ExamSystemError::$variant(_) => $code,)*
                }
            }

            /// 获取错误类型名称
            pub fn error_type(&self) -> &'static str {
                match self {
                    $(ExamSystemError::$variant(_) => $type_name,)*
                }
            }

            /// 获取错误详情
            pub fn message(&self) -> &str {
                match self {
                    $(ExamSystemError::$variant(msg) => msg,)*
                }
            }

            /// 调用方重试是否安全
            pub fn is_retriable(&self) -> bool {
                match self {
                    $(ExamSystemError::$variant(_) => $retriable,)*
                }
            }
        }

        // 生成便捷构造函数
        paste::paste! {
            impl ExamSystemError {
                $(
                    pub fn [<$variant:snake>]<T: Into<String>>(msg: T) -> Self {
                        ExamSystemError::$variant(msg.into())
                    }
                )*
            }
        }
    };
}

define_exam_system_errors! {
    DatabaseConfig("E001", "Database Configuration Error", false),
    DatabaseConnection("E002", "Database Connection Error", true),
    DatabaseOperation("E003", "Database Operation Error", true),
    Serialization("E004", "Serialization Error", true),
    DateParse("E005", "Date Parse Error", true),
    Authentication("E006", "Authentication Error", false),
    Authorization("E007", "Authorization Error", false),
    Validation("E010", "Validation Error", false),
    NotFound("E011", "Resource Not Found", false),
    AlreadyActive("E020", "Session Already Active", true),
    AlreadySubmitted("E021", "Session Already Submitted", true),
    WindowClosed("E022", "Exam Window Closed", true),
    SessionClosed("E023", "Session Closed", true),
    StateConflict("E024", "State Conflict", true),
    EvaluationUnavailable("E030", "Evaluation Unavailable", true),
    Locked("E031", "Evaluation Locked", true),
}

impl ExamSystemError {
    /// 格式化为彩色输出（用于开发环境）
    #[cfg(debug_assertions)]
    pub fn format_colored(&self) -> String {
        format!(
            "\x1b[1;31m[ERROR]\x1b[0m \x1b[33m{}\x1b[0m \x1b[31m{}\x1b[0m\n  {}",
            self.code(),
            self.error_type(),
            self.message()
        )
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }

    /// 是否属于状态冲突类错误（会话/评分状态不允许该操作）
    pub fn is_state_conflict(&self) -> bool {
        matches!(
            self,
            ExamSystemError::AlreadyActive(_)
                | ExamSystemError::AlreadySubmitted(_)
                | ExamSystemError::WindowClosed(_)
                | ExamSystemError::SessionClosed(_)
                | ExamSystemError::StateConflict(_)
        )
    }
}

// HTTP 映射
impl ExamSystemError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ExamSystemError::Validation(_) => StatusCode::BAD_REQUEST,
            ExamSystemError::Authentication(_) => StatusCode::UNAUTHORIZED,
            ExamSystemError::Authorization(_) => StatusCode::FORBIDDEN,
            ExamSystemError::NotFound(_) => StatusCode::NOT_FOUND,
            ExamSystemError::AlreadyActive(_)
            | ExamSystemError::AlreadySubmitted(_)
            | ExamSystemError::WindowClosed(_)
            | ExamSystemError::SessionClosed(_)
            | ExamSystemError::StateConflict(_)
            | ExamSystemError::Locked(_) => StatusCode::CONFLICT,
            ExamSystemError::EvaluationUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn api_error_code(&self) -> ErrorCode {
        match self {
            ExamSystemError::Validation(_) => ErrorCode::ValidationFailed,
            ExamSystemError::Authentication(_) => ErrorCode::Unauthorized,
            ExamSystemError::Authorization(_) => ErrorCode::Forbidden,
            ExamSystemError::NotFound(_) => ErrorCode::NotFound,
            ExamSystemError::AlreadyActive(_) => ErrorCode::SessionAlreadyActive,
            ExamSystemError::AlreadySubmitted(_) => ErrorCode::SessionAlreadySubmitted,
            ExamSystemError::WindowClosed(_) => ErrorCode::ExamWindowClosed,
            ExamSystemError::SessionClosed(_) => ErrorCode::SessionClosed,
            ExamSystemError::StateConflict(_) => ErrorCode::StateConflict,
            ExamSystemError::EvaluationUnavailable(_) => ErrorCode::EvaluationUnavailable,
            ExamSystemError::Locked(_) => ErrorCode::EvaluationLocked,
            _ => ErrorCode::InternalServerError,
        }
    }

    /// 转换为统一的错误响应
    pub fn to_http_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .json(ApiResponse::error_empty(self.api_error_code(), self.message()))
    }
}

impl fmt::Display for ExamSystemError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for ExamSystemError {}

// 为常见的错误类型实现 From trait
impl From<sea_orm::DbErr> for ExamSystemError {
    fn from(err: sea_orm::DbErr) -> Self {
        ExamSystemError::DatabaseOperation(err.to_string())
    }
}

impl From<serde_json::Error> for ExamSystemError {
    fn from(err: serde_json::Error) -> Self {
        ExamSystemError::Serialization(err.to_string())
    }
}

impl From<chrono::ParseError> for ExamSystemError {
    fn from(err: chrono::ParseError) -> Self {
        ExamSystemError::DateParse(err.to_string())
    }
}

impl From<crate::scoring::ScorerError> for ExamSystemError {
    fn from(err: crate::scoring::ScorerError) -> Self {
        ExamSystemError::EvaluationUnavailable(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ExamSystemError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(ExamSystemError::database_config("test").code(), "E001");
        assert_eq!(ExamSystemError::validation("test").code(), "E010");
        assert_eq!(ExamSystemError::already_active("test").code(), "E020");
        assert_eq!(ExamSystemError::locked("test").code(), "E031");
    }

    #[test]
    fn test_error_types() {
        assert_eq!(
            ExamSystemError::evaluation_unavailable("test").error_type(),
            "Evaluation Unavailable"
        );
        assert_eq!(
            ExamSystemError::validation("test").error_type(),
            "Validation Error"
        );
    }

    #[test]
    fn test_retriable_classification() {
        assert!(!ExamSystemError::validation("bad marks").is_retriable());
        assert!(!ExamSystemError::not_found("session 1").is_retriable());
        assert!(ExamSystemError::session_closed("expired").is_retriable());
        assert!(ExamSystemError::evaluation_unavailable("timeout").is_retriable());
        assert!(ExamSystemError::locked("manual").is_retriable());
    }

    #[test]
    fn test_state_conflict_family() {
        assert!(ExamSystemError::already_active("x").is_state_conflict());
        assert!(ExamSystemError::window_closed("x").is_state_conflict());
        assert!(!ExamSystemError::locked("x").is_state_conflict());
    }

    #[test]
    fn test_http_mapping() {
        assert_eq!(
            ExamSystemError::validation("x").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ExamSystemError::already_submitted("x").status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(ExamSystemError::locked("x").status_code(), StatusCode::CONFLICT);
        assert_eq!(
            ExamSystemError::evaluation_unavailable("x").status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ExamSystemError::database_operation("x").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ExamSystemError::locked("x").api_error_code() as i32,
            ErrorCode::EvaluationLocked as i32
        );
    }

    #[test]
    fn test_format_simple() {
        let err = ExamSystemError::session_closed("会话已提交");
        let formatted = err.format_simple();
        assert!(formatted.contains("Session Closed"));
        assert!(formatted.contains("会话已提交"));
    }
}
