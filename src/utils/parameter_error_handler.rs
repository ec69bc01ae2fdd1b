use actix_web::{HttpRequest, HttpResponse, error, error::JsonPayloadError, error::QueryPayloadError};
use tracing::debug;

use crate::models::{ApiResponse, ErrorCode};

// JSON 请求体解析失败时返回统一的 400 响应
pub fn json_error_handler(err: JsonPayloadError, req: &HttpRequest) -> error::Error {
    debug!("JSON payload error on {}: {}", req.path(), err);
    let message = match &err {
        JsonPayloadError::ContentType => "请求头 Content-Type 必须为 application/json".to_string(),
        JsonPayloadError::Deserialize(e) => format!("请求体格式错误: {e}"),
        _ => format!("请求体解析失败: {err}"),
    };
    error::InternalError::from_response(
        err,
        HttpResponse::BadRequest().json(ApiResponse::error_empty(ErrorCode::BadRequest, message)),
    )
    .into()
}

// 查询参数解析失败
pub fn query_error_handler(err: QueryPayloadError, req: &HttpRequest) -> error::Error {
    debug!("Query payload error on {}: {}", req.path(), err);
    let message = format!("查询参数错误: {err}");
    error::InternalError::from_response(
        err,
        HttpResponse::BadRequest().json(ApiResponse::error_empty(ErrorCode::BadRequest, message)),
    )
    .into()
}
