use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{ResultService, ScoreAggregator};
use crate::errors::ExamSystemError;
use crate::middlewares::RequireJWT;
use crate::models::{ApiResponse, ErrorCode};

pub async fn get_result(
    service: &ResultService,
    request: &HttpRequest,
    session_id: i64,
) -> ActixResult<HttpResponse> {
    let storage = service.get_storage(request);

    let current_user = match RequireJWT::extract_auth_user(request) {
        Some(user) => user,
        None => {
            return Ok(HttpResponse::Unauthorized()
                .json(ApiResponse::error_empty(ErrorCode::Unauthorized, "未登录")));
        }
    };

    let session = match storage.get_session_by_id(session_id).await {
        Ok(Some(session)) => session,
        Ok(None) => {
            return Ok(
                ExamSystemError::not_found(format!("会话 {session_id} 不存在")).to_http_response(),
            );
        }
        Err(e) => return Ok(e.to_http_response()),
    };

    // 学生只能查看自己的成绩
    if !current_user.can_access_session_of(session.student_id) {
        return Ok(HttpResponse::Forbidden().json(ApiResponse::error_empty(
            ErrorCode::Forbidden,
            "无权查看此会话成绩",
        )));
    }

    match ScoreAggregator::new(storage).result_for(&session).await {
        Ok(result) => Ok(HttpResponse::Ok().json(ApiResponse::success(result, "获取成绩成功"))),
        Err(e) => Ok(e.to_http_response()),
    }
}
