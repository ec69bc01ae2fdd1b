use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{ExamSessionService, SessionAccess, SessionLifecycle};
use crate::models::ApiResponse;

// 客户端倒计时的校准来源
pub async fn get_session_status(
    service: &ExamSessionService,
    request: &HttpRequest,
    session_id: i64,
) -> ActixResult<HttpResponse> {
    let session = match service
        .load_accessible_session(request, session_id, SessionAccess::Read)
        .await
    {
        Ok(session) => session,
        Err(response) => return Ok(response),
    };

    let status = SessionLifecycle::status(&session, chrono::Utc::now());
    Ok(HttpResponse::Ok().json(ApiResponse::success(status, "获取会话状态成功")))
}
