use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::ExamSessionService;
use crate::models::ApiResponse;

pub async fn start_session(
    service: &ExamSessionService,
    request: &HttpRequest,
    exam_id: i64,
    student_id: i64,
) -> ActixResult<HttpResponse> {
    match service
        .lifecycle(request)
        .start(exam_id, student_id, chrono::Utc::now())
        .await
    {
        Ok(started) => Ok(HttpResponse::Created().json(ApiResponse::success(started, "开始作答"))),
        Err(e) => Ok(e.to_http_response()),
    }
}
