use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::EvaluationService;
use crate::models::ApiResponse;

// 单条作答评分失败只计入汇总，不影响本次请求
pub async fn evaluate_session(
    service: &EvaluationService,
    request: &HttpRequest,
    session_id: i64,
) -> ActixResult<HttpResponse> {
    let evaluator = service.evaluator(request);

    match evaluator
        .evaluate_pending(session_id, chrono::Utc::now())
        .await
    {
        Ok(summary) => Ok(HttpResponse::Ok().json(ApiResponse::success(summary, "批量评分完成"))),
        Err(e) => Ok(e.to_http_response()),
    }
}
