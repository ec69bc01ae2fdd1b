use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::{ExamSessionService, SessionAccess};
use crate::models::ApiResponse;
use crate::models::sessions::{requests::RecordResponsesRequest, responses::RecordOutcome};

pub async fn record_responses(
    service: &ExamSessionService,
    request: &HttpRequest,
    session_id: i64,
    req: RecordResponsesRequest,
) -> ActixResult<HttpResponse> {
    let session = match service
        .load_accessible_session(request, session_id, SessionAccess::Write)
        .await
    {
        Ok(session) => session,
        Err(response) => return Ok(response),
    };

    match service
        .lifecycle(request)
        .record(&session, req.answers, chrono::Utc::now())
        .await
    {
        Ok(outcome @ RecordOutcome::Saved { .. }) => {
            Ok(HttpResponse::Ok().json(ApiResponse::success(outcome, "作答已保存")))
        }
        Ok(outcome @ RecordOutcome::AutoSubmitted { .. }) => Ok(HttpResponse::Ok().json(
            ApiResponse::success(outcome, "考试时间已到，已自动交卷"),
        )),
        Err(e) => Ok(e.to_http_response()),
    }
}
