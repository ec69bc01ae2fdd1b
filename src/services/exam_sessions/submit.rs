use std::sync::Arc;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::{info, warn};

use super::{ExamSessionService, SessionAccess};
use crate::config::AppConfig;
use crate::models::ApiResponse;
use crate::models::sessions::requests::SubmitSessionRequest;
use crate::scoring::AutoScorer;
use crate::services::evaluations::ResponseEvaluator;

pub async fn submit_session(
    service: &ExamSessionService,
    request: &HttpRequest,
    session_id: i64,
    req: SubmitSessionRequest,
) -> ActixResult<HttpResponse> {
    let session = match service
        .load_accessible_session(request, session_id, SessionAccess::Write)
        .await
    {
        Ok(session) => session,
        Err(response) => return Ok(response),
    };

    let outcome = match service
        .lifecycle(request)
        .submit(&session, req.answers, chrono::Utc::now())
        .await
    {
        Ok(outcome) => outcome,
        Err(e) => return Ok(e.to_http_response()),
    };

    // 只有完成状态切换的那次调用负责触发后台评阅
    if outcome.committed && AppConfig::get().evaluation.auto_evaluate_on_submit {
        match request.app_data::<actix_web::web::Data<Arc<dyn AutoScorer>>>() {
            Some(scorer) => spawn_pending_evaluation(
                ResponseEvaluator::new(service.get_storage(request), scorer.get_ref().clone()),
                session_id,
            ),
            None => warn!("No scorer registered, session {} left for manual review", session_id),
        }
    }

    Ok(HttpResponse::Ok().json(ApiResponse::success(outcome.receipt, "交卷成功")))
}

/// 后台评阅会话中待评阅的作答，失败只记录日志
pub fn spawn_pending_evaluation(evaluator: ResponseEvaluator, session_id: i64) {
    tokio::spawn(async move {
        match evaluator
            .evaluate_pending(session_id, chrono::Utc::now())
            .await
        {
            Ok(summary) => info!(
                "Background evaluation of session {} finished: {} evaluated, {} unavailable",
                session_id, summary.evaluated, summary.unavailable
            ),
            Err(e) => warn!(
                "Background evaluation of session {} failed: {}",
                session_id, e
            ),
        }
    });
}
