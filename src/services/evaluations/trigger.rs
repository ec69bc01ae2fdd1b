use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use tracing::debug;

use super::EvaluationService;
use crate::models::ApiResponse;
use crate::models::evaluations::{
    requests::TriggerEvaluationRequest, responses::EvaluationResponse,
};

pub async fn trigger_evaluation(
    service: &EvaluationService,
    request: &HttpRequest,
    response_id: i64,
    reviewer_id: i64,
    req: TriggerEvaluationRequest,
) -> ActixResult<HttpResponse> {
    let evaluator = service.evaluator(request);

    match evaluator
        .trigger(response_id, req, reviewer_id, chrono::Utc::now())
        .await
    {
        Ok(evaluation) => Ok(HttpResponse::Ok().json(ApiResponse::success(
            EvaluationResponse::from(evaluation),
            "评分成功",
        ))),
        Err(e) => {
            debug!("Evaluation of response {} failed: {}", response_id, e);
            Ok(e.to_http_response())
        }
    }
}
