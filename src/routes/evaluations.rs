use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares::{self, RequireJWT};
use crate::models::auth::entities::UserRole;
use crate::models::evaluations::requests::TriggerEvaluationRequest;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::EvaluationService;
use crate::utils::SafeIDI64;

// 懒加载的全局 EvaluationService 实例
static EVALUATION_SERVICE: Lazy<EvaluationService> = Lazy::new(EvaluationService::new_lazy);

// 触发单条作答评分
pub async fn trigger_evaluation(
    req: HttpRequest,
    path: SafeIDI64,
    body: web::Json<TriggerEvaluationRequest>,
) -> ActixResult<HttpResponse> {
    let reviewer_id = match RequireJWT::extract_user_id(&req) {
        Some(id) => id,
        None => {
            return Ok(HttpResponse::Unauthorized().json(ApiResponse::error_empty(
                ErrorCode::Unauthorized,
                "无法获取用户信息",
            )));
        }
    };

    EVALUATION_SERVICE
        .trigger_evaluation(&req, path.0, reviewer_id, body.into_inner())
        .await
}

// 会话批量自动评分
pub async fn evaluate_session(req: HttpRequest, path: SafeIDI64) -> ActixResult<HttpResponse> {
    EVALUATION_SERVICE.evaluate_session(&req, path.0).await
}

// 配置路由
pub fn configure_evaluation_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/responses")
            .wrap(middlewares::RequireJWT)
            .service(
                web::resource("/{id}/evaluation")
                    // 触发评分 - 仅评阅人和管理员
                    .route(
                        web::post()
                            .to(trigger_evaluation)
                            .wrap(middlewares::RequireRole::new_any(UserRole::reviewer_roles())),
                    ),
            ),
    );
}
