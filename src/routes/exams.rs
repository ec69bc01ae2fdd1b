use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares::{self, RequireJWT};
use crate::models::auth::entities::UserRole;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::ExamSessionService;
use crate::utils::SafeIDI64;

// 懒加载的全局 ExamSessionService 实例
static EXAM_SESSION_SERVICE: Lazy<ExamSessionService> = Lazy::new(ExamSessionService::new_lazy);

// 开始作答
pub async fn start_session(req: HttpRequest, path: SafeIDI64) -> ActixResult<HttpResponse> {
    let student_id = match RequireJWT::extract_user_id(&req) {
        Some(id) => id,
        None => {
            return Ok(HttpResponse::Unauthorized().json(ApiResponse::error_empty(
                ErrorCode::Unauthorized,
                "无法获取用户信息",
            )));
        }
    };

    EXAM_SESSION_SERVICE
        .start_session(&req, path.0, student_id)
        .await
}

// 配置路由
pub fn configure_exam_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/exams")
            .wrap(middlewares::RequireJWT)
            .service(
                web::resource("/{id}/sessions")
                    // 开始作答 - 仅学生
                    .route(
                        web::post()
                            .to(start_session)
                            .wrap(middlewares::RequireRole::new(&UserRole::Student)),
                    ),
            ),
    );
}
