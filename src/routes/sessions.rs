use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::middlewares;
use crate::models::auth::entities::UserRole;
use crate::models::sessions::requests::{RecordResponsesRequest, SubmitSessionRequest};
use crate::services::ExamSessionService;
use crate::utils::SafeIDI64;

use super::{evaluations, results};

// 懒加载的全局 ExamSessionService 实例
static EXAM_SESSION_SERVICE: Lazy<ExamSessionService> = Lazy::new(ExamSessionService::new_lazy);

// 获取会话状态
pub async fn get_session_status(req: HttpRequest, path: SafeIDI64) -> ActixResult<HttpResponse> {
    EXAM_SESSION_SERVICE.get_session_status(&req, path.0).await
}

// 保存作答
pub async fn record_responses(
    req: HttpRequest,
    path: SafeIDI64,
    body: web::Json<RecordResponsesRequest>,
) -> ActixResult<HttpResponse> {
    EXAM_SESSION_SERVICE
        .record_responses(&req, path.0, body.into_inner())
        .await
}

// 交卷，请求体可省略
pub async fn submit_session(
    req: HttpRequest,
    path: SafeIDI64,
    body: Option<web::Json<SubmitSessionRequest>>,
) -> ActixResult<HttpResponse> {
    EXAM_SESSION_SERVICE
        .submit_session(
            &req,
            path.0,
            body.map(|b| b.into_inner()).unwrap_or_default(),
        )
        .await
}

// 配置路由
pub fn configure_session_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/sessions")
            .wrap(middlewares::RequireJWT)
            // 会话状态 - 本人、评阅人与管理员（业务层校验归属）
            .service(web::resource("/{id}").route(web::get().to(get_session_status)))
            // 保存作答与交卷 - 仅会话所属学生
            .service(web::resource("/{id}/responses").route(web::put().to(record_responses)))
            .service(web::resource("/{id}/submit").route(web::post().to(submit_session)))
            .service(web::resource("/{id}/result").route(web::get().to(results::get_result)))
            // 批量自动评分 - 仅评阅人和管理员
            .service(
                web::resource("/{id}/evaluations").route(
                    web::post()
                        .to(evaluations::evaluate_session)
                        .wrap(middlewares::RequireRole::new_any(UserRole::reviewer_roles())),
                ),
            ),
    );
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::{App, http::StatusCode, test};
    use chrono::Utc;

    use super::*;
    use crate::config::AppConfig;
    use crate::services::exam_sessions::SessionLifecycle;
    use crate::storage::Storage;
    use crate::test_support::{memory_storage, sample_exam};
    use crate::utils::jwt::JwtUtils;

    fn bearer(id: i64, role: UserRole) -> (&'static str, String) {
        let token = JwtUtils::generate_token_with_secret(
            id,
            role,
            chrono::Duration::minutes(5),
            &AppConfig::get().jwt.secret,
        )
        .unwrap();
        ("Authorization", format!("Bearer {token}"))
    }

    #[actix_web::test]
    async fn test_only_owner_can_write_to_session() {
        let storage: Arc<dyn Storage> = Arc::new(memory_storage().await);
        let (exam, questions) = storage
            .create_exam(sample_exam(Utc::now().timestamp() - 60))
            .await
            .unwrap();
        let started = SessionLifecycle::new(storage.clone())
            .start(exam.id, 42, Utc::now())
            .await
            .unwrap();
        let session_id = started.session_id;

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(storage.clone()))
                .configure(configure_session_routes),
        )
        .await;
        let body = serde_json::json!({
            "answers": [{ "question_id": questions[1].id, "answer_text": "written by someone else" }]
        });

        // 评阅人与其他学生都不能写入
        for (id, role) in [(9, UserRole::Reviewer), (1, UserRole::Admin), (43, UserRole::Student)] {
            let req = test::TestRequest::put()
                .uri(&format!("/api/v1/sessions/{session_id}/responses"))
                .insert_header(bearer(id, role))
                .set_json(&body)
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::FORBIDDEN);

            let req = test::TestRequest::post()
                .uri(&format!("/api/v1/sessions/{session_id}/submit"))
                .insert_header(bearer(id, role))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        }

        // 评阅人仍可查看会话状态
        let req = test::TestRequest::get()
            .uri(&format!("/api/v1/sessions/{session_id}"))
            .insert_header(bearer(9, UserRole::Reviewer))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let session = storage.get_session_by_id(session_id).await.unwrap().unwrap();
        assert!(session.is_active());
        assert!(
            storage
                .list_session_responses(session_id)
                .await
                .unwrap()
                .is_empty()
        );

        let req = test::TestRequest::put()
            .uri(&format!("/api/v1/sessions/{session_id}/responses"))
            .insert_header(bearer(42, UserRole::Student))
            .set_json(&body)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
