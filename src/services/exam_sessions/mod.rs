pub mod clock;
pub mod countdown;
pub mod gate;
pub mod lifecycle;
pub mod record;
pub mod start;
pub mod status;
pub mod submit;

pub use clock::SessionClock;
pub use countdown::{AdvisoryCountdown, CountdownHandle, CountdownTick, spawn_countdown};
pub use gate::{GateOutcome, SubmissionGate};
pub use lifecycle::SessionLifecycle;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::sync::Arc;

use crate::errors::ExamSystemError;
use crate::middlewares::RequireJWT;
use crate::models::sessions::entities::ExamSession;
use crate::models::sessions::requests::{RecordResponsesRequest, SubmitSessionRequest};
use crate::models::{ApiResponse, ErrorCode};
use crate::storage::Storage;

/// 会话访问方式：查看允许评阅人，写入仅限本人
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum SessionAccess {
    Read,
    Write,
}

pub struct ExamSessionService {
    storage: Option<Arc<dyn Storage>>,
}

impl ExamSessionService {
    pub fn new_lazy() -> Self {
        Self { storage: None }
    }

    pub(crate) fn get_storage(&self, request: &HttpRequest) -> Arc<dyn Storage> {
        if let Some(storage) = &self.storage {
            storage.clone()
        } else {
            request
                .app_data::<actix_web::web::Data<Arc<dyn Storage>>>()
                .expect("Storage not found in app data")
                .get_ref()
                .clone()
        }
    }

    pub(crate) fn lifecycle(&self, request: &HttpRequest) -> SessionLifecycle {
        SessionLifecycle::new(self.get_storage(request))
    }

    /// 加载会话并校验调用者是否有权操作；失败时直接给出响应
    pub(crate) async fn load_accessible_session(
        &self,
        request: &HttpRequest,
        session_id: i64,
        access: SessionAccess,
    ) -> Result<ExamSession, HttpResponse> {
        let current_user = RequireJWT::extract_auth_user(request).ok_or_else(|| {
            HttpResponse::Unauthorized()
                .json(ApiResponse::error_empty(ErrorCode::Unauthorized, "未登录"))
        })?;

        let session = self
            .lifecycle(request)
            .load(session_id)
            .await
            .map_err(|e: ExamSystemError| e.to_http_response())?;

        let allowed = match access {
            SessionAccess::Read => current_user.can_access_session_of(session.student_id),
            SessionAccess::Write => current_user.owns_session_of(session.student_id),
        };
        if !allowed {
            return Err(HttpResponse::Forbidden().json(ApiResponse::error_empty(
                ErrorCode::Forbidden,
                "无权操作此会话",
            )));
        }
        Ok(session)
    }

    pub async fn start_session(
        &self,
        request: &HttpRequest,
        exam_id: i64,
        student_id: i64,
    ) -> ActixResult<HttpResponse> {
        start::start_session(self, request, exam_id, student_id).await
    }

    pub async fn get_session_status(
        &self,
        request: &HttpRequest,
        session_id: i64,
    ) -> ActixResult<HttpResponse> {
        status::get_session_status(self, request, session_id).await
    }

    pub async fn record_responses(
        &self,
        request: &HttpRequest,
        session_id: i64,
        req: RecordResponsesRequest,
    ) -> ActixResult<HttpResponse> {
        record::record_responses(self, request, session_id, req).await
    }

    pub async fn submit_session(
        &self,
        request: &HttpRequest,
        session_id: i64,
        req: SubmitSessionRequest,
    ) -> ActixResult<HttpResponse> {
        submit::submit_session(self, request, session_id, req).await
    }
}
