use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use once_cell::sync::Lazy;

use crate::services::ResultService;
use crate::utils::SafeIDI64;

// 懒加载的全局 ResultService 实例
static RESULT_SERVICE: Lazy<ResultService> = Lazy::new(ResultService::new_lazy);

// 获取成绩（权限在业务层检查：本人、评阅人、管理员）
pub async fn get_result(req: HttpRequest, path: SafeIDI64) -> ActixResult<HttpResponse> {
    RESULT_SERVICE.get_result(&req, path.0).await
}
