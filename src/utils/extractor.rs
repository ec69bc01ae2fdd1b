use actix_web::{FromRequest, HttpRequest, HttpResponse, dev::Payload, error};
use futures_util::future::{Ready, ready};

use crate::models::{ApiResponse, ErrorCode};

/// 路径中的 `{id}` 参数，必须为正整数
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SafeIDI64(pub i64);

fn parse_positive_id(raw: Option<&str>) -> Result<i64, String> {
    let raw = raw.ok_or_else(|| "缺少路径参数 id".to_string())?;
    match raw.parse::<i64>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(format!("无效的 ID: {raw}")),
    }
}

impl FromRequest for SafeIDI64 {
    type Error = error::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let result = parse_positive_id(req.match_info().get("id"))
            .map(SafeIDI64)
            .map_err(|message| {
                error::InternalError::from_response(
                    message.clone(),
                    HttpResponse::BadRequest()
                        .json(ApiResponse::error_empty(ErrorCode::BadRequest, message)),
                )
                .into()
            });
        ready(result)
    }
}
