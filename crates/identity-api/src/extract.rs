//! 요청 추출기.
//!
//! axum 기본 `Json`/`Path`는 거부 시 평문 본문을 반환하므로, 거부를
//! 공통 에러 형식(`INVALID_INPUT`)으로 바꾸는 래퍼를 사용합니다.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        FromRequest, FromRequestParts,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::debug;

use crate::error::ApiErrorResponse;

/// JSON 본문 추출기.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(RequestRejection))]
pub struct ApiJson<T>(pub T);

/// 경로 파라미터 추출기.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(RequestRejection))]
pub struct ApiPath<T>(pub T);

/// 요청 추출 실패.
#[derive(Debug)]
pub struct RequestRejection {
    message: String,
}

impl From<JsonRejection> for RequestRejection {
    fn from(rejection: JsonRejection) -> Self {
        debug!(status = %rejection.status(), "JSON body rejected");
        Self {
            message: rejection.body_text(),
        }
    }
}

impl From<PathRejection> for RequestRejection {
    fn from(rejection: PathRejection) -> Self {
        debug!(status = %rejection.status(), "path parameters rejected");
        Self {
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for RequestRejection {
    fn into_response(self) -> Response {
        (
            StatusCode::BAD_REQUEST,
            Json(ApiErrorResponse::new("INVALID_INPUT", self.message)),
        )
            .into_response()
    }
}
