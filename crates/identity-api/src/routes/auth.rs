//! 로그인 endpoint.

use std::sync::Arc;

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::{login_error, validation_error, ApiResult};
use crate::extract::ApiJson;
use crate::state::AppState;

/// 로그인 요청.
///
/// `username`에는 사용자 이름 또는 이메일을 넣을 수 있습니다.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, message = "사용자 이름 또는 이메일이 필요합니다"))]
    pub username: String,
    #[validate(length(min = 1, message = "비밀번호가 필요합니다"))]
    pub password: String,
}

/// 로그인 응답.
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    /// 실제 사용자 이름
    pub username: String,
    /// 액세스 토큰
    pub jwt: String,
    /// 역할 이름 (정렬됨)
    pub roles: Vec<String>,
}

/// 로그인.
///
/// POST /authentication/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    ApiJson(request): ApiJson<LoginRequest>,
) -> ApiResult<Json<LoginResponse>> {
    request.validate().map_err(validation_error)?;

    let outcome = state
        .authentication
        .login(&request.username, &request.password)
        .await
        .map_err(login_error)?;

    Ok(Json(LoginResponse {
        username: outcome.username,
        jwt: outcome.token,
        roles: outcome.roles.into_iter().collect(),
    }))
}

pub fn auth_router() -> Router<Arc<AppState>> {
    Router::new().route("/login", post(login))
}
