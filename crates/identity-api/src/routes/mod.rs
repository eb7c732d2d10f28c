//! REST API 라우트.
//!
//! # 엔드포인트
//!
//! - `/authentication/login`: 로그인 (공개)
//! - `/users/...`: 계정 관리 (역할 필요)
//! - `/health`, `/health/ready`: 헬스 체크 (공개)

pub mod auth;
pub mod health;
pub mod users;

use std::sync::Arc;

use axum::{middleware, Router};

pub use auth::{auth_router, LoginRequest, LoginResponse};
pub use health::{health_check, health_ready, health_router, HealthResponse};
pub use users::{
    users_router, AccountPageResponse, AccountPayload, AccountResponse, DeleteAllResponse,
    RoleChangeRequest,
};

use crate::auth::{authorization_gate, enforce_access_policy};
use crate::state::AppState;

/// 상태가 연결되지 않은 API 라우터.
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/authentication", auth_router())
        .nest("/users", users_router())
        .nest("/health", health_router())
}

/// 인가 게이트와 접근 정책이 적용된 API 라우터.
///
/// 요청은 게이트(신원 설정) → 접근 정책(거부 판단) → 핸들러 순서로 처리됩니다.
/// 매칭되는 라우트가 없는 요청도 접근 정책을 거칩니다.
pub fn create_router(state: Arc<AppState>) -> Router {
    let policy = state.policy.clone();
    let codec = state.codec.clone();

    create_api_router()
        .with_state(state)
        .layer(middleware::from_fn_with_state(policy, enforce_access_policy))
        .layer(middleware::from_fn_with_state(codec, authorization_gate))
}
