//! 인가 게이트 미들웨어.
//!
//! `Authorization: Bearer <token>` 헤더를 검증하여 요청 신원을 설정합니다.
//! 이 미들웨어는 요청을 거부하지 않습니다. 헤더가 없거나 형식이 다르거나
//! 검증에 실패하면 익명으로 진행하고, 거부는 접근 정책이 담당합니다.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use super::{Identity, TokenCodec};

/// 헤더에서 Bearer 토큰 추출.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

/// 요청 헤더로부터 신원 결정.
pub fn resolve_identity(codec: &TokenCodec, headers: &HeaderMap) -> Identity {
    let Some(token) = bearer_token(headers) else {
        return Identity::Anonymous;
    };

    match codec.verify(token) {
        Ok(principal) => Identity::Authenticated(principal),
        Err(e) => {
            debug!(error = %e, "bearer token rejected, continuing as anonymous");
            Identity::Anonymous
        }
    }
}

/// 인가 게이트.
///
/// 결정된 신원을 요청 extensions에 넣습니다 (기존 값은 덮어씀).
pub async fn authorization_gate(
    State(codec): State<Arc<TokenCodec>>,
    mut request: Request,
    next: Next,
) -> Response {
    let identity = resolve_identity(&codec, request.headers());
    request.extensions_mut().insert(identity);
    next.run(request).await
}
