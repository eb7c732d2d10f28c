//! 인증 및 권한 부여.
//!
//! # 구성 요소
//!
//! - [`TokenCodec`]: HS256 JWT 발급/검증
//! - [`AuthenticationService`]: 이메일 또는 사용자 이름 로그인
//! - [`authorization_gate`]: Bearer 토큰으로 요청 신원([`Identity`]) 설정
//! - [`AccessPolicy`], [`enforce_access_policy`]: 경로별 역할 검사
//!
//! 게이트는 요청을 거부하지 않으며, 401/403 응답은 접근 정책에서만 나옵니다.

mod identity;
mod jwt;
mod middleware;
mod policy;
mod service;

pub use identity::{Identity, Principal};
pub use jwt::{Claims, TokenCodec, TokenError};
pub use middleware::{authorization_gate, resolve_identity};
pub use policy::{
    enforce_access_policy, Access, AccessDenied, AccessPolicy, AccessRule, MatchMode, RoutePattern,
};
pub use service::{AuthenticationService, LoginError, LoginOutcome};
