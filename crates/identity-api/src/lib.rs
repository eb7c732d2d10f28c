//! 신원(Identity) 서비스 REST API.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - Axum 기반 REST API
//! - JWT 인증, 요청 범위 신원, 경로별 접근 정책
//! - 초기 데이터 생성
//! - 헬스 체크 엔드포인트
//! - Prometheus 메트릭
//!
//! # 모듈 구성
//!
//! - [`state`]: 애플리케이션 공유 상태 (AppState)
//! - [`routes`]: REST API 엔드포인트
//! - [`extract`]: 공통 에러 형식으로 거부하는 요청 추출기
//! - [`auth`]: 토큰, 로그인, 인가 게이트, 접근 정책
//! - [`bootstrap`]: 기본 역할과 관리자 계정 생성
//! - [`metrics`]: Prometheus 메트릭 수집
//! - [`middleware`]: HTTP 미들웨어

pub mod auth;
pub mod bootstrap;
pub mod error;
pub mod extract;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use auth::{
    AccessPolicy, AuthenticationService, Claims, Identity, Principal, TokenCodec, TokenError,
};
pub use error::{ApiErrorResponse, ApiResult};
pub use extract::{ApiJson, ApiPath};
pub use metrics::setup_metrics_recorder;
pub use middleware::metrics_layer;
pub use routes::{create_api_router, create_router};
pub use state::AppState;

#[cfg(any(test, feature = "test-utils"))]
pub use state::create_test_state;
