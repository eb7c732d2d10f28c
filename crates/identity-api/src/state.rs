//! 모든 핸들러에서 공유되는 애플리케이션 상태.
//!
//! 시작 후에는 읽기 전용이며, Arc로 감싸 요청 간에 공유합니다.
//! 변경 가능한 공유 자원은 저장소뿐입니다.

use std::sync::Arc;

use identity_core::{AccountService, CredentialStore, PasswordHasher, RoleAssignmentService};

use crate::auth::{AccessPolicy, AuthenticationService, TokenCodec};

/// 애플리케이션 공유 상태.
#[derive(Clone)]
pub struct AppState {
    /// 계정/역할 저장소
    pub store: Arc<dyn CredentialStore>,

    /// 계정 생성/수정/조회/삭제
    pub accounts: AccountService,

    /// 역할 부여/회수
    pub roles: RoleAssignmentService,

    /// 로그인
    pub authentication: AuthenticationService,

    /// 토큰 발급/검증기 (인가 게이트와 공유)
    pub codec: Arc<TokenCodec>,

    /// 라우트 접근 정책
    pub policy: Arc<AccessPolicy>,

    /// 서버 시작 시간 (업타임 계산용)
    pub started_at: chrono::DateTime<chrono::Utc>,

    /// API 버전
    pub version: String,
}

impl AppState {
    /// 새로운 AppState 생성.
    pub fn new(
        store: Arc<dyn CredentialStore>,
        hasher: Arc<dyn PasswordHasher>,
        codec: TokenCodec,
        policy: AccessPolicy,
    ) -> Self {
        let codec = Arc::new(codec);

        Self {
            accounts: AccountService::new(store.clone(), hasher.clone()),
            roles: RoleAssignmentService::new(store.clone()),
            authentication: AuthenticationService::new(store.clone(), hasher, codec.clone()),
            store,
            codec,
            policy: Arc::new(policy),
            started_at: chrono::Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// 서버 업타임(초).
    pub fn uptime_secs(&self) -> i64 {
        (chrono::Utc::now() - self.started_at).num_seconds()
    }

    /// 저장소 응답 여부.
    pub async fn is_store_healthy(&self) -> bool {
        self.store.count_accounts().await.is_ok()
    }
}

/// 테스트용 상태 (인메모리 저장소, 저비용 해셔, 표준 정책).
#[cfg(any(test, feature = "test-utils"))]
pub fn create_test_state() -> AppState {
    use identity_core::{Argon2Hasher, MemoryStore};

    AppState::new(
        Arc::new(MemoryStore::new()),
        Arc::new(Argon2Hasher::low_cost()),
        TokenCodec::new(
            b"test-secret-key-for-jwt-testing-minimum-32-chars",
            chrono::Duration::hours(1),
        ),
        AccessPolicy::standard(),
    )
}
