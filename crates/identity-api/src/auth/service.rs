//! 인증 서비스.
//!
//! 식별자(이메일 또는 사용자 이름)와 비밀번호를 확인하고 토큰을 발급합니다.

use std::collections::BTreeSet;
use std::sync::Arc;

use identity_core::{CredentialStore, PasswordHasher, StoreError};
use tracing::{info, warn};

use super::{TokenCodec, TokenError};
use crate::metrics::record_login_attempt;

/// 로그인 에러.
///
/// 사용자 없음, 비활성 계정, 비밀번호 불일치는 모두 `InvalidCredentials` 하나로 보고합니다.
#[derive(Debug, thiserror::Error)]
pub enum LoginError {
    #[error("사용자 이름 또는 비밀번호가 올바르지 않습니다")]
    InvalidCredentials,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Token(#[from] TokenError),
}

/// 로그인 결과.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    /// 실제 주체 (이메일로 로그인해도 사용자 이름)
    pub username: String,
    pub token: String,
    pub roles: BTreeSet<String>,
}

/// 계정이 없을 때 검증에 사용할 비밀번호.
const DUMMY_PASSWORD: &str = "identity-login-dummy-password";

/// 인증 서비스.
///
/// 계정이 없거나 비활성이어도 비밀번호 검증을 한 번 수행하므로
/// 응답 시간으로 계정 존재 여부를 구분할 수 없습니다.
#[derive(Clone)]
pub struct AuthenticationService {
    store: Arc<dyn CredentialStore>,
    hasher: Arc<dyn PasswordHasher>,
    codec: Arc<TokenCodec>,
    /// 생성 시 한 번 계산한 더미 해시
    dummy_digest: Arc<str>,
}

impl AuthenticationService {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        hasher: Arc<dyn PasswordHasher>,
        codec: Arc<TokenCodec>,
    ) -> Self {
        let dummy_digest = match hasher.hash(DUMMY_PASSWORD) {
            Ok(digest) => digest,
            Err(e) => {
                warn!(error = %e, "dummy password hash failed, unknown-account logins will answer faster");
                String::new()
            }
        };

        Self {
            store,
            hasher,
            codec,
            dummy_digest: dummy_digest.into(),
        }
    }

    /// 로그인.
    ///
    /// 식별자를 먼저 이메일로 조회하고, 일치하는 계정이 있으면 그 사용자 이름을,
    /// 없으면 식별자 자체를 사용자 이름으로 사용합니다.
    pub async fn login(&self, identifier: &str, password: &str) -> Result<LoginOutcome, LoginError> {
        let result = self.authenticate(identifier, password).await;

        let outcome = match &result {
            Ok(_) => "success",
            Err(LoginError::InvalidCredentials) => "invalid_credentials",
            Err(_) => "error",
        };
        record_login_attempt(outcome);

        result
    }

    async fn authenticate(&self, identifier: &str, password: &str) -> Result<LoginOutcome, LoginError> {
        let username = match self.store.find_account_by_email(identifier).await? {
            Some(account) => account.username,
            None => identifier.to_string(),
        };

        let account = self.store.find_account_by_username(&username).await?;

        // 계정 유무와 관계없이 검증은 항상 한 번
        let digest = account
            .as_ref()
            .map_or(&*self.dummy_digest, |a| a.password_hash.as_str());
        let password_matches = self.hasher.verify(password, digest);

        let Some(account) = account else {
            warn!(username = %username, "login rejected: unknown account");
            return Err(LoginError::InvalidCredentials);
        };

        if !account.enabled {
            warn!(username = %username, "login rejected: account disabled");
            return Err(LoginError::InvalidCredentials);
        }

        if !password_matches {
            warn!(username = %username, "login rejected: password mismatch");
            return Err(LoginError::InvalidCredentials);
        }

        let roles = account.role_names();
        let token = self.codec.issue(&account.username, &roles)?;

        info!(username = %account.username, roles = roles.len(), "login succeeded");

        Ok(LoginOutcome {
            username: account.username,
            token,
            roles,
        })
    }
}
