//! 신원 서비스의 에러 타입.
//!
//! 도메인 에러(찾을 수 없음, 충돌, 인증 실패)와 저장소 에러를 구분합니다.

use thiserror::Error;

use crate::password::PasswordError;
use crate::store::StoreError;

/// 핵심 도메인 에러.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// 계정을 찾을 수 없음
    #[error("계정을 찾을 수 없습니다: {0}")]
    AccountNotFound(String),

    /// 역할을 찾을 수 없음
    #[error("역할을 찾을 수 없습니다: {0}")]
    RoleNotFound(String),

    /// 사용자 이름 중복
    #[error("이미 사용 중인 사용자 이름입니다")]
    UsernameTaken,

    /// 이메일 중복
    #[error("이미 사용 중인 이메일입니다")]
    EmailTaken,

    /// 자격 증명 불일치 (사용자 없음과 비밀번호 오류를 구분하지 않음)
    #[error("사용자 이름 또는 비밀번호가 올바르지 않습니다")]
    InvalidCredentials,

    /// 잘못된 입력
    #[error("잘못된 입력: {0}")]
    InvalidInput(String),

    /// 비밀번호 처리 에러
    #[error(transparent)]
    Password(#[from] PasswordError),

    /// 저장소 에러
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// 신원 서비스 작업을 위한 Result 타입.
pub type IdentityResult<T> = Result<T, IdentityError>;

impl IdentityError {
    /// 찾을 수 없음 계열 에러인지 확인합니다.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            IdentityError::AccountNotFound(_) | IdentityError::RoleNotFound(_)
        )
    }

    /// 고유성 충돌 에러인지 확인합니다.
    pub fn is_conflict(&self) -> bool {
        matches!(self, IdentityError::UsernameTaken | IdentityError::EmailTaken)
    }
}
