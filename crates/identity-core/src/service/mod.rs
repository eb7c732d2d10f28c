//! 계정 관리 서비스.
//!
//! 저장소 트랜잭션 경계 안에서 계정 생성/수정과 역할 부여/회수를 수행합니다.

mod accounts;
mod roles;

pub use accounts::{AccountRequest, AccountService};
pub use roles::RoleAssignmentService;

use crate::error::IdentityError;
use crate::store::{StoreError, UNIQUE_ACCOUNT_EMAIL, UNIQUE_ACCOUNT_USERNAME};

/// 저장소의 고유 제약 위반을 도메인 충돌 에러로 변환합니다.
///
/// 사전 검사 이후 동시 삽입 경쟁으로 제약 위반이 나는 경우에 해당합니다.
/// 제약 이름이 정확히 일치할 때만 변환합니다.
fn conflict_from_store(err: StoreError) -> IdentityError {
    match &err {
        StoreError::Conflict(constraint) if constraint == UNIQUE_ACCOUNT_EMAIL => {
            IdentityError::EmailTaken
        }
        StoreError::Conflict(constraint) if constraint == UNIQUE_ACCOUNT_USERNAME => {
            IdentityError::UsernameTaken
        }
        _ => IdentityError::Store(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_from_store() {
        assert!(matches!(
            conflict_from_store(StoreError::Conflict(UNIQUE_ACCOUNT_EMAIL.into())),
            IdentityError::EmailTaken
        ));
        assert!(matches!(
            conflict_from_store(StoreError::Conflict(UNIQUE_ACCOUNT_USERNAME.into())),
            IdentityError::UsernameTaken
        ));
        assert!(matches!(
            conflict_from_store(StoreError::Conflict("unique_role_name".into())),
            IdentityError::Store(_)
        ));
        assert!(matches!(
            conflict_from_store(StoreError::Backend("boom".into())),
            IdentityError::Store(_)
        ));
    }

    #[test]
    fn test_conflict_value_text_is_ignored() {
        // 값에 "email"이 들어 있어도 제약 이름이 아니면 변환하지 않음
        assert!(matches!(
            conflict_from_store(StoreError::Conflict("username 'myemail'".into())),
            IdentityError::Store(_)
        ));
    }
}
